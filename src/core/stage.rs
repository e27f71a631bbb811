//! Stage vocabulary for the pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One discrete, ordered step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Build,
    Install,
    Test,
    Publish,
    Release,
    Clean,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Build => "build",
            Stage::Install => "install",
            Stage::Test => "test",
            Stage::Publish => "publish",
            Stage::Release => "release",
            Stage::Clean => "clean",
        }
    }

    /// The full pipeline sequence, in execution order. Publish and release
    /// are trigger-gated; the planner decides whether they actually run.
    pub fn pipeline_sequence() -> [Stage; 5] {
        [
            Stage::Build,
            Stage::Install,
            Stage::Test,
            Stage::Publish,
            Stage::Release,
        ]
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Terminal state of one stage within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    Failed,
    Skipped,
}

/// Result of one executed stage, used to decide whether the pipeline
/// proceeds (fail-fast: any non-zero exit halts everything downstream).
#[derive(Debug, Clone, Serialize)]
pub struct StageResult {
    pub stage: Stage,
    pub exit_code: i32,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
}

impl StageResult {
    pub fn new(stage: Stage, exit_code: i32, started_at: DateTime<Utc>, duration_ms: u64) -> Self {
        Self {
            stage,
            exit_code,
            duration_ms,
            started_at,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Measure a stage command invocation, producing a `StageResult` from the
/// closure's exit code.
pub fn timed<F: FnOnce() -> i32>(stage: Stage, f: F) -> StageResult {
    let started_at = Utc::now();
    let start = std::time::Instant::now();
    let exit_code = f();
    let duration_ms = start.elapsed().as_millis() as u64;
    StageResult::new(stage, exit_code, started_at, duration_ms)
}
