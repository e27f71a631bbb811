//! Pipeline orchestration: plan the stage sequence, run it fail-fast.
//!
//! The planner decides up front which stages run and which are skipped
//! (publish and release are trigger-gated); the runner then executes the plan
//! strictly in order, halting on the first failure and marking everything
//! downstream as skipped.

use serde::Serialize;
use serde_json::Value;

use crate::context::PipelineContext;
use crate::error::{Error, Result};
use crate::stage::{self, Stage, StageStatus};
use crate::{build, clean, install, publish, release, test};

/// Executes a single stage. The production implementation shells out; tests
/// substitute a scripted runner to verify ordering and gating without
/// touching any toolchain.
pub trait StageRunner {
    fn run_stage(&self, stage: Stage, ctx: &PipelineContext) -> Result<Value>;
}

/// Dispatches each stage to its module.
pub struct ProcessStageRunner;

impl StageRunner for ProcessStageRunner {
    fn run_stage(&self, stage: Stage, ctx: &PipelineContext) -> Result<Value> {
        let output = match stage {
            Stage::Build => serde_json::to_value(build::run(ctx)?),
            Stage::Install => serde_json::to_value(install::run(ctx)?),
            Stage::Test => serde_json::to_value(test::run(ctx)?),
            Stage::Publish => serde_json::to_value(publish::run(ctx)?),
            Stage::Release => serde_json::to_value(release::run(ctx)?),
            Stage::Clean => serde_json::to_value(clean::run(ctx)?),
        };
        output.map_err(|e| {
            Error::internal_json(e.to_string(), Some(format!("serialize {} output", stage)))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StageAction {
    Run,
    Skip { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedStage {
    pub stage: Stage,
    #[serde(flatten)]
    pub action: StageAction,
}

/// Decide which pipeline stages run for this context.
///
/// Build, install, and test run on every trigger. Publish requires a tag
/// trigger and a configured repository; release requires a tag trigger.
pub fn plan(ctx: &PipelineContext) -> Vec<PlannedStage> {
    Stage::pipeline_sequence()
        .into_iter()
        .map(|stage| {
            let action = match stage {
                Stage::Publish if !ctx.trigger.is_tag() => skip("not a tag-triggered run"),
                Stage::Publish if ctx.repo_url.is_none() => {
                    skip("no package repository configured")
                }
                Stage::Release if !ctx.trigger.is_tag() => skip("not a tag-triggered run"),
                _ => StageAction::Run,
            };
            PlannedStage { stage, action }
        })
        .collect()
}

fn skip(reason: &str) -> StageAction {
    StageAction::Skip {
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub stage: Stage,
    pub status: StageStatus,
    pub exit_code: i32,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

impl StageReport {
    fn skipped(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped,
            exit_code: 0,
            duration_ms: 0,
            skip_reason: Some(reason.into()),
            output: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub package: String,
    pub version: String,
    pub stages: Vec<StageReport>,
    pub success: bool,
}

/// Run the full pipeline.
///
/// Stages execute strictly in sequence. The first failure halts the run:
/// every remaining stage is reported skipped and the stage's error is
/// returned with the partial report attached under `details.pipeline`.
pub fn run(ctx: &PipelineContext, runner: &dyn StageRunner) -> Result<PipelineReport> {
    let planned = plan(ctx);
    let mut stages = Vec::with_capacity(planned.len());
    let mut failure: Option<Error> = None;

    for entry in planned {
        if failure.is_some() {
            stages.push(StageReport::skipped(entry.stage, "earlier stage failed"));
            continue;
        }

        match entry.action {
            StageAction::Skip { reason } => {
                log_status!("pipeline", "Skipping {}: {}", entry.stage, reason);
                stages.push(StageReport::skipped(entry.stage, reason));
            }
            StageAction::Run => {
                let mut outcome: Option<Result<Value>> = None;
                let result = stage::timed(entry.stage, || {
                    let r = runner.run_stage(entry.stage, ctx);
                    let code = match &r {
                        Ok(_) => 0,
                        Err(e) => e.stage_exit_code().unwrap_or(1),
                    };
                    outcome = Some(r);
                    code
                });

                match outcome {
                    Some(Ok(output)) => stages.push(StageReport {
                        stage: entry.stage,
                        status: StageStatus::Success,
                        exit_code: 0,
                        duration_ms: result.duration_ms,
                        skip_reason: None,
                        output: Some(output),
                    }),
                    Some(Err(err)) => {
                        stages.push(StageReport {
                            stage: entry.stage,
                            status: StageStatus::Failed,
                            exit_code: result.exit_code,
                            duration_ms: result.duration_ms,
                            skip_reason: None,
                            output: None,
                        });
                        failure = Some(err);
                    }
                    // timed always runs the closure
                    None => {
                        failure = Some(Error::internal_unexpected(format!(
                            "stage {} produced no outcome",
                            entry.stage
                        )))
                    }
                }
            }
        }
    }

    let report = PipelineReport {
        package: ctx.package_name.clone(),
        version: ctx.version.value.clone(),
        success: failure.is_none(),
        stages,
    };

    match failure {
        None => Ok(report),
        Some(mut err) => {
            if let Value::Object(details) = &mut err.details {
                if let Ok(partial) = serde_json::to_value(&report) {
                    details.insert("pipeline".to_string(), partial);
                }
            }
            Err(err)
        }
    }
}
