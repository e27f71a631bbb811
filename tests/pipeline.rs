//! Pipeline ordering and gating behavior, verified with a scripted stage
//! runner so no packaging toolchain is involved.

use std::cell::RefCell;
use std::path::Path;

use serde_json::{json, Value};
use shipwright::env::EnvSnapshot;
use shipwright::pipeline::{self, StageRunner};
use shipwright::{Error, ErrorCode, PipelineContext, Result, Stage, StageStatus};

struct ScriptedRunner {
    fail_on: Option<(Stage, i32)>,
    calls: RefCell<Vec<Stage>>,
}

impl ScriptedRunner {
    fn passing() -> Self {
        Self {
            fail_on: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn failing_at(stage: Stage, exit_code: i32) -> Self {
        Self {
            fail_on: Some((stage, exit_code)),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Stage> {
        self.calls.borrow().clone()
    }
}

impl StageRunner for ScriptedRunner {
    fn run_stage(&self, stage: Stage, _ctx: &PipelineContext) -> Result<Value> {
        self.calls.borrow_mut().push(stage);
        match self.fail_on {
            Some((failing, exit_code)) if failing == stage => Err(Error::stage_failed(
                stage,
                "scripted command",
                exit_code,
                "scripted failure",
            )),
            _ => Ok(json!({ "stage": stage.name() })),
        }
    }
}

fn ctx(pairs: &[(&str, &str)]) -> PipelineContext {
    let env = EnvSnapshot::from_vars(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    PipelineContext::resolve(&env, Path::new("/work/toolkit")).unwrap()
}

#[test]
fn branch_run_executes_build_install_test_in_order() {
    let runner = ScriptedRunner::passing();
    let ctx = ctx(&[
        ("GITHUB_REF", "refs/heads/main"),
        ("PYPI_REPO", "https://pypi.example/simple"),
    ]);

    let report = pipeline::run(&ctx, &runner).unwrap();

    assert_eq!(runner.calls(), vec![Stage::Build, Stage::Install, Stage::Test]);
    assert!(report.success);

    let statuses: Vec<StageStatus> = report.stages.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![
            StageStatus::Success,
            StageStatus::Success,
            StageStatus::Success,
            StageStatus::Skipped,
            StageStatus::Skipped,
        ]
    );
}

#[test]
fn tag_run_with_repo_executes_every_stage() {
    let runner = ScriptedRunner::passing();
    let ctx = ctx(&[
        ("GITHUB_REF", "refs/tags/v1.2.3"),
        ("PYPI_REPO", "https://pypi.example/simple"),
        ("PYPI_TOKEN", "secret"),
    ]);

    let report = pipeline::run(&ctx, &runner).unwrap();

    assert_eq!(
        runner.calls(),
        vec![
            Stage::Build,
            Stage::Install,
            Stage::Test,
            Stage::Publish,
            Stage::Release,
        ]
    );
    assert!(report.stages.iter().all(|s| s.status == StageStatus::Success));
    assert_eq!(report.version, "1.2.3");
}

#[test]
fn tag_run_without_repo_skips_publish_but_still_releases() {
    let runner = ScriptedRunner::passing();
    let ctx = ctx(&[("GITHUB_REF", "refs/tags/v1.2.3")]);

    let report = pipeline::run(&ctx, &runner).unwrap();

    assert_eq!(
        runner.calls(),
        vec![Stage::Build, Stage::Install, Stage::Test, Stage::Release]
    );

    let publish = &report.stages[3];
    assert_eq!(publish.stage, Stage::Publish);
    assert_eq!(publish.status, StageStatus::Skipped);
    assert!(publish
        .skip_reason
        .as_deref()
        .unwrap()
        .contains("repository"));
}

#[test]
fn build_failure_halts_the_whole_pipeline() {
    let runner = ScriptedRunner::failing_at(Stage::Build, 2);
    let ctx = ctx(&[
        ("GITHUB_REF", "refs/tags/v1.0.0"),
        ("PYPI_REPO", "https://pypi.example/simple"),
    ]);

    let err = pipeline::run(&ctx, &runner).unwrap_err();

    assert_eq!(runner.calls(), vec![Stage::Build]);
    assert_eq!(err.code, ErrorCode::BuildFailed);

    let stages = err.details["pipeline"]["stages"].as_array().unwrap();
    assert_eq!(stages.len(), 5);
    assert_eq!(stages[0]["status"], "failed");
    for stage in &stages[1..] {
        assert_eq!(stage["status"], "skipped");
        assert_eq!(stage["skipReason"], "earlier stage failed");
    }
}

#[test]
fn test_never_runs_after_a_failed_install() {
    let runner = ScriptedRunner::failing_at(Stage::Install, 1);
    let ctx = ctx(&[("GITHUB_REF", "refs/heads/main")]);

    let err = pipeline::run(&ctx, &runner).unwrap_err();

    assert_eq!(runner.calls(), vec![Stage::Build, Stage::Install]);
    assert_eq!(err.code, ErrorCode::InstallFailed);
}

#[test]
fn test_failure_blocks_publish_and_release_on_a_tag() {
    let runner = ScriptedRunner::failing_at(Stage::Test, 5);
    let ctx = ctx(&[
        ("GITHUB_REF", "refs/tags/v2.0.0"),
        ("PYPI_REPO", "https://pypi.example/simple"),
        ("PYPI_TOKEN", "secret"),
    ]);

    let err = pipeline::run(&ctx, &runner).unwrap_err();

    assert_eq!(runner.calls(), vec![Stage::Build, Stage::Install, Stage::Test]);
    assert_eq!(err.code, ErrorCode::TestFailed);
    assert_eq!(err.stage_exit_code(), Some(5));
}

#[test]
fn successful_stage_reports_carry_their_outputs() {
    let runner = ScriptedRunner::passing();
    let ctx = ctx(&[]);

    let report = pipeline::run(&ctx, &runner).unwrap();

    let build = &report.stages[0];
    assert_eq!(build.output.as_ref().unwrap()["stage"], "build");
    assert_eq!(build.exit_code, 0);
}
