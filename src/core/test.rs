//! Test stage: run the package's test suite.

use serde::Serialize;

use crate::build::failure_with_hints;
use crate::context::PipelineContext;
use crate::error::Result;
use crate::executor;
use crate::install::{self, INSTALL_COMMAND};
use crate::stage::Stage;
use crate::utils::command::CapturedOutput;

pub const TEST_COMMAND: &str = "python3 -m pytest";

#[derive(Debug, Clone, Serialize)]
pub struct TestOutput {
    pub command: String,
    #[serde(flatten)]
    pub output: CapturedOutput,
    pub success: bool,
}

/// Run the test stage through the resolved execution context.
///
/// A disposable container has no state from the install stage, so the
/// containerized form chains the editable install before the suite. The
/// pipeline-level ordering invariant (test only after a successful install)
/// is enforced by the runner in both forms.
pub fn run(ctx: &PipelineContext) -> Result<TestOutput> {
    run_with_command(ctx, TEST_COMMAND)
}

/// Run the test stage standalone, outside the pipeline runner.
///
/// Test depends on a completed install, so direct invocation performs the
/// editable install first. The containerized form already chains it inside
/// the container.
pub fn run_standalone(ctx: &PipelineContext) -> Result<TestOutput> {
    run_standalone_with_commands(ctx, INSTALL_COMMAND, TEST_COMMAND)
}

pub(crate) fn run_standalone_with_commands(
    ctx: &PipelineContext,
    install_command: &str,
    test_command: &str,
) -> Result<TestOutput> {
    if !ctx.execution.is_containerized() {
        install::run_with_command(ctx, install_command)?;
    }
    run_with_command(ctx, test_command)
}

pub(crate) fn run_with_command(ctx: &PipelineContext, test_command: &str) -> Result<TestOutput> {
    let command = if ctx.execution.is_containerized() {
        format!("{} && {}", INSTALL_COMMAND, test_command)
    } else {
        test_command.to_string()
    };

    let env = crate::install::stage_env(ctx);
    let env_keys: Vec<&str> = env.iter().map(|(k, _)| *k).collect();
    let described = executor::describe(&ctx.execution, &command, &ctx.workdir, &env_keys);

    log_status!("test", "Running test suite for {}", ctx.package_name);
    let out = executor::execute(&ctx.execution, &command, &ctx.workdir, &env);

    if !out.success {
        return Err(failure_with_hints(
            Stage::Test,
            &described,
            out.exit_code,
            &out.stdout,
            &out.stderr,
        ));
    }

    Ok(TestOutput {
        command: described,
        output: CapturedOutput::new(out.stdout, out.stderr),
        success: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvSnapshot;
    use std::path::Path;

    fn ctx(pairs: &[(&str, &str)], workdir: &Path) -> PipelineContext {
        let env =
            EnvSnapshot::from_vars(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        PipelineContext::resolve(&env, workdir).unwrap()
    }

    #[test]
    fn suite_failure_maps_to_test_failed() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = ctx(&[], dir.path());
        let err = run_with_command(&ctx, "exit 1").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::TestFailed);
    }

    #[test]
    fn standalone_invocation_installs_before_the_suite() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = ctx(&[], dir.path());

        run_standalone_with_commands(
            &ctx,
            "echo install >> order.log",
            "echo test >> order.log",
        )
        .unwrap();

        let order = std::fs::read_to_string(dir.path().join("order.log")).unwrap();
        assert_eq!(order.lines().collect::<Vec<_>>(), ["install", "test"]);
    }

    #[test]
    fn standalone_invocation_stops_when_install_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = ctx(&[], dir.path());

        let err =
            run_standalone_with_commands(&ctx, "exit 3", "touch suite-ran").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InstallFailed);
        assert!(!dir.path().join("suite-ran").exists());
    }

    #[test]
    fn containerized_command_chains_editable_install() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = ctx(&[("BUILDER_IMAGE", "python:3.8-slim")], dir.path());
        assert!(ctx.execution.is_containerized());

        // The rendered command must carry the install prefix; the suite alone
        // would import nothing inside a fresh container.
        let described = executor::describe(
            &ctx.execution,
            &format!("{} && {}", INSTALL_COMMAND, TEST_COMMAND),
            &ctx.workdir,
            &[],
        );
        assert!(described.contains("pip install -e . && python3 -m pytest"));
    }
}
