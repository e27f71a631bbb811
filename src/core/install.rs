//! Install stage: editable install into the current environment.
//!
//! Tests must run against the real package metadata, not a mock, so the
//! just-built package is installed in development mode before the suite runs.

use serde::Serialize;

use crate::build::failure_with_hints;
use crate::context::{ExecutionContext, PipelineContext};
use crate::error::Result;
use crate::executor;
use crate::stage::Stage;
use crate::utils::command::CapturedOutput;

pub const INSTALL_COMMAND: &str = "python3 -m pip install -e .";

#[derive(Debug, Clone, Serialize)]
pub struct InstallOutput {
    pub command: String,
    #[serde(flatten)]
    pub output: CapturedOutput,
    pub success: bool,
}

/// Run the install stage.
///
/// Always executes bare: the install targets the environment invoking the
/// pipeline, and a disposable container would not retain it for the
/// following stages.
pub fn run(ctx: &PipelineContext) -> Result<InstallOutput> {
    run_with_command(ctx, INSTALL_COMMAND)
}

pub(crate) fn run_with_command(ctx: &PipelineContext, install_command: &str) -> Result<InstallOutput> {
    let env = stage_env(ctx);

    log_status!("install", "Installing {} in editable mode", ctx.package_name);
    let out = executor::execute(&ExecutionContext::Bare, install_command, &ctx.workdir, &env);

    if !out.success {
        return Err(failure_with_hints(
            Stage::Install,
            install_command,
            out.exit_code,
            &out.stdout,
            &out.stderr,
        ));
    }

    Ok(InstallOutput {
        command: install_command.to_string(),
        output: CapturedOutput::new(out.stdout, out.stderr),
        success: true,
    })
}

pub(crate) fn stage_env(ctx: &PipelineContext) -> Vec<(&'static str, String)> {
    let mut env = Vec::new();
    if let Some(url) = &ctx.extra_index_url {
        env.push(("PIP_EXTRA_INDEX_URL", url.clone()));
    }
    env
}
