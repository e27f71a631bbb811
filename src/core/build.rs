//! Build stage: produce distributable artifacts into the output directory.

use std::fs;

use serde::Serialize;

use crate::artifact::{self, Artifact};
use crate::context::{PipelineContext, DIST_DIR};
use crate::error::{Error, Result};
use crate::executor;
use crate::stage::Stage;
use crate::utils::command::{output_tail, CapturedOutput};

/// Packaging command, run through the resolved execution context so the
/// build is reproducible independent of the invoking host.
pub const BUILD_COMMAND: &str = "python3 -m build --outdir dist .";

#[derive(Debug, Clone, Serialize)]
pub struct BuildOutput {
    pub package: String,
    pub version: String,
    pub command: String,
    pub artifacts: Vec<Artifact>,
    #[serde(flatten)]
    pub output: CapturedOutput,
    pub success: bool,
}

/// Run the build stage.
///
/// The output directory is created if absent; stale content from earlier
/// builds is tolerated (run `clean` first for a pristine build). The version
/// is pinned in the context, so the packaging tool sees exactly the version
/// every later stage will reference.
pub fn run(ctx: &PipelineContext) -> Result<BuildOutput> {
    run_with_command(ctx, BUILD_COMMAND)
}

pub(crate) fn run_with_command(ctx: &PipelineContext, build_command: &str) -> Result<BuildOutput> {
    let dist_dir = ctx.dist_dir();
    fs::create_dir_all(&dist_dir).map_err(|e| {
        Error::internal_io(
            format!("Failed to create {}: {}", dist_dir.display(), e),
            Some("create output directory".to_string()),
        )
    })?;

    let env = stage_env(ctx);
    let env_keys: Vec<&str> = env.iter().map(|(k, _)| *k).collect();
    let command = executor::describe(&ctx.execution, build_command, &ctx.workdir, &env_keys);

    log_status!("build", "Building {} {}", ctx.package_name, ctx.version);
    let out = executor::execute(&ctx.execution, build_command, &ctx.workdir, &env);

    if !out.success {
        return Err(failure_with_hints(
            Stage::Build,
            &command,
            out.exit_code,
            &out.stdout,
            &out.stderr,
        ));
    }

    let artifacts = artifact::scan_for_version(&dist_dir, &ctx.version.value)?;
    log_status!(
        "build",
        "Produced {} artifact(s) in {}/",
        artifacts.len(),
        DIST_DIR
    );

    Ok(BuildOutput {
        package: ctx.package_name.clone(),
        version: ctx.version.value.clone(),
        command,
        artifacts,
        output: CapturedOutput::new(out.stdout, out.stderr),
        success: true,
    })
}

/// Environment handed to the build command. `PACKAGE_VERSION` is how the
/// packaging metadata picks up the pinned version; the extra index is needed
/// when build dependencies live on an internal mirror.
pub fn stage_env(ctx: &PipelineContext) -> Vec<(&'static str, String)> {
    let mut env = vec![("PACKAGE_VERSION", ctx.version.value.clone())];
    if let Some(url) = &ctx.extra_index_url {
        env.push(("PIP_EXTRA_INDEX_URL", url.clone()));
    }
    env
}

/// Build a stage failure with the output tail and the universal POSIX
/// exit-code hints.
pub fn failure_with_hints(
    stage: Stage,
    command: &str,
    exit_code: i32,
    stdout: &str,
    stderr: &str,
) -> Error {
    let err = Error::stage_failed(stage, command, exit_code, output_tail(stdout, stderr, 15));
    match exit_code {
        127 => err.with_hint(
            "Command not found. Check that the command and its dependencies are installed and in PATH.",
        ),
        126 => err.with_hint("Permission denied. Check file permissions on the command."),
        _ => err,
    }
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
    fn stage_env_pins_version() {
        let ctx = ctx(&[("PACKAGE_VERSION", "2.0.0")], Path::new("/work/pkg"));
        let env = stage_env(&ctx);
        assert!(env.contains(&("PACKAGE_VERSION", "2.0.0".to_string())));
    }

    #[test]
    fn stage_env_forwards_extra_index() {
        let ctx = ctx(
            &[("PIP_EXTRA_INDEX_URL", "https://mirror.internal/simple")],
            Path::new("/work/pkg"),
        );
        let env = stage_env(&ctx);
        assert!(env
            .iter()
            .any(|(k, v)| *k == "PIP_EXTRA_INDEX_URL" && v.contains("mirror.internal")));
    }

    #[test]
    fn failure_hints_on_command_not_found() {
        let err = failure_with_hints(Stage::Build, "python3 -m build", 127, "", "not found");
        assert_eq!(err.hints.len(), 1);
        assert!(err.hints[0].message.contains("not found"));
    }

    #[test]
    fn run_creates_dist_and_scans_artifacts() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = ctx(
            &[("PACKAGE_NAME", "toolkit"), ("PACKAGE_VERSION", "1.0.0")],
            dir.path(),
        );

        let output =
            run_with_command(&ctx, "touch dist/toolkit-1.0.0.tar.gz").unwrap();
        assert!(output.success);
        assert_eq!(output.artifacts.len(), 1);
        assert_eq!(output.artifacts[0].file_name, "toolkit-1.0.0.tar.gz");
    }

    #[test]
    fn run_tolerates_stale_dist_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = ctx(
            &[("PACKAGE_NAME", "toolkit"), ("PACKAGE_VERSION", "1.1.0")],
            dir.path(),
        );
        std::fs::create_dir_all(ctx.dist_dir()).unwrap();
        std::fs::write(ctx.dist_dir().join("toolkit-1.0.0.tar.gz"), b"stale").unwrap();

        let output =
            run_with_command(&ctx, "touch dist/toolkit-1.1.0.tar.gz").unwrap();
        // stale artifacts stay on disk but are excluded from the report
        assert_eq!(output.artifacts.len(), 1);
        assert_eq!(output.artifacts[0].file_name, "toolkit-1.1.0.tar.gz");
    }

    #[test]
    fn run_surfaces_command_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = ctx(&[("PACKAGE_NAME", "toolkit")], dir.path());

        let err = run_with_command(&ctx, "echo broken >&2; exit 7").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::BuildFailed);
        assert_eq!(err.details["exitCode"], 7);
        assert!(err.details["outputTail"]
            .as_str()
            .unwrap()
            .contains("broken"));
    }
}
