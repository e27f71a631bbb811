//! Publish stage: upload built artifacts to the package repository.
//!
//! Without a configured repository URL the stage reports itself skipped and
//! the pipeline continues (the empty-repository guard), so a tag-triggered
//! release can still run.

use serde::Serialize;

use crate::artifact::{self, Artifact};
use crate::build::failure_with_hints;
use crate::context::{ExecutionContext, PipelineContext};
use crate::error::{Error, Result};
use crate::executor;
use crate::stage::Stage;
use crate::utils::command::CapturedOutput;
use crate::utils::shell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    Published,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishOutput {
    pub status: PublishStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(flatten)]
    pub output: CapturedOutput,
}

impl PublishOutput {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: PublishStatus::Skipped,
            repo_url: None,
            user: None,
            artifacts: Vec::new(),
            skip_reason: Some(reason.into()),
            command: None,
            output: CapturedOutput::default(),
        }
    }
}

/// Run the publish stage.
///
/// Only this run's artifacts (name+version match) are uploaded, never stale
/// content that happens to sit in the output directory. Credentials travel
/// via the upload tool's environment; the assembled command line carries the
/// repository URL and artifact paths only, so logs and failure details can
/// never leak the token.
pub fn run(ctx: &PipelineContext) -> Result<PublishOutput> {
    let Some(repo_url) = &ctx.repo_url else {
        log_status!("publish", "No package repository configured - skipping");
        return Ok(PublishOutput::skipped("no package repository configured"));
    };

    let credentials = ctx.credentials.as_ref().ok_or_else(|| {
        Error::config_missing_key(
            "PYPI_TOKEN",
            Some(format!("publishing to {} requires credentials", repo_url)),
        )
        .with_hint("Set PYPI_TOKEN (and optionally PYPI_USER) in the pipeline environment")
    })?;

    let artifacts = artifact::scan_for_version(&ctx.dist_dir(), &ctx.version.value)?;
    if artifacts.is_empty() {
        return Err(Error::validation_invalid_argument(
            "dist",
            format!(
                "No artifacts found for {} {}",
                ctx.package_name, ctx.version
            ),
            None,
        )
        .with_hint("Run 'shipwright build' before publishing"));
    }

    let command = upload_command(repo_url, &artifacts);

    log_status!(
        "publish",
        "Uploading {} artifact(s) to {} as {}",
        artifacts.len(),
        repo_url,
        credentials.user
    );

    let env = vec![
        ("TWINE_USERNAME", credentials.user.clone()),
        ("TWINE_PASSWORD", credentials.token.clone()),
        ("TWINE_NON_INTERACTIVE", "1".to_string()),
    ];
    let out = executor::execute(&ExecutionContext::Bare, &command, &ctx.workdir, &env);

    if !out.success {
        return Err(failure_with_hints(
            Stage::Publish,
            &command,
            out.exit_code,
            &out.stdout,
            &out.stderr,
        )
        .with_hint("Upload failures are typically auth, network, or an already-published version"));
    }

    Ok(PublishOutput {
        status: PublishStatus::Published,
        repo_url: Some(repo_url.clone()),
        user: Some(credentials.user.clone()),
        artifacts,
        skip_reason: None,
        command: Some(command),
        output: CapturedOutput::new(out.stdout, out.stderr),
    })
}

/// Assemble the upload command. Artifact paths are passed explicitly (not as
/// a glob) so only the pinned version's files can ever be uploaded.
pub fn upload_command(repo_url: &str, artifacts: &[Artifact]) -> String {
    let mut parts = vec![format!(
        "python3 -m twine upload --repository-url {}",
        shell::quote_arg(repo_url)
    )];
    for artifact in artifacts {
        parts.push(shell::quote_path(&artifact.path.display().to_string()));
    }
    parts.join(" ")
}
