//! Release stage: attach built artifacts to a source-control release.
//!
//! Tag-gated: a release entry only makes sense for a version tag. Notes are
//! generated from the commit history between the previous tag and the
//! released one.

use std::process::Command;

use serde::Serialize;

use crate::artifact::{self, Artifact};
use crate::context::PipelineContext;
use crate::error::{Error, Result};
use crate::stage::Stage;
use crate::utils::command::{self, output_tail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStatus {
    Released,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseOutput {
    pub status: ReleaseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl ReleaseOutput {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: ReleaseStatus::Skipped,
            tag: None,
            title: None,
            notes: None,
            artifacts: Vec::new(),
            skip_reason: Some(reason.into()),
        }
    }
}

/// Run the release stage.
pub fn run(ctx: &PipelineContext) -> Result<ReleaseOutput> {
    let Some(tag) = ctx.trigger.tag_name() else {
        log_status!("release", "Not a tag-triggered run - skipping");
        return Ok(ReleaseOutput::skipped("not a tag-triggered run"));
    };

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
        .with_hint("Run 'shipwright build' before creating a release"));
    }

    let workdir = ctx.workdir.display().to_string();
    let title = format!("{} {}", ctx.package_name, ctx.version);
    let notes = release_notes(&workdir, tag);

    log_status!(
        "release",
        "Creating release {} with {} artifact(s)",
        tag,
        artifacts.len()
    );

    let mut cmd = Command::new("gh");
    cmd.arg("release")
        .arg("create")
        .arg(tag)
        .arg("--title")
        .arg(&title)
        .arg("--notes")
        .arg(&notes)
        .current_dir(&ctx.workdir);
    for artifact in &artifacts {
        cmd.arg(&artifact.path);
    }

    let out = cmd.output().map_err(|e| {
        Error::internal_io(
            format!("Failed to run gh: {}", e),
            Some("create release".to_string()),
        )
        .with_hint("The GitHub CLI ('gh') must be installed and authenticated")
    })?;

    if !out.status.success() {
        let exit_code = out.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&out.stdout).to_string();
        let stderr = String::from_utf8_lossy(&out.stderr).to_string();
        // notes elided from the reported command to keep failure details short
        let command = format!("gh release create {} --title '{}' --notes <generated> ...", tag, title);
        return Err(Error::stage_failed(
            Stage::Release,
            command,
            exit_code,
            output_tail(&stdout, &stderr, 15),
        ));
    }

    Ok(ReleaseOutput {
        status: ReleaseStatus::Released,
        tag: Some(tag.to_string()),
        title: Some(title),
        notes: Some(notes),
        artifacts,
        skip_reason: None,
    })
}

/// Generate release notes from commit subjects since the previous tag.
///
/// Falls back to a plain header when there is no previous tag or the history
/// is unavailable (shallow clone).
pub fn release_notes(workdir: &str, tag: &str) -> String {
    let range = match previous_tag(workdir, tag) {
        Some(prev) => format!("{}..{}", prev, tag),
        None => tag.to_string(),
    };

    let subjects = command::run_in_optional(
        workdir,
        "git",
        &["log", "--no-merges", "--pretty=format:%s", &range],
    );

    match subjects {
        Some(subjects) if !subjects.is_empty() => subjects
            .lines()
            .map(|s| format!("- {}", s.trim()))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => format!("Release {}", tag),
    }
}

fn previous_tag(workdir: &str, tag: &str) -> Option<String> {
    command::run_in_optional(
        workdir,
        "git",
        &["describe", "--tags", "--abbrev=0", &format!("{}^", tag)],
    )
}
