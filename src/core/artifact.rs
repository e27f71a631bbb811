//! Built distributables and output-directory scanning.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Source distribution (`.tar.gz` / `.zip`).
    Sdist,
    /// Binary distribution (`.whl`).
    Wheel,
    Other,
}

impl ArtifactKind {
    fn from_file_name(name: &str) -> Self {
        if name.ends_with(".whl") {
            ArtifactKind::Wheel
        } else if name.ends_with(".tar.gz") || name.ends_with(".zip") {
            ArtifactKind::Sdist
        } else {
            ArtifactKind::Other
        }
    }
}

/// A packaged, distributable build output, identified by name+version.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub file_name: String,
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub size_bytes: u64,
}

/// Scan an output directory for distributable artifacts.
///
/// Returns an empty list (not an error) when the directory does not exist:
/// a missing `dist/` simply means nothing has been built yet.
pub fn scan(dist_dir: &Path) -> Result<Vec<Artifact>> {
    if !dist_dir.exists() {
        return Ok(Vec::new());
    }

    let pattern = dist_dir.join("*").display().to_string();
    let entries = glob::glob(&pattern).map_err(|e| {
        Error::validation_invalid_argument(
            "dist_dir",
            format!("Invalid artifact pattern '{}': {}", pattern, e),
            None,
        )
    })?;

    let mut artifacts = Vec::new();
    for path in entries.filter_map(|entry| entry.ok()).filter(|p| p.is_file()) {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let size_bytes = path.metadata().map(|m| m.len()).unwrap_or(0);
        artifacts.push(Artifact {
            kind: ArtifactKind::from_file_name(&file_name),
            file_name,
            path,
            size_bytes,
        });
    }

    artifacts.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(artifacts)
}

/// Scan for artifacts belonging to one package version.
///
/// Sdist and wheel file names embed `<name>-<version>` terminated by `.`
/// (the sdist extension) or `-` (the wheel's python/platform tags). The
/// terminator matters: a bare substring match would also accept `1.2.30`
/// when selecting `1.2.3`. Everything else in the output directory is stale
/// content from a previous build.
pub fn scan_for_version(dist_dir: &Path, version: &str) -> Result<Vec<Artifact>> {
    Ok(scan(dist_dir)?
        .into_iter()
        .filter(|a| file_name_has_version(&a.file_name, version))
        .collect())
}

fn file_name_has_version(file_name: &str, version: &str) -> bool {
    let marker = format!("-{}", version);
    file_name.match_indices(&marker).any(|(idx, _)| {
        matches!(
            file_name[idx + marker.len()..].chars().next(),
            Some('.') | Some('-')
        )
    })
}
