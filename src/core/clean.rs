//! Clean: remove build byproducts from the working directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::context::{PipelineContext, DIST_DIR};
use crate::error::{Error, Result};

/// Directories removed wholesale on clean.
const BYPRODUCT_DIRS: &[&str] = &[DIST_DIR, "build"];

#[derive(Debug, Clone, Serialize)]
pub struct CleanOutput {
    pub removed: Vec<PathBuf>,
}

/// Remove `dist/`, `build/`, and any `*.egg-info` directories under the
/// workdir. Idempotent: missing paths are not an error, and a second run
/// removes nothing.
pub fn run(ctx: &PipelineContext) -> Result<CleanOutput> {
    let mut removed = Vec::new();

    for dir in BYPRODUCT_DIRS {
        let path = ctx.workdir.join(dir);
        if remove_dir(&path)? {
            removed.push(path);
        }
    }

    for path in egg_info_dirs(&ctx.workdir)? {
        if remove_dir(&path)? {
            removed.push(path);
        }
    }

    log_status!("clean", "Removed {} path(s)", removed.len());
    Ok(CleanOutput { removed })
}

fn remove_dir(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    fs::remove_dir_all(path).map_err(|e| {
        Error::internal_io(
            format!("Failed to remove {}: {}", path.display(), e),
            Some("clean byproducts".to_string()),
        )
    })?;
    Ok(true)
}

fn egg_info_dirs(workdir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = workdir.join("*.egg-info").display().to_string();
    let paths = glob::glob(&pattern)
        .map_err(|e| {
            Error::internal_unexpected(format!("Invalid clean pattern {}: {}", pattern, e))
        })?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_dir())
        .collect();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvSnapshot;

    fn ctx(workdir: &Path) -> PipelineContext {
        let env = EnvSnapshot::from_vars(std::iter::empty::<(String, String)>());
        PipelineContext::resolve(&env, workdir).unwrap()
    }

    #[test]
    fn removes_known_byproducts() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("dist")).unwrap();
        fs::create_dir_all(dir.path().join("build")).unwrap();
        fs::create_dir_all(dir.path().join("toolkit.egg-info")).unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();

        let output = run(&ctx(dir.path())).unwrap();
        assert_eq!(output.removed.len(), 3);
        assert!(!dir.path().join("dist").exists());
        assert!(!dir.path().join("toolkit.egg-info").exists());
        assert!(dir.path().join("src").exists());
    }

    #[test]
    fn clean_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("dist")).unwrap();

        assert_eq!(run(&ctx(dir.path())).unwrap().removed.len(), 1);
        assert_eq!(run(&ctx(dir.path())).unwrap().removed.len(), 0);
    }

    #[test]
    fn egg_info_files_are_left_alone() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("notes.egg-info"), b"not a dir").unwrap();

        let output = run(&ctx(dir.path())).unwrap();
        assert!(output.removed.is_empty());
        assert!(dir.path().join("notes.egg-info").exists());
    }
}
