//! Pipeline configuration, resolved once at process start.
//!
//! The context is immutable for the duration of one pipeline execution: all
//! stages reference the same package version, repository target, and
//! execution strategy, so artifacts can never drift from the version that
//! gets published.

use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::env::EnvSnapshot;
use crate::error::{Error, Result};

/// Default version when neither the environment nor a tag provides one.
pub const DEFAULT_VERSION: &str = "0.0.1";

/// Directory (relative to the workdir) that receives built artifacts.
pub const DIST_DIR: &str = "dist";

/// Credentials for the package repository.
///
/// The token is masked everywhere it could surface: Debug, Serialize, and
/// status logs all render `********`. The real value is only ever handed to
/// the upload tool through its child-process environment.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub user: String,
    #[serde(serialize_with = "serialize_masked")]
    pub token: String,
}

fn serialize_masked<S: Serializer>(_token: &str, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(Credentials::MASK)
}

impl Credentials {
    pub const MASK: &'static str = "********";
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("token", &Self::MASK)
            .finish()
    }
}

/// The event that caused this pipeline invocation, parsed from the CI ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Push to a branch (`refs/heads/<name>`).
    Branch { name: String },
    /// Pull request lifecycle event (`refs/pull/...`).
    PullRequest,
    /// Version tag push (`refs/tags/<name>`).
    Tag { name: String },
    /// No CI ref present: a developer running the pipeline by hand.
    Manual,
}

impl Trigger {
    pub fn from_ref(git_ref: Option<&str>) -> Self {
        let Some(git_ref) = git_ref else {
            return Trigger::Manual;
        };

        if let Some(name) = git_ref.strip_prefix("refs/tags/") {
            return Trigger::Tag {
                name: name.to_string(),
            };
        }
        if let Some(name) = git_ref.strip_prefix("refs/heads/") {
            return Trigger::Branch {
                name: name.to_string(),
            };
        }
        if git_ref.starts_with("refs/pull/") {
            return Trigger::PullRequest;
        }

        // Unrecognized refs behave like a branch push: build and test,
        // never publish.
        Trigger::Branch {
            name: git_ref.to_string(),
        }
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, Trigger::Tag { .. })
    }

    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Trigger::Tag { name } => Some(name),
            _ => None,
        }
    }
}

/// Where the resolved version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSource {
    TagRef,
    Environment,
    Default,
}

/// The package version pinned for this run.
///
/// A tag-derived version always overrides the environment value, which
/// overrides the `0.0.1` default. Tags are NOT required to be valid semver:
/// the source system only did prefix matching, so a malformed tag is carried
/// through as-is with `semver_valid: false` rather than rejected.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedVersion {
    pub value: String,
    pub source: VersionSource,
    pub semver_valid: bool,
}

impl ResolvedVersion {
    pub fn resolve(env: &EnvSnapshot, trigger: &Trigger) -> Self {
        if let Some(tag) = trigger.tag_name() {
            let value = tag.strip_prefix('v').unwrap_or(tag).to_string();
            let semver_valid = semver::Version::parse(&value).is_ok();
            return Self {
                value,
                source: VersionSource::TagRef,
                semver_valid,
            };
        }

        let (value, source) = match env.get("PACKAGE_VERSION") {
            Some(v) => (v.to_string(), VersionSource::Environment),
            None => (DEFAULT_VERSION.to_string(), VersionSource::Default),
        };
        let semver_valid = semver::Version::parse(&value).is_ok();
        Self {
            value,
            source,
            semver_valid,
        }
    }
}

impl std::fmt::Display for ResolvedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// How stage commands are executed, chosen once at startup.
///
/// Containerized execution pins the build/test environment to a fixed image.
/// When `CI` is set the pipeline is already running inside a CI-managed
/// container, so the extra nesting layer is suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExecutionContext {
    Bare,
    Containerized { image: String },
}

impl ExecutionContext {
    pub fn resolve(env: &EnvSnapshot) -> Self {
        match env.get("BUILDER_IMAGE") {
            Some(image) if !env.is_set("CI") => ExecutionContext::Containerized {
                image: image.to_string(),
            },
            _ => ExecutionContext::Bare,
        }
    }

    pub fn is_containerized(&self) -> bool {
        matches!(self, ExecutionContext::Containerized { .. })
    }
}

/// Immutable configuration for one pipeline execution.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineContext {
    pub package_name: String,
    pub version: ResolvedVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_index_url: Option<String>,
    pub trigger: Trigger,
    pub execution: ExecutionContext,
    pub workdir: PathBuf,
}

impl PipelineContext {
    /// Resolve the full context from an environment snapshot.
    ///
    /// This is the only place configuration is read; stages receive the
    /// context by reference and never consult the environment themselves.
    pub fn resolve(env: &EnvSnapshot, workdir: &Path) -> Result<Self> {
        let workdir = workdir.to_path_buf();

        let package_name = match env.get("PACKAGE_NAME") {
            Some(name) => name.to_string(),
            None => workdir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| {
                    Error::config_missing_key(
                        "PACKAGE_NAME",
                        Some("working directory has no name to derive it from".to_string()),
                    )
                })?,
        };

        let trigger = Trigger::from_ref(env.get("GITHUB_REF"));
        let version = ResolvedVersion::resolve(env, &trigger);
        let execution = ExecutionContext::resolve(env);

        let credentials = env.get("PYPI_TOKEN").map(|token| Credentials {
            // Token-based uploads conventionally use this placeholder user.
            user: env.first_of(&["PYPI_USER"], "__token__"),
            token: token.to_string(),
        });

        Ok(Self {
            package_name,
            version,
            repo_url: env.get("PYPI_REPO").map(str::to_string),
            credentials,
            extra_index_url: env.get("PIP_EXTRA_INDEX_URL").map(str::to_string),
            trigger,
            execution,
            workdir,
        })
    }

    /// Artifact output directory for this run.
    pub fn dist_dir(&self) -> PathBuf {
        self.workdir.join(DIST_DIR)
    }
}
