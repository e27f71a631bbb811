use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidValue,

    ValidationInvalidArgument,

    BuildFailed,
    InstallFailed,
    TestFailed,
    PublishFailed,
    ReleaseFailed,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::BuildFailed => "build.failed",
            ErrorCode::InstallFailed => "install.failed",
            ErrorCode::TestFailed => "test.failed",
            ErrorCode::PublishFailed => "publish.failed",
            ErrorCode::ReleaseFailed => "release.failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }

    /// Error code for a failed stage command.
    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Build => ErrorCode::BuildFailed,
            Stage::Install => ErrorCode::InstallFailed,
            Stage::Test => ErrorCode::TestFailed,
            Stage::Publish => ErrorCode::PublishFailed,
            Stage::Release => ErrorCode::ReleaseFailed,
            // clean never fails on missing paths; anything else is an IO error
            Stage::Clean => ErrorCode::InternalIoError,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

/// Details for a stage whose external command exited non-zero.
///
/// Credentials never appear here: commands are assembled so that secrets
/// travel via child-process environment, not argv.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageFailedDetails {
    pub stage: String,
    pub command: String,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output_tail: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn config_missing_key(key: impl Into<String>, context: Option<String>) -> Self {
        let details = serde_json::to_value(ConfigMissingKeyDetails {
            key: key.into(),
            context,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::ConfigMissingKey,
            "Missing required configuration key",
            details,
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = serde_json::to_value(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.into(),
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            details,
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let details = serde_json::to_value(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
            tried,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    /// A stage's external command exited non-zero. The pipeline treats this
    /// as fatal: no retries, no partial continuation.
    pub fn stage_failed(
        stage: Stage,
        command: impl Into<String>,
        exit_code: i32,
        output_tail: impl Into<String>,
    ) -> Self {
        let details = serde_json::to_value(StageFailedDetails {
            stage: stage.name().to_string(),
            command: command.into(),
            exit_code,
            output_tail: output_tail.into(),
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::for_stage(stage),
            format!("Stage '{}' failed (exit code {})", stage.name(), exit_code),
            details,
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = serde_json::to_value(InternalIoErrorDetails {
            error: error.into(),
            context,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            serde_json::json!({ "error": error.into(), "context": context }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    /// Exit code carried in stage-failure details, when present and usable
    /// as a process exit code.
    pub fn stage_exit_code(&self) -> Option<i32> {
        self.details
            .get("exitCode")
            .and_then(Value::as_i64)
            .map(|c| c as i32)
            .filter(|c| *c > 0)
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_failed_maps_to_stage_code() {
        let err = Error::stage_failed(Stage::Build, "python3 -m build", 2, "boom");
        assert_eq!(err.code, ErrorCode::BuildFailed);
        assert_eq!(err.code.as_str(), "build.failed");

        let err = Error::stage_failed(Stage::Publish, "twine upload", 1, "");
        assert_eq!(err.code.as_str(), "publish.failed");
    }

    #[test]
    fn stage_failed_details_carry_exit_code() {
        let err = Error::stage_failed(Stage::Test, "python3 -m pytest", 5, "assertion failed");
        assert_eq!(err.details["exitCode"], 5);
        assert_eq!(err.details["stage"], "test");
    }

    #[test]
    fn with_hint_accumulates() {
        let err = Error::config_missing_key("PYPI_TOKEN", None)
            .with_hint("Set PYPI_TOKEN in the pipeline environment");
        assert_eq!(err.hints.len(), 1);
    }
}
