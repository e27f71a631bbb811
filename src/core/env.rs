//! One-time snapshot of the process environment.
//!
//! Stages never read ambient environment variables. The snapshot is captured
//! once at process start, and the pipeline context is resolved from it; after
//! that, configuration is immutable for the whole run.

use std::collections::BTreeMap;

/// Immutable view of the environment at process start.
///
/// Empty-string values are treated as unset: CI systems commonly export
/// placeholder variables with empty values, and `VAR=` must behave the same
/// as an absent `VAR`.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    pub fn capture() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build a snapshot from explicit key/value pairs.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            vars: vars.into_iter().collect(),
        }
    }

    /// Look up a variable. Empty strings resolve to `None`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Resolve the first set variable from an ordered key list, falling back
    /// to `default` when none resolves.
    pub fn first_of(&self, keys: &[&str], default: &str) -> String {
        for key in keys {
            if let Some(value) = self.get(key) {
                return value.to_string();
            }
        }
        default.to_string()
    }

    /// Whether a variable is set to a non-empty value.
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}
