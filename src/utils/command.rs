//! External command execution primitives.

use std::process::Command;

use serde::Serialize;

/// Run a command in a directory, returning None on failure instead of error.
///
/// Useful when command failure is expected/acceptable (e.g., looking up the
/// previous tag in a repository that has none).
pub fn run_in_optional(dir: &str, program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        None
    } else {
        Some(stdout)
    }
}

/// Last `n` lines of the most useful stream, for failure diagnostics.
///
/// Prefers stderr, falls back to stdout.
pub fn output_tail(stdout: &str, stderr: &str, n: usize) -> String {
    let text = if stderr.trim().is_empty() {
        stdout
    } else {
        stderr
    };
    let tail: Vec<&str> = text.lines().rev().take(n).collect();
    tail.into_iter().rev().collect::<Vec<_>>().join("\n")
}

/// Captured output from command execution.
/// Reusable primitive for any stage that executes external processes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CapturedOutput {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl CapturedOutput {
    pub fn new(stdout: String, stderr: String) -> Self {
        Self { stdout, stderr }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_in_optional_returns_trimmed_stdout() {
        let result = run_in_optional("/tmp", "echo", &["hello"]);
        assert_eq!(result.as_deref(), Some("hello"));
    }

    #[test]
    fn run_in_optional_returns_none_on_failure() {
        let result = run_in_optional("/tmp", "false", &[]);
        assert!(result.is_none());
    }

    #[test]
    fn output_tail_prefers_stderr() {
        assert_eq!(output_tail("out", "err", 15), "err");
    }

    #[test]
    fn output_tail_truncates_to_last_lines() {
        let stdout = "a\nb\nc\nd";
        assert_eq!(output_tail(stdout, "", 2), "c\nd");
    }
}
