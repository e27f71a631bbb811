//! Stage command execution, routed through the resolved `ExecutionContext`.
//!
//! Commands run via `sh -c` so stage definitions can use shell features
//! (`dist/*` globs, `&&` chains). Containerized execution invokes `docker`
//! directly with the workdir mounted at `/workspace`; the nested stage
//! command is the only part that passes through a shell inside the container.

use std::path::Path;
use std::process::Command;

use crate::context::ExecutionContext;
use crate::utils::shell;

/// Mount point for the workdir inside the builder container.
const CONTAINER_WORKDIR: &str = "/workspace";

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

/// Execute a stage command in the given working directory.
///
/// `env` is the explicit environment handed to the child (the pipeline never
/// leans on ambient variables). For containerized execution each entry is
/// forwarded with `-e` so the command sees the same configuration either way.
pub fn execute(
    execution: &ExecutionContext,
    command: &str,
    workdir: &Path,
    env: &[(&str, String)],
) -> CommandOutput {
    let mut cmd = match execution {
        ExecutionContext::Bare => {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command).current_dir(workdir);
            for (key, value) in env {
                cmd.env(key, value);
            }
            cmd
        }
        ExecutionContext::Containerized { image } => {
            let mut cmd = Command::new("docker");
            cmd.arg("run").arg("--rm");
            cmd.arg("-v")
                .arg(format!("{}:{}", workdir.display(), CONTAINER_WORKDIR));
            cmd.arg("-w").arg(CONTAINER_WORKDIR);
            for (key, value) in env {
                cmd.arg("-e").arg(format!("{}={}", key, value));
            }
            cmd.arg(image).arg("sh").arg("-c").arg(command);
            cmd
        }
    };

    match cmd.output() {
        Ok(out) => CommandOutput {
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            success: out.status.success(),
            exit_code: out.status.code().unwrap_or(-1),
        },
        Err(e) => CommandOutput {
            stdout: String::new(),
            stderr: format!("Command error: {}", e),
            success: false,
            exit_code: -1,
        },
    }
}

/// Render the full command line the executor will run, for logs and failure
/// details. Environment values are not included, only keys, so credential
/// material can never surface here.
pub fn describe(
    execution: &ExecutionContext,
    command: &str,
    workdir: &Path,
    env_keys: &[&str],
) -> String {
    match execution {
        ExecutionContext::Bare => command.to_string(),
        ExecutionContext::Containerized { image } => {
            let mut parts = vec![
                "docker run --rm".to_string(),
                format!(
                    "-v {}",
                    shell::quote_path(&format!("{}:{}", workdir.display(), CONTAINER_WORKDIR))
                ),
                format!("-w {}", CONTAINER_WORKDIR),
            ];
            for key in env_keys {
                parts.push(format!("-e {}", key));
            }
            parts.push(shell::quote_arg(image));
            parts.push(format!("sh -c {}", shell::escape_command_for_shell(command)));
            parts.join(" ")
        }
    }
}
