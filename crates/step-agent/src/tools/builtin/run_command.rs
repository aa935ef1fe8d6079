//! Shell command execution tool

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use crate::tools::{Tool, ToolContext, ToolResult};

/// Tool for executing shell commands
pub struct RunCommandTool;

#[async_trait]
impl Tool for RunCommandTool {
    fn name(&self) -> &str {
        "run_command"
    }

    fn description(&self) -> &str {
        "Run a shell command in the working directory and return its output."
    }

    fn input_hint(&self) -> &str {
        "command string"
    }

    async fn execute(&self, input: &str, ctx: &ToolContext) -> ToolResult {
        let command = input.trim();
        if command.is_empty() {
            return ToolResult::error("No command given");
        }

        if !ctx.working_dir.exists() {
            return ToolResult::error(format!(
                "Working directory does not exist: {}",
                ctx.working_dir.display()
            ));
        }

        let (shell, shell_arg) = if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };

        let mut cmd = Command::new(shell);
        cmd.arg(shell_arg)
            .arg(command)
            .current_dir(&ctx.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let timeout_secs = ctx.command_timeout_secs;
        let result = timeout(Duration::from_secs(timeout_secs), cmd.output()).await;

        match result {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);

                // Prefer stdout, fall back to stderr
                let text = [stdout.trim(), stderr.trim()]
                    .into_iter()
                    .find(|s| !s.is_empty())
                    .unwrap_or("Done.")
                    .to_string();
                let text = ctx.truncate(text);

                if output.status.success() {
                    ToolResult::success(text)
                } else {
                    let exit_code = output
                        .status
                        .code()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    ToolResult::failure(text, format!("Command exited with code {}", exit_code))
                }
            }
            Ok(Err(e)) => ToolResult::error(format!("Failed to execute command: {}", e)),
            Err(_) => ToolResult::error(format!(
                "Command timed out after {} seconds",
                timeout_secs
            )),
        }
    }
}
