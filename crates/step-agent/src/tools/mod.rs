//! Tool framework for agent-based execution
//!
//! Every tool takes one opaque string and answers with one string. The input
//! grammar is owned by the tool; failures are reported as descriptive text so
//! the conversation can carry on.

pub mod builtin;
pub mod registry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of tool execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,
    /// Output from the tool
    pub output: String,
    /// Error message if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    /// Create a failed result
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    /// Create a failed result with output
    pub fn failure(output: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            error: Some(error.into()),
        }
    }

    /// Text handed back to the model as the observation output
    pub fn observation_text(&self) -> String {
        match &self.error {
            None => self.output.clone(),
            Some(error) if self.output.is_empty() => error.clone(),
            Some(error) => format!("{}\n({})", self.output, error),
        }
    }
}

/// Context provided to tools during execution
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Directory relative paths and commands resolve against
    pub working_dir: PathBuf,
    /// Maximum output length (truncate if exceeded)
    pub max_output_len: usize,
    /// Timeout for shell commands in seconds
    pub command_timeout_secs: u64,
    /// Timeout for HTTP requests in seconds
    pub http_timeout_secs: u64,
    /// Base URL of the weather service
    pub weather_url: String,
}

impl Default for ToolContext {
    fn default() -> Self {
        Self {
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            max_output_len: 50000,
            command_timeout_secs: 120,
            http_timeout_secs: 5,
            weather_url: "https://wttr.in".to_string(),
        }
    }
}

impl ToolContext {
    /// Create a new context with the given working directory
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            working_dir,
            ..Default::default()
        }
    }

    pub fn with_command_timeout(mut self, secs: u64) -> Self {
        self.command_timeout_secs = secs;
        self
    }

    pub fn with_http_timeout(mut self, secs: u64) -> Self {
        self.http_timeout_secs = secs;
        self
    }

    pub fn with_max_output_len(mut self, len: usize) -> Self {
        self.max_output_len = len;
        self
    }

    pub fn with_weather_url(mut self, url: impl Into<String>) -> Self {
        self.weather_url = url.into();
        self
    }

    /// Resolve a path relative to the working directory
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            path
        } else {
            self.working_dir.join(path)
        }
    }

    /// Truncate output to `max_output_len` bytes on a char boundary
    pub fn truncate(&self, output: String) -> String {
        if output.len() <= self.max_output_len {
            return output;
        }

        let safe_end = output
            .char_indices()
            .map(|(idx, c)| idx + c.len_utf8())
            .take_while(|end| *end <= self.max_output_len)
            .last()
            .unwrap_or(0);

        format!(
            "{}\n\n[Output truncated at {} bytes]",
            &output[..safe_end],
            safe_end
        )
    }
}

/// The Tool trait that all tools must implement
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name
    fn name(&self) -> &str;

    /// Get a description of what the tool does
    fn description(&self) -> &str;

    /// Describe the expected input string
    fn input_hint(&self) -> &str;

    /// Execute the tool. Never fails: problems come back as an error result.
    async fn execute(&self, input: &str, ctx: &ToolContext) -> ToolResult;
}

/// Adapts a plain `Fn(&str) -> String` into a tool
#[cfg(test)]
pub struct FnTool<F> {
    name: String,
    description: String,
    input_hint: String,
    func: F,
}

#[cfg(test)]
impl<F> FnTool<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_hint: impl Into<String>,
        func: F,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_hint: input_hint.into(),
            func,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl<F> Tool for FnTool<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_hint(&self) -> &str {
        &self.input_hint
    }

    async fn execute(&self, input: &str, _ctx: &ToolContext) -> ToolResult {
        ToolResult::success((self.func)(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_text() {
        assert_eq!(ToolResult::success("ok").observation_text(), "ok");
        assert_eq!(
            ToolResult::error("Write error: denied").observation_text(),
            "Write error: denied"
        );
        assert_eq!(
            ToolResult::failure("boom", "Command exited with code 1").observation_text(),
            "boom\n(Command exited with code 1)"
        );
    }

    #[test]
    fn test_truncate_is_char_safe() {
        let ctx = ToolContext::default().with_max_output_len(5);
        let out = ctx.truncate("héllo wörld".to_string());
        assert!(out.starts_with("héll"));
        assert!(out.contains("[Output truncated at 5 bytes]"));

        // A cut inside a multi-byte char backs off to the previous boundary
        let ctx = ToolContext::default().with_max_output_len(2);
        let out = ctx.truncate("héllo".to_string());
        assert!(out.starts_with("h\n"));
        assert!(out.contains("[Output truncated at 1 bytes]"));

        let short = ctx.truncate("abc".to_string());
        assert_eq!(short, "abc");
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let ctx = ToolContext::new(PathBuf::from("/work"));
        assert_eq!(ctx.resolve("a.txt"), PathBuf::from("/work/a.txt"));
        assert_eq!(ctx.resolve("/etc/hosts"), PathBuf::from("/etc/hosts"));
    }

    #[tokio::test]
    async fn test_fn_tool() {
        let tool = FnTool::new("upper", "Uppercases", "text", |input: &str| input.to_uppercase());
        let result = tool.execute("abc", &ToolContext::default()).await;
        assert!(result.success);
        assert_eq!(result.output, "ABC");
        assert_eq!(tool.name(), "upper");
    }
}
