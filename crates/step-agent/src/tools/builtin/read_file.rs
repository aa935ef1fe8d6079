//! File read tool

use async_trait::async_trait;
use std::fs;

use crate::tools::{Tool, ToolContext, ToolResult};

/// Tool for reading file contents
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a text file and return its contents."
    }

    fn input_hint(&self) -> &str {
        "filename string"
    }

    async fn execute(&self, input: &str, ctx: &ToolContext) -> ToolResult {
        let filename = input.trim();
        if filename.is_empty() {
            return ToolResult::error("Read error: no filename given");
        }

        let path = ctx.resolve(filename);

        match fs::read_to_string(&path) {
            Ok(content) if content.is_empty() => ToolResult::success("(empty file)"),
            Ok(content) => ToolResult::success(ctx.truncate(content)),
            Err(e) => ToolResult::error(format!("Read error: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[tokio::test]
    async fn test_read_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "line 1").unwrap();
        writeln!(temp, "line 2").unwrap();

        let result = ReadFileTool
            .execute(temp.path().to_str().unwrap(), &ToolContext::default())
            .await;
        assert!(result.success);
        assert_eq!(result.output, "line 1\nline 2\n");
    }

    #[tokio::test]
    async fn test_read_relative_to_working_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "remember").unwrap();
        let ctx = ToolContext::new(temp_dir.path().to_path_buf());

        let result = ReadFileTool.execute(" notes.txt\n", &ctx).await;
        assert_eq!(result.output, "remember");
    }

    #[tokio::test]
    async fn test_read_truncates() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("big.txt"), "x".repeat(100)).unwrap();
        let ctx = ToolContext::new(temp_dir.path().to_path_buf()).with_max_output_len(10);

        let result = ReadFileTool.execute("big.txt", &ctx).await;
        assert!(result.output.starts_with("xxxxxxxxxx\n"));
        assert!(result.output.contains("truncated"));
    }

    #[tokio::test]
    async fn test_read_nonexistent_file() {
        let result = ReadFileTool
            .execute("/nonexistent/path/file.txt", &ToolContext::default())
            .await;
        assert!(!result.success);
        assert!(result.observation_text().starts_with("Read error:"));
    }
}
