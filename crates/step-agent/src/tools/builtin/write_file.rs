//! File write tool
//!
//! Input is a JSON string: `{"filename": "path", "content": "text"}`.

use async_trait::async_trait;
use serde::Deserialize;
use std::fs;

use crate::tools::{Tool, ToolContext, ToolResult};

#[derive(Debug, Deserialize)]
struct WritePayload {
    filename: String,
    content: String,
}

/// Tool for writing file contents
pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Create or overwrite a file. Parent directories are created as needed."
    }

    fn input_hint(&self) -> &str {
        r#"JSON string: {"filename":"file.py","content":"code"}"#
    }

    async fn execute(&self, input: &str, ctx: &ToolContext) -> ToolResult {
        let payload: WritePayload = match serde_json::from_str(input) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Write error: {}", e)),
        };

        if payload.filename.trim().is_empty() {
            return ToolResult::error("Write error: filename is empty");
        }

        let path = ctx.resolve(&payload.filename);

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    return ToolResult::error(format!("Write error: {}", e));
                }
            }
        }

        match fs::write(&path, &payload.content) {
            Ok(()) => ToolResult::success(format!("{} written successfully", payload.filename)),
            Err(e) => ToolResult::error(format!("Write error: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_file() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(temp_dir.path().to_path_buf());
        let input = json!({ "filename": "hello.py", "content": "print('hi')\n" }).to_string();

        let result = WriteFileTool.execute(&input, &ctx).await;
        assert!(result.success);
        assert_eq!(result.output, "hello.py written successfully");

        let content = fs::read_to_string(temp_dir.path().join("hello.py")).unwrap();
        assert_eq!(content, "print('hi')\n");
    }

    #[tokio::test]
    async fn test_write_file_creates_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(temp_dir.path().to_path_buf());
        let input = json!({ "filename": "a/b/c/test.txt", "content": "nested" }).to_string();

        let result = WriteFileTool.execute(&input, &ctx).await;
        assert!(result.success);
        assert!(temp_dir.path().join("a/b/c/test.txt").exists());
    }

    #[tokio::test]
    async fn test_write_file_malformed_payload() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(temp_dir.path().to_path_buf());

        let result = WriteFileTool.execute("hello.py", &ctx).await;
        assert!(!result.success);
        assert!(result.observation_text().starts_with("Write error:"));

        let result = WriteFileTool
            .execute(r#"{"filename": "x.txt"}"#, &ctx)
            .await;
        assert!(!result.success);
        assert!(result.observation_text().contains("content"));
    }
}
