//! Tool registry for managing and dispatching to available tools

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::{Tool, ToolContext, ToolResult};
use crate::error::AgentError;

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    /// Bind a name to a plain string function
    #[cfg(test)]
    pub fn register_fn<F>(&mut self, name: &str, description: &str, input_hint: &str, func: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.register(super::FnTool::new(name, description, input_hint, func));
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all registered tool names, sorted
    pub fn list_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get all tools, sorted by name
    pub fn all_tools(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<_> = self.tools.values().cloned().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
    }

    /// Look up a tool and run it with the given input
    ///
    /// An unknown name is a dispatch error; tool failures are not errors here.
    #[instrument(skip(self, input, ctx), fields(tool = %name, input_len = input.len()))]
    pub async fn invoke(
        &self,
        name: &str,
        input: &str,
        ctx: &ToolContext,
    ) -> Result<ToolResult, AgentError> {
        let tool = match self.get(name) {
            Some(t) => t,
            None => {
                warn!(tool = %name, available = ?self.list_names(), "Tool not found");
                return Err(AgentError::UnknownTool(name.to_string()));
            }
        };

        info!(tool = %name, "Executing tool");
        let result = tool.execute(input, ctx).await;

        if result.success {
            info!(tool = %name, output_len = result.output.len(), "Tool executed successfully");
        } else {
            warn!(tool = %name, error = ?result.error, "Tool execution failed");
        }

        Ok(result)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.list_names())
            .finish()
    }
}
