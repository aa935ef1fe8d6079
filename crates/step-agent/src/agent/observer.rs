//! Hooks for surfacing loop progress to a front end

use std::time::Duration;

use super::step::StepError;
use crate::tools::ToolResult;

/// Receives progress events from the agent loop
///
/// Every method has a no-op default so front ends implement only what they show.
pub trait StepObserver: Send + Sync {
    /// A request is about to go to the model
    fn on_model_call(&self, _call: usize) {}

    fn on_plan(&self, _content: &str) {}

    fn on_tool_call(&self, _tool: &str, _input: &str) {}

    fn on_tool_result(&self, _tool: &str, _result: &ToolResult) {}

    fn on_malformed_reply(&self, _raw: &str, _error: &StepError) {}

    /// The service rate limited us; the loop waits `wait` before retry `attempt`
    fn on_rate_limited(&self, _attempt: u32, _wait: Duration) {}

    fn on_answer(&self, _content: &str) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StepObserver for NoopObserver {}
