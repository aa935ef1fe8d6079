//! Agent configuration and run bookkeeping

use serde::Serialize;

/// Per-run limits for the agent loop
#[derive(Debug, Clone, Default)]
pub struct AgentConfig {
    /// Ceiling on model calls in one run; `None` is unbounded
    pub max_model_calls: Option<usize>,
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_model_calls(mut self, max: Option<usize>) -> Self {
        self.max_model_calls = max;
        self
    }
}

/// Where the loop is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingModel,
    Decoding,
    Planning,
    Acting,
    Done,
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoopState::AwaitingModel => "awaiting-model",
            LoopState::Decoding => "decoding",
            LoopState::Planning => "planning",
            LoopState::Acting => "acting",
            LoopState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of one completed request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    /// Content of the OUTPUT step
    pub answer: String,
    pub model_calls: usize,
    pub plans: usize,
    pub tool_calls: usize,
    pub malformed_replies: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_config_defaults_unbounded() {
        assert_eq!(AgentConfig::new().max_model_calls, None);
        let config = AgentConfig::new().with_max_model_calls(Some(8));
        assert_eq!(config.max_model_calls, Some(8));
    }

    #[test]
    fn test_run_outcome_serializes() {
        let outcome = RunOutcome {
            answer: "done".to_string(),
            model_calls: 3,
            plans: 1,
            tool_calls: 1,
            malformed_replies: 0,
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["answer"], "done");
        assert_eq!(value["model_calls"], 3);
    }

    #[test]
    fn test_loop_state_display() {
        assert_eq!(LoopState::AwaitingModel.to_string(), "awaiting-model");
        assert_eq!(LoopState::Done.to_string(), "done");
    }
}
