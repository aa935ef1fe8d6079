//! Errors that abort an agent run

use llm_gateway::ChatError;
use thiserror::Error;

/// Which retry budget ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryKind {
    /// Rate-limit backoffs for a single model request
    RateLimit,
    /// Consecutive replies that could not be decoded into a step
    MalformedReply,
    /// Model calls for the whole run
    ModelCalls,
}

impl std::fmt::Display for RetryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryKind::RateLimit => write!(f, "rate-limit retries"),
            RetryKind::MalformedReply => write!(f, "malformed-reply retries"),
            RetryKind::ModelCalls => write!(f, "model calls"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    /// The model asked for a tool that is not registered
    #[error("model requested unknown tool '{0}'")]
    UnknownTool(String),

    /// Non-retryable model service failure
    #[error("model service error: {0}")]
    Service(#[from] ChatError),

    #[error("retry budget exhausted after {attempts} {kind}")]
    RetryBudgetExhausted { kind: RetryKind, attempts: u32 },
}

impl AgentError {
    pub fn is_dispatch_error(&self) -> bool {
        matches!(self, AgentError::UnknownTool(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AgentError::UnknownTool("delete_everything".to_string());
        assert!(err.is_dispatch_error());
        assert_eq!(err.to_string(), "model requested unknown tool 'delete_everything'");

        let err = AgentError::RetryBudgetExhausted {
            kind: RetryKind::RateLimit,
            attempts: 3,
        };
        assert!(!err.is_dispatch_error());
        assert_eq!(err.to_string(), "retry budget exhausted after 3 rate-limit retries");
    }

    #[test]
    fn test_service_error_from_chat_error() {
        let err: AgentError = ChatError::EmptyResponse.into();
        assert!(matches!(err, AgentError::Service(ChatError::EmptyResponse)));
    }
}
