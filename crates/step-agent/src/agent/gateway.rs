//! Model gateway: one raw assistant reply per call, rate limits absorbed

use std::sync::Arc;

use llm_gateway::{ChatBackend, ChatMessage, RetryConfig, Role};
use tracing::{debug, instrument, warn};

use super::memory::ConversationMemory;
use super::observer::StepObserver;
use crate::error::{AgentError, RetryKind};

/// Sends the conversation to the model service
///
/// Rate-limit rejections are retried after a fixed wait, up to the configured
/// budget. Every other service failure is returned as-is.
pub struct ModelGateway {
    backend: Arc<dyn ChatBackend>,
    retry: RetryConfig,
    observation_role: Role,
}

impl ModelGateway {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            retry: RetryConfig::default(),
            observation_role: Role::Developer,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_observation_role(mut self, role: Role) -> Self {
        self.observation_role = role;
        self
    }

    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Send the full memory snapshot and return the raw reply text
    #[instrument(skip_all, fields(messages = memory.len()))]
    pub async fn complete(
        &self,
        memory: &ConversationMemory,
        observer: &dyn StepObserver,
    ) -> Result<String, AgentError> {
        let messages: Vec<ChatMessage> = memory
            .snapshot()
            .iter()
            .map(|m| ChatMessage::new(m.role.to_transport(self.observation_role), m.content.clone()))
            .collect();
        let mut budget = self.retry.rate_limit_budget();

        loop {
            match self.backend.chat(&messages).await {
                Ok(reply) => {
                    debug!(reply_len = reply.len(), retries = budget.used(), "Model replied");
                    return Ok(reply);
                }
                Err(e) if e.is_rate_limit() => {
                    if !budget.try_consume() {
                        return Err(AgentError::RetryBudgetExhausted {
                            kind: RetryKind::RateLimit,
                            attempts: budget.used(),
                        });
                    }
                    let wait = self.retry.backoff();
                    warn!(
                        attempt = budget.used(),
                        wait_secs = wait.as_secs(),
                        "Rate limited by model service, backing off"
                    );
                    observer.on_rate_limited(budget.used(), wait);
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(AgentError::Service(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::observer::NoopObserver;
    use crate::agent::testing::ScriptedBackend;
    use llm_gateway::ChatError;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    #[derive(Default)]
    struct WaitRecorder {
        waits: Mutex<Vec<(u32, Duration)>>,
    }

    impl StepObserver for WaitRecorder {
        fn on_rate_limited(&self, attempt: u32, wait: Duration) {
            self.waits.lock().unwrap().push((attempt, wait));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_twice_waits_twice() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(ChatError::RateLimited),
            Err(ChatError::RateLimited),
            Ok(r#"{"step":"OUTPUT","content":"hi"}"#.to_string()),
        ]));
        let gateway = ModelGateway::new(backend.clone());
        let memory = ConversationMemory::new("system");
        let observer = WaitRecorder::default();

        let start = Instant::now();
        let reply = gateway.complete(&memory, &observer).await.unwrap();

        assert_eq!(reply, r#"{"step":"OUTPUT","content":"hi"}"#);
        assert_eq!(backend.calls(), 3);
        assert_eq!(
            *observer.waits.lock().unwrap(),
            vec![(1, Duration::from_secs(5)), (2, Duration::from_secs(5))]
        );
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert!(start.elapsed() < Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_budget_exhausted() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(ChatError::RateLimited),
            Err(ChatError::RateLimited),
            Err(ChatError::RateLimited),
        ]));
        let gateway = ModelGateway::new(backend.clone())
            .with_retry(RetryConfig::default().with_max_rate_limit_retries(2));
        let memory = ConversationMemory::new("system");

        let err = gateway.complete(&memory, &NoopObserver).await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::RetryBudgetExhausted {
                kind: RetryKind::RateLimit,
                attempts: 2
            }
        ));
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn test_service_error_is_fatal() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(ChatError::Service {
                status: 500,
                body: "boom".to_string(),
            }),
            Ok("unused".to_string()),
        ]));
        let gateway = ModelGateway::new(backend.clone());
        let memory = ConversationMemory::new("system");

        let err = gateway.complete(&memory, &NoopObserver).await.unwrap_err();
        assert!(matches!(err, AgentError::Service(ChatError::Service { status: 500, .. })));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_observations_use_configured_role() {
        use crate::agent::memory::Message;
        use crate::agent::step::Observation;

        let backend = Arc::new(ScriptedBackend::replying(["ok"]));
        let gateway = ModelGateway::new(backend.clone()).with_observation_role(Role::User);
        let mut memory = ConversationMemory::new("system");
        memory.append(Message::observation(&Observation::new("get_weather", "Sunny")));

        gateway.complete(&memory, &NoopObserver).await.unwrap();

        let sent = &backend.requests()[0];
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(sent[1].role, Role::User);
        assert_eq!(sent[1].content, memory.snapshot()[1].content);
    }
}
