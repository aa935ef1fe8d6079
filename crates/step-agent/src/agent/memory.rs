//! Conversation memory: the append-only log sent to the model on every call

use chrono::{DateTime, Utc};
use llm_gateway::Role;
use serde::Serialize;
use tracing::warn;

use super::step::Observation;

/// Logical role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    /// Carries a serialized tool observation back to the model
    Observation,
}

impl MessageRole {
    /// Map to the role used on the wire
    pub fn to_transport(self, observation_role: Role) -> Role {
        match self {
            MessageRole::System => Role::System,
            MessageRole::User => Role::User,
            MessageRole::Assistant => Role::Assistant,
            MessageRole::Observation => observation_role,
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Observation => write!(f, "observation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn observation(observation: &Observation) -> Self {
        Self::new(MessageRole::Observation, observation.encode())
    }
}

/// Ordered message log seeded with exactly one system message
///
/// Messages are never removed or reordered.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    messages: Vec<Message>,
}

impl ConversationMemory {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::new(MessageRole::System, system_prompt)],
        }
    }

    /// Append one message to the end of the log
    ///
    /// A second system message is refused; the log keeps its single seed.
    pub fn append(&mut self, message: Message) {
        if message.role == MessageRole::System {
            warn!("Ignoring attempt to append a second system message");
            return;
        }
        self.messages.push(message);
    }

    /// The full ordered sequence
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Number of messages with the given role
    pub fn count(&self, role: MessageRole) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }

    /// Total characters held, a rough measure of context size
    pub fn char_count(&self) -> usize {
        self.messages.iter().map(|m| m.content.chars().count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_starts_with_system_message() {
        let memory = ConversationMemory::new("You are an agent");
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.snapshot()[0].role, MessageRole::System);
        assert_eq!(memory.snapshot()[0].content, "You are an agent");
    }

    #[test]
    fn test_append_preserves_order() {
        let mut memory = ConversationMemory::new("sys");
        memory.append(Message::user("first"));
        memory.append(Message::assistant("second"));
        memory.append(Message::observation(&Observation::new("t", "third")));

        let roles: Vec<_> = memory.snapshot().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::Observation
            ]
        );
        assert_eq!(memory.snapshot()[3].role, MessageRole::Observation);
        assert_eq!(memory.count(MessageRole::User), 1);
    }

    #[test]
    fn test_second_system_message_is_refused() {
        let mut memory = ConversationMemory::new("sys");
        memory.append(Message::new(MessageRole::System, "other"));
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.count(MessageRole::System), 1);
        assert_eq!(memory.snapshot()[0].content, "sys");
    }

    #[test]
    fn test_observation_transport_role() {
        assert_eq!(MessageRole::Observation.to_transport(Role::Developer), Role::Developer);
        assert_eq!(MessageRole::Observation.to_transport(Role::User), Role::User);
        assert_eq!(MessageRole::Assistant.to_transport(Role::User), Role::Assistant);
    }

    #[test]
    fn test_char_count() {
        let mut memory = ConversationMemory::new("abc");
        memory.append(Message::user("de"));
        assert_eq!(memory.char_count(), 5);
    }
}
