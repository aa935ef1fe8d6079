//! One conversation: its identity and its memory

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::agent::memory::{ConversationMemory, MessageRole};
use crate::persona::Persona;

/// A conversation owned by exactly one front end
///
/// The agent loop borrows it mutably for the length of a request, so
/// context carries over between requests of the same session.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub persona: Persona,
    pub memory: ConversationMemory,
}

impl Session {
    pub fn new(persona: Persona, system_prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            persona,
            memory: ConversationMemory::new(system_prompt),
        }
    }

    /// Number of user requests made so far
    pub fn turns(&self) -> usize {
        self.memory.count(MessageRole::User)
    }

    /// Short id for display
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}
