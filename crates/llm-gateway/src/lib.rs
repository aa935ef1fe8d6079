//! llm-gateway: Shared library for talking to the model service
//!
//! Provides:
//! - Configuration loading (agent.toml)
//! - Chat-completions client for OpenAI-compatible services
//! - Retry policy configuration

pub mod chat;
pub mod config;
pub mod retry;

pub use chat::{ChatBackend, ChatClient, ChatError, ChatMessage, ChatOptions, Role};
pub use config::{Config, ServiceConfig};
pub use retry::{RetryBudget, RetryConfig};
