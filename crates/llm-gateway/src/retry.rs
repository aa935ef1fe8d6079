//! Retry policy for transient failures around the model call

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry configuration, the `[retry]` table of agent.toml
///
/// A cap of `0` disables the limit and retries forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Fixed wait before retrying a rate-limited request
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
    /// Maximum rate-limit retries for a single model request
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: u32,
    /// Maximum consecutive malformed replies tolerated in one run
    #[serde(default = "default_max_parse_retries")]
    pub max_parse_retries: u32,
}

fn default_backoff_secs() -> u64 {
    5
}

fn default_max_rate_limit_retries() -> u32 {
    12
}

fn default_max_parse_retries() -> u32 {
    5
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff_secs: default_backoff_secs(),
            max_rate_limit_retries: default_max_rate_limit_retries(),
            max_parse_retries: default_max_parse_retries(),
        }
    }
}

impl RetryConfig {
    /// Retry forever on both rate limits and malformed replies
    pub fn unbounded() -> Self {
        Self {
            max_rate_limit_retries: 0,
            max_parse_retries: 0,
            ..Default::default()
        }
    }

    pub fn with_backoff_secs(mut self, secs: u64) -> Self {
        self.backoff_secs = secs;
        self
    }

    pub fn with_max_rate_limit_retries(mut self, max: u32) -> Self {
        self.max_rate_limit_retries = max;
        self
    }

    pub fn with_max_parse_retries(mut self, max: u32) -> Self {
        self.max_parse_retries = max;
        self
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    /// Budget for rate-limit retries of one request
    pub fn rate_limit_budget(&self) -> RetryBudget {
        RetryBudget::new(cap(self.max_rate_limit_retries))
    }

    /// Budget for malformed replies within one run
    pub fn parse_budget(&self) -> RetryBudget {
        RetryBudget::new(cap(self.max_parse_retries))
    }
}

fn cap(max: u32) -> Option<u32> {
    (max > 0).then_some(max)
}

/// Counts retries against an optional ceiling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryBudget {
    cap: Option<u32>,
    used: u32,
}

impl RetryBudget {
    pub fn new(cap: Option<u32>) -> Self {
        Self { cap, used: 0 }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// Take one retry from the budget. Returns false once the cap is reached.
    pub fn try_consume(&mut self) -> bool {
        match self.cap {
            Some(cap) if self.used >= cap => false,
            _ => {
                self.used += 1;
                true
            }
        }
    }

    /// Retries consumed so far
    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn cap(&self) -> Option<u32> {
        self.cap
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }
}
