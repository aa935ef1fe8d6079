//! User configuration for step-agent
//!
//! Configuration file: ~/.config/step-agent/config.toml (or platform equivalent)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::persona::Persona;
use crate::tools::ToolContext;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub repl: ReplConfig,

    /// Built-in tool settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// REPL-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplConfig {
    /// Model override (uses agent.toml model if not set)
    #[serde(default)]
    pub default_model: Option<String>,

    #[serde(default)]
    pub persona: Option<Persona>,

    /// Replaces the persona's introduction in the system prompt
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Input line that ends the session, compared case-insensitively
    #[serde(default = "default_exit_command")]
    pub exit_command: String,

    /// Maximum history entries to keep
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Ceiling on model calls per request (unbounded if not set)
    #[serde(default)]
    pub max_model_calls: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Directory tools run in (current directory if not set)
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    #[serde(default = "default_max_output_len")]
    pub max_output_len: usize,

    /// Timeout for weather lookups, in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_weather_url")]
    pub weather_url: String,
}

fn default_exit_command() -> String {
    "exit".to_string()
}

fn default_history_size() -> usize {
    1000
}

fn default_command_timeout_secs() -> u64 {
    120
}

fn default_max_output_len() -> usize {
    50000
}

fn default_http_timeout_secs() -> u64 {
    5
}

fn default_weather_url() -> String {
    "https://wttr.in".to_string()
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            default_model: None,
            persona: None,
            system_prompt: None,
            exit_command: default_exit_command(),
            history_size: default_history_size(),
            max_model_calls: None,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            working_dir: None,
            command_timeout_secs: default_command_timeout_secs(),
            max_output_len: default_max_output_len(),
            http_timeout_secs: default_http_timeout_secs(),
            weather_url: default_weather_url(),
        }
    }
}

impl ToolsConfig {
    /// Build the context handed to every tool call
    pub fn to_context(&self) -> ToolContext {
        let working_dir = self
            .working_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        ToolContext::new(working_dir)
            .with_command_timeout(self.command_timeout_secs)
            .with_max_output_len(self.max_output_len)
            .with_http_timeout(self.http_timeout_secs)
            .with_weather_url(self.weather_url.clone())
    }
}

const DEFAULT_CONFIG: &str = r#"# step-agent configuration
# Location: ~/.config/step-agent/config.toml

[repl]
# Model override (uses agent.toml service model if not set)
# default_model = "Llama-3.3-Swallow-70B-Instruct-v0.4"

# Assistant persona: "coding" or "weather"
# persona = "coding"

# Replace the persona's introduction in the system prompt
# system_prompt = "You are a careful senior engineer."

# Typing this line ends the session
exit_command = "exit"

# Maximum history entries to keep
history_size = 1000

# Stop a request after this many model calls (unbounded if not set)
# max_model_calls = 30

[tools]
# Directory tools run in (defaults to the current directory)
# working_dir = "/path/to/project"

# Timeout for run_command, in seconds
command_timeout_secs = 120

# Tool output longer than this is truncated
max_output_len = 50000

# Timeout for weather lookups, in seconds
http_timeout_secs = 5

# Weather service base URL
weather_url = "https://wttr.in"
"#;

impl UserConfig {
    /// Load user configuration from default location
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load from a path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("step-agent").join("config.toml"))
    }

    /// Write the commented default configuration, refusing to overwrite
    pub fn write_default(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists: {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        fs::write(path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}

/// Directory for persistent data such as REPL history
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("step-agent"))
}
