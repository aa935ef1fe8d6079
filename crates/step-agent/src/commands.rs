//! Command implementations for step-agent

use anyhow::{Context, Result};
use llm_gateway::{ChatClient, ChatOptions, Config};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::agent::{AgentConfig, AgentLoop, ModelGateway, NoopObserver};
use crate::config::UserConfig;
use crate::persona::Persona;
use crate::progress::TerminalObserver;
use crate::session::Session;
use crate::tools::builtin::create_registry;

// ANSI colors
const GREEN: &str = "\x1b[92m";
const CYAN: &str = "\x1b[96m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Options shared by every command, taken from global flags
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub persona: Option<Persona>,
    pub model: Option<String>,
    /// Explicit path to agent.toml
    pub config: Option<PathBuf>,
}

/// Everything needed to run requests for one persona
pub struct Prepared {
    pub agent: AgentLoop,
    pub persona: Persona,
    pub model: String,
    pub system_prompt: String,
    pub user: UserConfig,
}

impl Prepared {
    /// Start a fresh conversation with this persona's system prompt
    pub fn new_session(&self) -> Session {
        Session::new(self.persona, self.system_prompt.clone())
    }
}

fn load_service_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => match Config::find_config_path() {
            Ok(path) => {
                info!(path = %path.display(), "Using service config");
                Config::load_from(path)
            }
            Err(_) => {
                warn!("agent.toml not found, using default service settings");
                Ok(Config::default_minimal())
            }
        },
    }
}

/// Resolve configuration and build the agent loop
pub fn prepare(opts: &RunOptions) -> Result<Prepared> {
    let config = load_service_config(opts.config.as_ref())?;
    let user = UserConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load user config, using defaults");
        UserConfig::default()
    });

    let persona = opts.persona.or(user.repl.persona).unwrap_or_default();
    let model = opts
        .model
        .clone()
        .or_else(|| user.repl.default_model.clone())
        .unwrap_or_else(|| config.service.model.clone());

    let client = ChatClient::from_config(&config)
        .with_model(model.clone())
        .with_options(ChatOptions::default().with_temperature(persona.temperature()));
    if !client.has_api_key() {
        warn!(
            env = %config.service.api_key_env,
            "No API key set, requests will be sent unauthenticated"
        );
    }

    let registry = create_registry(persona);
    let system_prompt = persona.system_prompt(&registry, user.repl.system_prompt.as_deref());

    let gateway = ModelGateway::new(Arc::new(client))
        .with_retry(config.retry.clone())
        .with_observation_role(config.service.observation_role);
    let agent = AgentLoop::new(gateway, registry, user.tools.to_context())
        .with_config(AgentConfig::new().with_max_model_calls(user.repl.max_model_calls));

    info!(%persona, %model, "Agent ready");

    Ok(Prepared {
        agent,
        persona,
        model,
        system_prompt,
        user,
    })
}

/// One-shot request
pub async fn ask(opts: &RunOptions, prompt: &str, json: bool) -> Result<()> {
    if prompt.trim().is_empty() {
        anyhow::bail!("No prompt provided. Usage: step-agent ask <prompt>");
    }

    let prepared = prepare(opts)?;
    let mut session = prepared.new_session();

    let result = if json {
        prepared.agent.run(&mut session, prompt, &NoopObserver).await
    } else {
        let observer = TerminalObserver::for_stdout();
        let result = prepared.agent.run(&mut session, prompt, &observer).await;
        observer.finish();
        result
    };
    let outcome = result.context("Agent run failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "\n{}{}:{} {}\n",
            GREEN,
            prepared.persona.label(),
            RESET,
            outcome.answer
        );
    }

    Ok(())
}

/// List the tools available to the persona
pub fn list_tools(opts: &RunOptions) -> Result<()> {
    let user = UserConfig::load().unwrap_or_default();
    let persona = opts.persona.or(user.repl.persona).unwrap_or_default();
    let registry = create_registry(persona);

    println!("{}Tools for {}:{}", BOLD, persona.label(), RESET);
    for tool in registry.all_tools() {
        println!("  {}{}{} - {}", CYAN, tool.name(), RESET, tool.description());
        println!("    {}input: {}{}", DIM, tool.input_hint(), RESET);
    }
    Ok(())
}

/// Write a commented default user config
pub fn init_config() -> Result<()> {
    init_config_at(&UserConfig::config_path()?)
}

fn init_config_at(path: &Path) -> Result<()> {
    UserConfig::write_default(path)?;
    println!("{}Created:{} {}", GREEN, RESET, path.display());
    Ok(())
}
