//! step-agent: PLAN/TOOL/OUTPUT agent for JSON-speaking language models
//!
//! The model answers each turn with one JSON step; tools run locally and
//! their results are fed back until the model produces a final answer.

mod agent;
mod commands;
mod config;
mod error;
mod persona;
mod progress;
mod repl;
mod session;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::RunOptions;
use persona::Persona;

#[derive(Debug, Parser)]
#[command(name = "step-agent")]
#[command(about = "PLAN/TOOL/OUTPUT agent for JSON-speaking language models", version)]
#[command(propagate_version = true)]
struct Cli {
    /// Assistant persona
    #[arg(short, long, global = true, value_enum)]
    persona: Option<Persona>,

    /// Model to use (overrides config)
    #[arg(short, long, global = true, env = "STEP_AGENT_MODEL")]
    model: Option<String>,

    /// Path to agent.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start interactive chat REPL
    Chat,

    /// One-shot request (non-interactive)
    Ask {
        /// The request to send
        prompt: Vec<String>,

        /// Print the run outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the persona's tools
    Tools,

    /// Write a default user config file
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Logs go to stderr so they never mix with answers
    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let opts = RunOptions {
        persona: cli.persona,
        model: cli.model,
        config: cli.config,
    };

    match cli.command {
        Some(Commands::Ask { prompt, json }) => {
            let prompt_text = prompt.join(" ");
            commands::ask(&opts, &prompt_text, json).await
        }
        Some(Commands::Tools) => commands::list_tools(&opts),
        Some(Commands::InitConfig) => commands::init_config(),
        // Default to chat REPL when no command specified
        Some(Commands::Chat) | None => repl::run(opts).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_globals_after_subcommand() {
        let cli = Cli::try_parse_from([
            "step-agent", "ask", "--json", "--persona", "weather", "Weather", "in", "Paris",
        ])
        .unwrap();
        assert_eq!(cli.persona, Some(Persona::Weather));
        match cli.command {
            Some(Commands::Ask { prompt, json }) => {
                assert!(json);
                assert_eq!(prompt.join(" "), "Weather in Paris");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_defaults_to_chat() {
        let cli = Cli::try_parse_from(["step-agent", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.command.is_none());
        assert!(cli.persona.is_none());
    }
}
