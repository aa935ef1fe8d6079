//! Interactive REPL
//!
//! One line per request. The session keeps its memory across requests until
//! `/new` or the exit sentinel.

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config as EditorConfig, Editor};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::agent::memory::Message;
use crate::agent::step::Observation;
use crate::agent::MessageRole;
use crate::commands::{prepare, Prepared, RunOptions};
use crate::config::data_dir;
use crate::progress::{shorten, TerminalObserver};
use crate::session::Session;

// ANSI colors
const GREEN: &str = "\x1b[92m";
const BLUE: &str = "\x1b[94m";
const YELLOW: &str = "\x1b[93m";
const CYAN: &str = "\x1b[96m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Persistent readline history
struct InputHistory {
    path: PathBuf,
}

impl InputHistory {
    fn new() -> Result<Self> {
        let dir = data_dir().unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        Ok(Self {
            path: dir.join("history"),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

struct ReplState {
    prepared: Prepared,
    session: Session,
}

/// What the REPL does with one line of input
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Exit,
    Command(&'a str, &'a str),
    Request(&'a str),
}

fn classify<'a>(line: &'a str, exit_command: &str) -> Input<'a> {
    let line = line.trim();
    if line.is_empty() {
        Input::Empty
    } else if line.eq_ignore_ascii_case(exit_command) {
        Input::Exit
    } else if line.starts_with('/') {
        let (cmd, args) = line.split_once(' ').unwrap_or((line, ""));
        Input::Command(cmd, args.trim())
    } else {
        Input::Request(line)
    }
}

/// Run the interactive REPL
pub async fn run(opts: RunOptions) -> Result<()> {
    let prepared = prepare(&opts)?;
    let session = prepared.new_session();
    let mut state = ReplState { prepared, session };

    let history = InputHistory::new()?;
    let editor_config = EditorConfig::builder()
        .max_history_size(state.prepared.user.repl.history_size)
        .context("Invalid history size")?
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(editor_config)?;
    let _ = rl.load_history(history.path());

    print_welcome(&state);
    let exit_command = state.prepared.user.repl.exit_command.clone();

    loop {
        let prompt = format!("{}You:{} ", CYAN, RESET);

        match rl.readline(&prompt) {
            Ok(line) => match classify(&line, &exit_command) {
                Input::Empty => continue,
                Input::Exit => {
                    println!("{}", state.prepared.persona.farewell());
                    break;
                }
                Input::Command(cmd, args) => {
                    let _ = rl.add_history_entry(line.trim());
                    if handle_slash_command(&mut state, cmd, args) {
                        break;
                    }
                }
                Input::Request(request) => {
                    let _ = rl.add_history_entry(request);
                    send_request(&mut state, request).await;
                }
            },
            Err(ReadlineError::Interrupted) => {
                println!("{}^C{}", DIM, RESET);
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", state.prepared.persona.farewell());
                break;
            }
            Err(e) => {
                eprintln!("{}Error:{} {}", YELLOW, RESET, e);
                break;
            }
        }
    }

    if let Err(e) = rl.save_history(history.path()) {
        warn!(error = %e, "Failed to save input history");
    }

    Ok(())
}

async fn send_request(state: &mut ReplState, request: &str) {
    let observer = TerminalObserver::for_stdout();
    let result = state
        .prepared
        .agent
        .run(&mut state.session, request, &observer)
        .await;
    observer.finish();

    match result {
        Ok(outcome) => println!(
            "\n{}{}:{} {}\n",
            GREEN,
            state.prepared.persona.label(),
            RESET,
            outcome.answer
        ),
        // The run ends but the session keeps its memory
        Err(e) => {
            eprintln!("{}Error:{} {}", YELLOW, RESET, e);
            if e.is_dispatch_error() {
                let names = state.prepared.agent.registry().list_names().join(", ");
                eprintln!("{}Available tools: {}{}", DIM, names, RESET);
            }
        }
    }
}

fn print_welcome(state: &ReplState) {
    println!();
    println!(
        "{}{}{} ready {}(model: {}, session {}){}",
        BOLD,
        state.prepared.persona.label(),
        RESET,
        DIM,
        state.prepared.model,
        state.session.short_id(),
        RESET
    );
    println!(
        "{}Type '{}' to quit, {}/help{}{} for commands{}",
        DIM, state.prepared.user.repl.exit_command, CYAN, RESET, DIM, RESET
    );
    println!();
}

/// Handle a slash command. Returns true when the REPL should exit.
fn handle_slash_command(state: &mut ReplState, cmd: &str, _args: &str) -> bool {
    match cmd.to_lowercase().as_str() {
        "/help" | "/h" | "/?" => print_help(),
        "/exit" | "/quit" | "/q" => {
            println!("{}", state.prepared.persona.farewell());
            return true;
        }
        "/new" => {
            state.session = state.prepared.new_session();
            println!(
                "{}Started new session {}{}",
                DIM,
                state.session.short_id(),
                RESET
            );
        }
        "/history" | "/hist" => print_history(&state.session),
        "/tools" => {
            for tool in state.prepared.agent.registry().all_tools() {
                println!("  {}{}{} - {}", CYAN, tool.name(), RESET, tool.description());
            }
        }
        other => {
            println!(
                "{}Unknown command:{} {} (try /help)",
                YELLOW, RESET, other
            );
        }
    }
    false
}

fn print_history(session: &Session) {
    if session.turns() == 0 {
        println!("No messages in this session");
        return;
    }

    println!(
        "{}Session {} started {}{}",
        DIM,
        session.short_id(),
        session.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        RESET
    );
    for message in session.memory.snapshot().iter().skip(1) {
        let (label, color) = match message.role {
            MessageRole::User => ("you", CYAN),
            MessageRole::Assistant => ("model", BLUE),
            MessageRole::Observation => ("observe", DIM),
            MessageRole::System => continue,
        };
        println!(
            "{}{} [{}]{} {}",
            color,
            message.created_at.format("%H:%M:%S"),
            label,
            RESET,
            shorten(&history_text(message), 200)
        );
    }
    println!(
        "{}{} messages, {} characters{}",
        DIM,
        session.memory.len(),
        session.memory.char_count(),
        RESET
    );
}

/// Observations are shown as `tool: output` rather than their wire JSON
fn history_text(message: &Message) -> String {
    if message.role == MessageRole::Observation {
        if let Ok(observation) = Observation::decode(&message.content) {
            return format!("{}: {}", observation.tool, observation.output);
        }
    }
    message.content.clone()
}

fn print_help() {
    println!("{}Commands:{}", BOLD, RESET);
    println!("  {}/help{}             Show this help", CYAN, RESET);
    println!("  {}/new{}              Start a new session", CYAN, RESET);
    println!("  {}/history{}          Show this session's messages", CYAN, RESET);
    println!("  {}/tools{}            List available tools", CYAN, RESET);
    println!("  {}/exit{}             Quit", CYAN, RESET);
    println!();
    println!("{}Tips:{}", BOLD, RESET);
    println!("  - Context carries over between requests in a session");
    println!("  - Ctrl-C clears the line, Ctrl-D quits");
}
