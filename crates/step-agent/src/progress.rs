//! Terminal feedback: a spinner while the model thinks, colored step lines
//!
//! Provides visual feedback during long-running operations.

use std::io::{stdout, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::interval;

use crate::agent::{StepError, StepObserver};
use crate::tools::ToolResult;

// ANSI escape codes
const CLEAR_LINE: &str = "\x1b[2K\r";
const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";
const CYAN: &str = "\x1b[96m";
const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const BLUE: &str = "\x1b[94m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Tool results longer than this are shortened on screen
const DISPLAY_LIMIT: usize = 600;

/// Spinner animation frames
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Alternative ASCII spinner for terminals that don't support Unicode
const ASCII_SPINNER: &[&str] = &["|", "/", "-", "\\"];

/// A terminal spinner for showing progress
pub struct Spinner {
    message: String,
    is_running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
    use_unicode: bool,
}

impl Spinner {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_running: Arc::new(AtomicBool::new(false)),
            handle: None,
            use_unicode: supports_unicode(),
        }
    }

    /// Start the spinner animation. Must be called inside a tokio runtime.
    pub fn start(&mut self) {
        if self.is_running.load(Ordering::SeqCst) {
            return;
        }

        self.is_running.store(true, Ordering::SeqCst);

        let is_running = self.is_running.clone();
        let message = self.message.clone();
        let frames = if self.use_unicode {
            SPINNER_FRAMES
        } else {
            ASCII_SPINNER
        };

        self.handle = Some(tokio::spawn(async move {
            let mut idx = 0;
            let mut tick = interval(Duration::from_millis(80));

            print!("{}", HIDE_CURSOR);
            let _ = stdout().flush();

            while is_running.load(Ordering::SeqCst) {
                print!("{}{}{} {}{}", CLEAR_LINE, CYAN, frames[idx], message, RESET);
                let _ = stdout().flush();
                idx = (idx + 1) % frames.len();
                tick.tick().await;
            }
        }));
    }

    /// Stop the spinner and clear its line
    pub fn stop(&mut self) {
        let was_running = self.is_running.swap(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        if was_running {
            print!("{}{}", CLEAR_LINE, SHOW_CURSOR);
            let _ = stdout().flush();
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Prints loop progress to the terminal
pub struct TerminalObserver {
    spinner: Mutex<Spinner>,
    use_unicode: bool,
    show_spinner: bool,
}

impl TerminalObserver {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(Spinner::new("Thinking...")),
            use_unicode: supports_unicode(),
            show_spinner: true,
        }
    }

    /// Disable the spinner, e.g. when stdout is not a terminal
    pub fn without_spinner(mut self) -> Self {
        self.show_spinner = false;
        self
    }

    /// Spinner only when stdout is a terminal
    pub fn for_stdout() -> Self {
        let observer = Self::new();
        if stdout().is_terminal() {
            observer
        } else {
            observer.without_spinner()
        }
    }

    /// Stop any running spinner; call once the run has ended
    pub fn finish(&self) {
        if let Ok(mut spinner) = self.spinner.lock() {
            spinner.stop();
        }
    }

    fn icon(&self, unicode: &'static str, ascii: &'static str) -> &'static str {
        if self.use_unicode {
            unicode
        } else {
            ascii
        }
    }
}

impl Default for TerminalObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl StepObserver for TerminalObserver {
    fn on_model_call(&self, _call: usize) {
        if !self.show_spinner {
            return;
        }
        if let Ok(mut spinner) = self.spinner.lock() {
            spinner.start();
        }
    }

    fn on_plan(&self, content: &str) {
        self.finish();
        println!("{}[Plan]{} {}", BLUE, RESET, content);
    }

    fn on_tool_call(&self, tool: &str, input: &str) {
        self.finish();
        println!(
            "{}[Tool]{} {}({}{}{})",
            YELLOW,
            RESET,
            tool,
            DIM,
            shorten(input, 120),
            RESET
        );
    }

    fn on_tool_result(&self, _tool: &str, result: &ToolResult) {
        let text = result.observation_text();
        let (mark, color) = if result.success {
            (self.icon("✓", "+"), GREEN)
        } else {
            (self.icon("✗", "x"), YELLOW)
        };
        println!("{}{}{} {}", color, mark, RESET, shorten(&text, DISPLAY_LIMIT));
    }

    fn on_malformed_reply(&self, _raw: &str, error: &StepError) {
        self.finish();
        println!(
            "{}{} Invalid reply from model ({}), retrying...{}",
            YELLOW,
            self.icon("⚠", "!"),
            error,
            RESET
        );
    }

    fn on_rate_limited(&self, attempt: u32, wait: Duration) {
        self.finish();
        println!(
            "{}{} Rate limit hit, waiting {}s (retry {}){}",
            DIM,
            self.icon("⏳", "~"),
            wait.as_secs(),
            attempt,
            RESET
        );
    }

    fn on_answer(&self, _content: &str) {
        self.finish();
    }
}

/// Cut text to at most `max` characters, marking the cut
pub fn shorten(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Check if the terminal likely supports Unicode
fn supports_unicode() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term.contains("xterm") || term.contains("256color") || term.contains("kitty") {
            return true;
        }
    }

    for var in &["LC_ALL", "LC_CTYPE", "LANG"] {
        if let Ok(val) = std::env::var(var) {
            if val.to_lowercase().contains("utf") {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("short", 600), "short");
        assert_eq!(shorten("abcdef", 3), "abc...");
        assert_eq!(shorten("héllo", 2), "hé...");
    }

    #[tokio::test]
    async fn test_spinner_start_stop() {
        let mut spinner = Spinner::new("Testing");
        spinner.start();
        assert!(spinner.is_running());
        tokio::time::sleep(Duration::from_millis(50)).await;
        spinner.stop();
        assert!(!spinner.is_running());
    }

    #[tokio::test]
    async fn test_observer_stops_spinner_on_answer() {
        let observer = TerminalObserver::new();
        observer.on_model_call(1);
        assert!(observer.spinner.lock().unwrap().is_running());
        observer.on_answer("done");
        assert!(!observer.spinner.lock().unwrap().is_running());
    }
}
