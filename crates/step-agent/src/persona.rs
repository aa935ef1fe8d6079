//! Assistant personas: prompt, tool set and sampling settings

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::tools::registry::ToolRegistry;

/// Which assistant the session runs as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    /// Answers weather questions with a live lookup
    Weather,
    /// Creates files, writes code and runs commands
    #[default]
    Coding,
}

impl Persona {
    pub fn label(&self) -> &'static str {
        match self {
            Persona::Weather => "Weather Agent",
            Persona::Coding => "Coding Agent",
        }
    }

    pub fn temperature(&self) -> f32 {
        match self {
            Persona::Weather => 0.3,
            Persona::Coding => 0.2,
        }
    }

    pub fn farewell(&self) -> &'static str {
        "Bye!"
    }

    fn preamble(&self) -> &'static str {
        match self {
            Persona::Weather => "You are an AI Weather Agent. Answer questions about current weather conditions using the weather tool.",
            Persona::Coding => "You are an autonomous CLI Coding Agent. Help the user by creating files, writing code and executing commands.",
        }
    }

    fn rules(&self) -> &'static [&'static str] {
        match self {
            Persona::Weather => &[],
            Persona::Coding => &[
                "Never use shell tricks like echo/touch/cat to create files",
                "Use the write_file tool to create files",
            ],
        }
    }

    /// Build the system prompt for this persona
    ///
    /// `preamble` replaces the persona's own introduction when set.
    pub fn system_prompt(&self, registry: &ToolRegistry, preamble: Option<&str>) -> String {
        let mut prompt = String::new();
        prompt.push_str(preamble.unwrap_or(self.preamble()).trim());
        prompt.push_str("\n\nFollow PLAN -> TOOL -> OUTPUT steps.\n\nRules:\n");
        prompt.push_str("- Always return ONLY one valid JSON object, no extra text\n");
        prompt.push_str("- One step at a time\n");
        prompt.push_str("- After a TOOL step, wait for the OBSERVE message with its output\n");
        for rule in self.rules() {
            prompt.push_str(&format!("- {}\n", rule));
        }

        prompt.push_str(
            "\nJSON format:\n{\n \"step\": \"PLAN\" | \"TOOL\" | \"OUTPUT\",\n \"content\": \"string\",\n \"tool\": \"string\",\n \"input\": \"string\"\n}\n",
        );

        prompt.push_str("\nAvailable tools:\n");
        for tool in registry.all_tools() {
            prompt.push_str(&format!(
                "\n{}: {}\n  input -> {}\n",
                tool.name(),
                tool.description(),
                tool.input_hint()
            ));
        }

        prompt
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Persona::Weather => write!(f, "weather"),
            Persona::Coding => write!(f, "coding"),
        }
    }
}
