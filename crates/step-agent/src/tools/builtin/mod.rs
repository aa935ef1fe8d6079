//! Built-in tools for the two personas

mod read_file;
mod run_command;
mod weather;
mod write_file;

pub use read_file::ReadFileTool;
pub use run_command::RunCommandTool;
pub use weather::WeatherTool;
pub use write_file::WriteFileTool;

use super::registry::ToolRegistry;
use crate::persona::Persona;

/// Registry for the weather assistant
pub fn create_weather_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(WeatherTool);
    registry
}

/// Registry for the coding assistant
pub fn create_coding_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(ReadFileTool);

    // Write/execute
    registry.register(WriteFileTool);
    registry.register(RunCommandTool);

    registry
}

pub fn create_registry(persona: Persona) -> ToolRegistry {
    match persona {
        Persona::Weather => create_weather_registry(),
        Persona::Coding => create_coding_registry(),
    }
}
