//! Agent framework: the PLAN/TOOL/OUTPUT step loop
//!
//! The model is called with the whole conversation and answers with one JSON
//! step at a time. Tool results go back as OBSERVE messages until the model
//! produces an OUTPUT step.

mod agent_loop;
mod gateway;
pub mod memory;
mod observer;
mod state;
pub mod step;

#[cfg(test)]
pub(crate) mod testing;

pub use agent_loop::AgentLoop;
pub use gateway::ModelGateway;
pub use memory::MessageRole;
pub use observer::{NoopObserver, StepObserver};
pub use state::AgentConfig;
pub use step::StepError;
