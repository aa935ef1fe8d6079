//! Agent loop implementation

use tracing::{debug, info, instrument, warn};

use super::gateway::ModelGateway;
use super::memory::{ConversationMemory, Message};
use super::observer::StepObserver;
use super::state::{AgentConfig, LoopState, RunOutcome};
use super::step::{Observation, Step};
use crate::error::{AgentError, RetryKind};
use crate::session::Session;
use crate::tools::registry::ToolRegistry;
use crate::tools::ToolContext;

/// What the loop does after a step is dispatched
enum Dispatch {
    Continue,
    Finished(String),
}

/// Drives one request through PLAN/TOOL/OUTPUT steps until an answer
pub struct AgentLoop {
    gateway: ModelGateway,
    registry: ToolRegistry,
    tool_ctx: ToolContext,
    config: AgentConfig,
}

impl AgentLoop {
    pub fn new(gateway: ModelGateway, registry: ToolRegistry, tool_ctx: ToolContext) -> Self {
        Self {
            gateway,
            registry,
            tool_ctx,
            config: AgentConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one user request against the session's memory
    ///
    /// Every model reply is kept in memory, including ones that fail to
    /// decode. A budget running out ends this run; the session stays usable.
    #[instrument(skip_all, fields(session = %session.id, request_len = request.len()))]
    pub async fn run(
        &self,
        session: &mut Session,
        request: &str,
        observer: &dyn StepObserver,
    ) -> Result<RunOutcome, AgentError> {
        info!(persona = %session.persona, "Starting agent run");

        let memory = &mut session.memory;
        memory.append(Message::user(request));

        let mut outcome = RunOutcome::default();
        let mut parse_budget = self.gateway.retry().parse_budget();
        let mut state = LoopState::AwaitingModel;

        loop {
            debug!(%state, messages = memory.len(), "Loop transition");

            if let Some(max) = self.config.max_model_calls {
                if outcome.model_calls >= max {
                    warn!(max, "Model call limit reached");
                    return Err(AgentError::RetryBudgetExhausted {
                        kind: RetryKind::ModelCalls,
                        attempts: u32::try_from(outcome.model_calls).unwrap_or(u32::MAX),
                    });
                }
            }

            outcome.model_calls += 1;
            observer.on_model_call(outcome.model_calls);
            let raw = self.gateway.complete(memory, observer).await?;
            memory.append(Message::assistant(raw.clone()));

            state = LoopState::Decoding;
            debug!(%state, "Loop transition");

            let step = match Step::decode(&raw) {
                Ok(step) => step,
                Err(e) => {
                    outcome.malformed_replies += 1;
                    warn!(error = %e, raw = %raw, "Malformed reply from model, retrying");
                    observer.on_malformed_reply(&raw, &e);
                    if !parse_budget.try_consume() {
                        return Err(AgentError::RetryBudgetExhausted {
                            kind: RetryKind::MalformedReply,
                            attempts: parse_budget.used(),
                        });
                    }
                    state = LoopState::AwaitingModel;
                    continue;
                }
            };
            parse_budget.reset();

            state = match step {
                Step::Plan { .. } => LoopState::Planning,
                Step::Tool { .. } => LoopState::Acting,
                Step::Output { .. } => LoopState::Done,
            };
            debug!(%state, kind = %step.kind(), "Loop transition");

            match step {
                Step::Plan { .. } => outcome.plans += 1,
                Step::Tool { .. } => outcome.tool_calls += 1,
                Step::Output { .. } => {}
            }

            match self.dispatch(step, memory, observer).await? {
                Dispatch::Continue => state = LoopState::AwaitingModel,
                Dispatch::Finished(answer) => {
                    info!(
                        model_calls = outcome.model_calls,
                        tool_calls = outcome.tool_calls,
                        malformed = outcome.malformed_replies,
                        "Agent run finished"
                    );
                    outcome.answer = answer;
                    return Ok(outcome);
                }
            }
        }
    }

    async fn dispatch(
        &self,
        step: Step,
        memory: &mut ConversationMemory,
        observer: &dyn StepObserver,
    ) -> Result<Dispatch, AgentError> {
        match step {
            Step::Plan { content } => {
                observer.on_plan(&content);
                Ok(Dispatch::Continue)
            }
            Step::Tool { tool, input } => {
                observer.on_tool_call(&tool, &input);
                let result = self.registry.invoke(&tool, &input, &self.tool_ctx).await?;
                observer.on_tool_result(&tool, &result);

                let observation = Observation::new(tool, result.observation_text());
                memory.append(Message::observation(&observation));
                Ok(Dispatch::Continue)
            }
            Step::Output { content } => {
                observer.on_answer(&content);
                Ok(Dispatch::Finished(content))
            }
        }
    }
}
