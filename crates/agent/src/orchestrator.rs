//! The single-hop agent loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use hopper_core::engine::{Decision, Prompt, ReasoningEngine};
use hopper_core::error::{AgentError, EngineError, ExecutionFailure, ToolError};
use hopper_core::message::Message;
use hopper_core::session::ConversationSession;
use hopper_core::tool::{ToolCall, ToolOutput, ToolRegistry};
use hopper_core::trace::{TraceRecorder, TurnOutcome, TurnTrace};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::context::{self, ContextLimits, DEFAULT_INSTRUCTIONS};
use crate::state::TurnState;

/// Name and description of a registered tool, as shown to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

/// Runs turns against one shared conversation.
///
/// Each turn makes one decision call and, when a tool is used, one
/// composition call. Session locks are held only while copying the history
/// or appending to it, never across engine or tool I/O.
pub struct Orchestrator {
    engine: Arc<dyn ReasoningEngine>,
    tools: Arc<ToolRegistry>,
    session: Arc<ConversationSession>,
    instructions: String,
    limits: ContextLimits,
    engine_timeout: Duration,
    tool_timeout: Duration,
    engine_retries: u32,
}

impl Orchestrator {
    pub fn new(
        engine: Arc<dyn ReasoningEngine>,
        tools: Arc<ToolRegistry>,
        session: Arc<ConversationSession>,
    ) -> Self {
        Self {
            engine,
            tools,
            session,
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            limits: ContextLimits::default(),
            engine_timeout: Duration::from_secs(60),
            tool_timeout: Duration::from_secs(15),
            engine_retries: 1,
        }
    }

    /// Replace the fixed instructions.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Most recent messages sent to the engine.
    pub fn with_history_messages(mut self, max: usize) -> Self {
        self.limits.history_messages = max;
        self
    }

    /// Estimated-token ceiling for the history part of the prompt.
    pub fn with_context_token_budget(mut self, tokens: usize) -> Self {
        self.limits.token_budget = tokens;
        self
    }

    pub fn with_engine_timeout(mut self, timeout: Duration) -> Self {
        self.engine_timeout = timeout;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Extra attempts after a transient engine failure.
    pub fn with_engine_retries(mut self, retries: u32) -> Self {
        self.engine_retries = retries;
        self
    }

    /// Build from the `[agent]` config section.
    pub fn from_config(
        engine: Arc<dyn ReasoningEngine>,
        tools: Arc<ToolRegistry>,
        session: Arc<ConversationSession>,
        config: &hopper_config::AgentConfig,
    ) -> Self {
        Self::new(engine, tools, session)
            .with_history_messages(config.history_messages)
            .with_context_token_budget(config.context_token_budget)
            .with_engine_timeout(Duration::from_secs(config.engine_timeout_secs))
            .with_tool_timeout(Duration::from_secs(config.tool_timeout_secs))
            .with_engine_retries(config.engine_retries)
    }

    pub fn session(&self) -> &Arc<ConversationSession> {
        &self.session
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Answer one user message.
    ///
    /// The user message is recorded as soon as the turn starts. The agent
    /// message is recorded only if the turn finishes and the history was not
    /// cleared in the meantime.
    pub async fn submit_message(&self, text: &str) -> Result<TurnTrace, AgentError> {
        let started = Instant::now();
        let mut state = TurnState::receive(text)?;
        let mut epoch = 0;

        let outcome = loop {
            debug!(phase = ?state.phase(), "Turn transition");

            state = match state {
                TurnState::Received { text } => {
                    let snapshot = self.session.snapshot_and_append(Message::user(&text)).await;
                    epoch = snapshot.epoch;

                    let prompt = context::reasoning_prompt(
                        &self.instructions,
                        self.tools.list(),
                        &snapshot.messages,
                        &text,
                        self.limits,
                    );
                    debug!(
                        stored = snapshot.messages.len(),
                        sent = prompt.history.len(),
                        history_tokens = context::token::estimate_messages_tokens(&prompt.history),
                        tool_tokens = context::token::estimate_tools_tokens(&prompt.tools),
                        "Prompt assembled"
                    );
                    TurnState::reasoning(prompt)
                }

                TurnState::Reasoning { prompt } => {
                    let decision = self.consult(&prompt).await?;
                    TurnState::decided(prompt, decision)
                }

                TurnState::DirectAnswer { text } => TurnState::answered(text),

                TurnState::ToolSelected {
                    prompt,
                    call,
                    rationale,
                } => {
                    let validation = self.tools.validate(&call).map(|_| ());
                    if let Err(e) = &validation {
                        warn!(tool = %call.name, error = %e, "Tool selection rejected");
                    }
                    TurnState::validated(prompt, call, rationale, validation)
                }

                TurnState::ToolExecuting {
                    prompt,
                    call,
                    rationale,
                } => {
                    let result = self.run_tool(&call).await?;
                    TurnState::executed(prompt, call, rationale, result)
                }

                TurnState::ToolResultIntegration {
                    prompt,
                    observation,
                    invocation,
                } => {
                    let integration = context::integration_prompt(&prompt, observation.clone());
                    let decision = self.consult(&integration).await?;
                    TurnState::integrated(observation, invocation, decision)
                }

                TurnState::Finalized(outcome) => break outcome,
            };
        };

        self.record_answer(epoch, &outcome).await;
        let trace = TraceRecorder::record(&outcome);

        info!(
            tool = trace.tool_used.as_deref().unwrap_or("none"),
            duration_ms = started.elapsed().as_millis() as u64,
            "Turn completed"
        );

        Ok(trace)
    }

    /// Drop the whole history. Idempotent.
    pub async fn clear_history(&self) {
        self.session.clear().await;
        info!("Conversation history cleared");
    }

    /// Registered tools, ordered by name. Independent of the conversation.
    pub fn list_tools(&self) -> Vec<ToolSummary> {
        self.tools
            .list()
            .into_iter()
            .map(|def| ToolSummary {
                name: def.name,
                description: def.description,
            })
            .collect()
    }

    /// One engine decision under the timeout, retried once on transient errors.
    async fn consult(&self, prompt: &Prompt) -> Result<Decision, AgentError> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let start = Instant::now();

            let result = match tokio::time::timeout(self.engine_timeout, self.engine.decide(prompt)).await {
                Ok(result) => result,
                Err(_) => Err(EngineError::Timeout(format!(
                    "no decision within {}s",
                    self.engine_timeout.as_secs()
                ))),
            };

            match result {
                Ok(decision) => {
                    debug!(
                        engine = %self.engine.name(),
                        attempt,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Engine decided"
                    );
                    return Ok(decision);
                }
                Err(e) if e.is_transient() && attempt <= self.engine_retries => {
                    let backoff = self.retry_backoff(&e);
                    warn!(
                        engine = %self.engine.name(),
                        attempt,
                        error = %e,
                        backoff_ms = backoff.as_millis() as u64,
                        "Transient engine failure, retrying"
                    );
                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                }
                Err(e) => {
                    warn!(engine = %self.engine.name(), attempt, error = %e, "Engine call failed");
                    return Err(e.into());
                }
            }
        }
    }

    /// Wait before retrying. Rate limits honour `retry_after`, capped at the
    /// engine timeout; other transient failures retry at once.
    fn retry_backoff(&self, error: &EngineError) -> Duration {
        match error {
            EngineError::RateLimited { retry_after_secs } => {
                Duration::from_secs(*retry_after_secs).min(self.engine_timeout)
            }
            _ => Duration::ZERO,
        }
    }

    /// Execute a validated call in its own task.
    ///
    /// The outer `Err` is a timeout, which fails the turn. The task is not
    /// aborted on timeout or cancellation; its result is discarded.
    async fn run_tool(&self, call: &ToolCall) -> Result<Result<ToolOutput, ToolError>, AgentError> {
        let start = Instant::now();
        let tools = Arc::clone(&self.tools);
        let task_call = call.clone();
        let handle = tokio::spawn(async move { tools.execute(&task_call).await });

        let result = match tokio::time::timeout(self.tool_timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(ToolError::execution(
                &call.name,
                ExecutionFailure::Failed(format!("tool task failed: {join_error}")),
            )),
            Err(_) => {
                let error = ToolError::Timeout {
                    tool_name: call.name.clone(),
                    timeout_secs: self.tool_timeout.as_secs(),
                };
                warn!(tool = %call.name, error = %error, "Tool timed out");
                return Err(AgentError::Timeout(error.to_string()));
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => info!(tool = %call.name, duration_ms, "Tool executed"),
            Err(e) => warn!(tool = %call.name, duration_ms, error = %e, "Tool execution failed"),
        }

        Ok(result)
    }

    async fn record_answer(&self, epoch: u64, outcome: &TurnOutcome) {
        let mut message = Message::agent(&outcome.response).with_thinking(outcome.thinking.clone());
        if let Some(invocation) = &outcome.invocation {
            message = message.with_tool(&invocation.tool_name, invocation.output.clone());
        }

        if let Err(e) = self.session.append_if_current(epoch, message).await {
            warn!(error = %e, "History cleared mid-turn; answer not recorded");
        }
    }
}
