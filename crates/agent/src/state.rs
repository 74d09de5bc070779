//! The per-turn state machine.
//!
//! ```text
//! Received → Reasoning → DirectAnswer ──────────────────────────────┐
//!                      └→ ToolSelected → ToolExecuting ─┐            │
//!                                    └──────────────────┴→ ToolResultIntegration → Finalized
//! ```
//!
//! Transitions are pure: each takes the current state's data plus the
//! result of the I/O the orchestrator just performed and returns the next
//! state. Only the orchestrator talks to the engine, the tools, or the
//! session.

use chrono::Utc;
use hopper_core::engine::{Decision, Observation, Prompt};
use hopper_core::error::{AgentError, ToolError};
use hopper_core::tool::{ToolCall, ToolOutput};
use hopper_core::trace::{ToolInvocationRecord, TurnOutcome};

/// Coarse phase tag, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Received,
    Reasoning,
    DirectAnswer,
    ToolSelected,
    ToolExecuting,
    ToolResultIntegration,
    Finalized,
}

#[derive(Debug, Clone)]
pub enum TurnState {
    /// Validated user text, not yet in the session
    Received { text: String },

    /// Prompt built; waiting for the engine's decision
    Reasoning { prompt: Prompt },

    /// The engine answered without a tool
    DirectAnswer { text: String },

    /// The engine asked for a tool; not yet validated
    ToolSelected {
        prompt: Prompt,
        call: ToolCall,
        rationale: Option<String>,
    },

    /// Arguments passed validation; the tool is running
    ToolExecuting {
        prompt: Prompt,
        call: ToolCall,
        rationale: Option<String>,
    },

    /// Observation ready; waiting for the composed answer
    ToolResultIntegration {
        prompt: Prompt,
        observation: Observation,
        /// Absent when the requested tool does not exist
        invocation: Option<ToolInvocationRecord>,
    },

    Finalized(TurnOutcome),
}

impl TurnState {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Received { .. } => Phase::Received,
            Self::Reasoning { .. } => Phase::Reasoning,
            Self::DirectAnswer { .. } => Phase::DirectAnswer,
            Self::ToolSelected { .. } => Phase::ToolSelected,
            Self::ToolExecuting { .. } => Phase::ToolExecuting,
            Self::ToolResultIntegration { .. } => Phase::ToolResultIntegration,
            Self::Finalized(_) => Phase::Finalized,
        }
    }

    /// Entry point. Blank input never reaches the engine.
    pub fn receive(text: &str) -> Result<Self, AgentError> {
        if text.trim().is_empty() {
            return Err(AgentError::EmptyMessage);
        }
        Ok(Self::Received {
            text: text.to_string(),
        })
    }

    /// Received → Reasoning.
    pub fn reasoning(prompt: Prompt) -> Self {
        Self::Reasoning { prompt }
    }

    /// Reasoning → DirectAnswer | ToolSelected.
    pub fn decided(prompt: Prompt, decision: Decision) -> Self {
        match decision {
            Decision::Answer { text } => Self::DirectAnswer { text },
            Decision::UseTool { call, rationale } => Self::ToolSelected {
                prompt,
                call,
                rationale,
            },
        }
    }

    /// ToolSelected → ToolExecuting, or straight to integration when the
    /// selection itself is unusable.
    ///
    /// An unknown tool yields no invocation record. Invalid arguments yield a
    /// failed record under the tool's name.
    pub fn validated(
        prompt: Prompt,
        call: ToolCall,
        rationale: Option<String>,
        validation: Result<(), ToolError>,
    ) -> Self {
        match validation {
            Ok(()) => Self::ToolExecuting {
                prompt,
                call,
                rationale,
            },
            Err(error) => {
                let invocation = match &error {
                    ToolError::NotFound(_) => None,
                    _ => Some(record(&call, serde_json::Value::String(error.to_string()), false)),
                };
                Self::ToolResultIntegration {
                    observation: failed_observation(call, rationale, &error),
                    prompt,
                    invocation,
                }
            }
        }
    }

    /// ToolExecuting → ToolResultIntegration. Failures become observations.
    pub fn executed(
        prompt: Prompt,
        call: ToolCall,
        rationale: Option<String>,
        result: Result<ToolOutput, ToolError>,
    ) -> Self {
        let (observation, invocation) = match result {
            Ok(output) => (
                Observation {
                    content: output.text,
                    success: true,
                    rationale,
                    call: call.clone(),
                },
                record(&call, output.data, true),
            ),
            Err(error) => (
                failed_observation(call.clone(), rationale, &error),
                record(&call, serde_json::Value::String(error.to_string()), false),
            ),
        };

        Self::ToolResultIntegration {
            prompt,
            observation,
            invocation: Some(invocation),
        }
    }

    /// DirectAnswer → Finalized.
    pub fn answered(text: String) -> Self {
        Self::Finalized(TurnOutcome {
            response: text,
            invocation: None,
            thinking: None,
        })
    }

    /// ToolResultIntegration → Finalized.
    ///
    /// The composition call carries no catalog, so a second tool request is
    /// not honoured; the observation itself becomes the answer.
    pub fn integrated(
        observation: Observation,
        invocation: Option<ToolInvocationRecord>,
        decision: Decision,
    ) -> Self {
        let thinking = thinking_for(&observation);
        let response = match decision {
            Decision::Answer { text } => text,
            Decision::UseTool { call, .. } => {
                tracing::warn!(
                    tool = %call.name,
                    "Engine asked for a second tool during integration; answering from the observation"
                );
                fallback_answer(&observation)
            }
        };

        Self::Finalized(TurnOutcome {
            response,
            invocation,
            thinking: Some(thinking),
        })
    }
}

fn record(call: &ToolCall, output: serde_json::Value, success: bool) -> ToolInvocationRecord {
    ToolInvocationRecord {
        tool_name: call.name.clone(),
        input: call.arguments.clone(),
        output,
        success,
        timestamp: Utc::now(),
    }
}

fn failed_observation(call: ToolCall, rationale: Option<String>, error: &ToolError) -> Observation {
    Observation {
        content: format!("Error: {error}"),
        success: false,
        rationale,
        call,
    }
}

fn thinking_for(observation: &Observation) -> String {
    observation.rationale.clone().unwrap_or_else(|| {
        format!(
            "Decided to use '{}' with input: {}",
            observation.call.name, observation.call.arguments
        )
    })
}

fn fallback_answer(observation: &Observation) -> String {
    if observation.success {
        observation.content.clone()
    } else {
        format!(
            "I tried to use '{}' but it did not work: {}",
            observation.call.name,
            observation.content.trim_start_matches("Error: ")
        )
    }
}
