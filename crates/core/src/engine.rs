//! ReasoningEngine trait: the abstraction over the language model.
//!
//! The engine is an opaque decision service: given a prompt it either answers
//! directly or asks for exactly one tool. The agent loop never sees
//! wire formats, only [`Prompt`] in and [`Decision`] out.
//!
//! Implementations: OpenAI-compatible, Azure OpenAI, scripted test doubles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::message::Message;
use crate::tool::{ToolCall, ToolDefinition};

/// Everything the engine gets to see for one decision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Prompt {
    /// Fixed behavioural instructions
    pub instructions: String,

    /// Tools the engine may pick from; empty when composing a final answer
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Prior turns, already truncated to the context budget
    #[serde(default)]
    pub history: Vec<Message>,

    /// The message being answered
    pub user_turn: String,

    /// Result of the tool picked on the previous call, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<Observation>,
}

/// What happened when the chosen tool was attempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// The call the engine asked for
    pub call: ToolCall,

    /// The engine's reason for the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,

    /// Tool output, or a description of the failure
    pub content: String,

    /// Whether the tool produced a result
    pub success: bool,
}

/// The engine's answer to a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// Respond with this text; no tool needed
    Answer { text: String },

    /// Call one tool before answering
    UseTool {
        call: ToolCall,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rationale: Option<String>,
    },
}

impl Decision {
    pub fn answer(text: impl Into<String>) -> Self {
        Self::Answer { text: text.into() }
    }

    pub fn use_tool(
        name: impl Into<String>,
        arguments: serde_json::Value,
        rationale: Option<String>,
    ) -> Self {
        let name = name.into();
        Self::UseTool {
            call: ToolCall {
                id: format!("call_{name}"),
                name,
                arguments,
            },
            rationale,
        }
    }
}

/// The capability the agent loop needs from a language model.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// A human-readable name for this engine (e.g., "openai", "azure").
    fn name(&self) -> &str;

    /// Decide how to respond to the prompt.
    async fn decide(&self, prompt: &Prompt) -> Result<Decision, EngineError>;

    /// Health check: can we reach the engine?
    async fn health_check(&self) -> Result<bool, EngineError> {
        Ok(true)
    }
}
