//! Message domain types.
//!
//! A turn is one user [`Message`] followed by one agent [`Message`].
//! Messages are value objects: once built they are only ever cloned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The agent's final answer for a turn
    Agent,
}

/// A single message in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Name of the tool consulted for this answer, if any
    #[serde(default)]
    pub tool_used: Option<String>,

    /// Raw tool output behind this answer, if any
    #[serde(default)]
    pub tool_output: Option<serde_json::Value>,

    /// Why the tool was chosen
    #[serde(default)]
    pub thinking: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            tool_used: None,
            tool_output: None,
            thinking: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into())
    }

    /// Create a new agent message.
    pub fn agent(content: impl Into<String>) -> Self {
        Self::new(Role::Agent, content.into())
    }

    /// Attach the tool trace to an agent message.
    pub fn with_tool(mut self, name: impl Into<String>, output: serde_json::Value) -> Self {
        self.tool_used = Some(name.into());
        self.tool_output = Some(output);
        self
    }

    pub fn with_thinking(mut self, thinking: Option<String>) -> Self {
        self.thinking = thinking;
        self
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}
