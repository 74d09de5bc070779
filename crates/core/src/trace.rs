//! Turn traces: the structured record returned alongside each answer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One attempted tool call. Lives only as long as the turn's response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRecord {
    pub tool_name: String,
    pub input: serde_json::Value,
    /// Tool data on success, the error text on failure
    pub output: serde_json::Value,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

/// Terminal state of a turn, before shaping.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub response: String,
    /// Set only when a registered tool was resolved for the call
    pub invocation: Option<ToolInvocationRecord>,
    pub thinking: Option<String>,
}

/// The shape handed back to callers: `{response, tool_used, tool_output, thinking}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnTrace {
    pub response: String,
    pub tool_used: Option<String>,
    pub tool_output: Option<serde_json::Value>,
    pub thinking: Option<String>,
}

/// Shapes turn outcomes into traces. Stateless.
pub struct TraceRecorder;

impl TraceRecorder {
    pub fn record(outcome: &TurnOutcome) -> TurnTrace {
        let (tool_used, tool_output) = match &outcome.invocation {
            Some(record) => (Some(record.tool_name.clone()), Some(record.output.clone())),
            None => (None, None),
        };

        TurnTrace {
            response: outcome.response.clone(),
            tool_used,
            tool_output,
            thinking: outcome.thinking.clone(),
        }
    }
}
