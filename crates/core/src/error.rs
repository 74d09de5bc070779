//! Error types for the Hopper domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] wraps them all.

use thiserror::Error;

/// The top-level error type for all Hopper operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Reasoning engine errors ---
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Conversation store errors ---
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    // --- Turn-level errors ---
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to the reasoning engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by engine, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Engine not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed engine response: {0}")]
    MalformedResponse(String),
}

impl EngineError {
    /// Whether a single retry of the same call is worthwhile.
    ///
    /// Server-side errors, rate limits and transport hiccups are transient.
    /// Auth and configuration problems are not, and timeouts have already
    /// spent their budget.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::RateLimited { .. } => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// Why a tool that did run could not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionFailure {
    #[error("unsupported currency: {0} (supported: USD, EUR, INR)")]
    UnsupportedCurrency(String),

    #[error("city not found: {0}")]
    CityNotFound(String),

    #[error("search unavailable: {0}")]
    SearchUnavailable(String),

    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool already registered: {0}")]
    Duplicate(String),

    #[error("Invalid parameter schema for {tool_name}: {reason}")]
    InvalidSchema { tool_name: String, reason: String },

    #[error("Invalid arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },

    #[error("Tool execution failed: {tool_name}: {failure}")]
    Execution {
        tool_name: String,
        failure: ExecutionFailure,
    },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },
}

impl ToolError {
    pub fn execution(tool_name: impl Into<String>, failure: ExecutionFailure) -> Self {
        Self::Execution {
            tool_name: tool_name.into(),
            failure,
        }
    }

    pub fn invalid_arguments(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool_name: tool_name.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("History was cleared during the turn (epoch {expected} → {current})")]
    Conflict { expected: u64, current: u64 },
}

/// Errors surfaced to the caller of a turn.
///
/// Tool selection and execution failures never appear here; they are
/// folded into the turn's answer and trace instead.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Reasoning engine unavailable: {0}")]
    ServiceUnavailable(EngineError),

    #[error("Timed out: {0}")]
    Timeout(String),
}

impl From<EngineError> for AgentError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Timeout(reason) => Self::Timeout(format!("reasoning engine: {reason}")),
            other => Self::ServiceUnavailable(other),
        }
    }
}
