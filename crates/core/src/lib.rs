//! # Hopper Core
//!
//! Domain types, traits, and error definitions for the Hopper agent.
//! This crate has **no framework dependencies**; it defines the model that
//! the engine, tool, and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! The reasoning engine and the tools are traits here. Implementations live
//! in their own crates, which keeps the agent loop testable with scripted
//! doubles and lets the engine be swapped via configuration.

pub mod engine;
pub mod error;
pub mod message;
pub mod session;
pub mod tool;
pub mod trace;

// Re-export key types at crate root for ergonomics
pub use engine::{Decision, Observation, Prompt, ReasoningEngine};
pub use error::{AgentError, EngineError, Error, ExecutionFailure, Result, SessionError, ToolError};
pub use message::{Message, Role};
pub use session::{ConversationSession, Snapshot};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolOutput, ToolRegistry};
pub use trace::{ToolInvocationRecord, TraceRecorder, TurnOutcome, TurnTrace};
