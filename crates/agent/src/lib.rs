//! The Hopper agent loop.
//!
//! Every user message runs one turn:
//!
//! 1. **Receive** the text and record it in the conversation
//! 2. **Reason**: send instructions, tool catalog and bounded history to the engine
//! 3. **Answer directly**, or **execute exactly one tool**
//! 4. **Integrate**: a second engine call composes the answer from the tool result
//! 5. **Finalize**: record the answer and return its trace
//!
//! There is no loop back to reasoning after a tool result.

pub mod context;
pub mod orchestrator;
pub mod state;

#[cfg(test)]
mod test_helpers;

pub use context::{ContextLimits, DEFAULT_INSTRUCTIONS};
pub use orchestrator::{Orchestrator, ToolSummary};
pub use state::{Phase, TurnState};
