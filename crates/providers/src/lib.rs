//! Reasoning engine implementations for Hopper.
//!
//! All engines implement the `hopper_core::ReasoningEngine` trait.
//! [`build_from_config`] selects the flavour based on configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::{Flavour, OpenAiCompatEngine};
pub use router::{UnconfiguredEngine, build_from_config};
