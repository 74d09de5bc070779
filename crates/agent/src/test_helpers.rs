//! Shared test doubles for orchestrator tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use hopper_core::engine::{Decision, Prompt, ReasoningEngine};
use hopper_core::error::EngineError;

/// An engine that replays a scripted sequence of results.
///
/// Every prompt it receives is kept for inspection. Panics if called more
/// often than scripted.
pub struct ScriptedEngine {
    script: Mutex<VecDeque<Result<Decision, EngineError>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedEngine {
    pub fn new(script: Vec<Result<Decision, EngineError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answers every listed prompt directly, in order.
    pub fn answers(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(Decision::answer(*t))).collect())
    }

    /// Asks for one tool, then composes `answer`.
    pub fn tool_then_answer(name: &str, arguments: serde_json::Value, answer: &str) -> Self {
        Self::new(vec![
            Ok(Decision::use_tool(name, arguments, None)),
            Ok(Decision::answer(answer)),
        ])
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ReasoningEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn decide(&self, prompt: &Prompt) -> Result<Decision, EngineError> {
        let call = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.clone());
            prompts.len()
        };

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedEngine: no scripted result for call #{call}"))
    }
}
