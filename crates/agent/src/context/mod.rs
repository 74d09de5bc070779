//! Prompt assembly for a turn.
//!
//! | Part | Source | Bound |
//! |------|--------|-------|
//! | Instructions | fixed text | never trimmed |
//! | Tool catalog | registry `list()` | omitted when integrating a result |
//! | History | session snapshot | `history_messages`, then `context_token_budget` |
//! | User turn | the submitted text | never trimmed |

pub mod token;
pub mod window;

use hopper_core::engine::{Observation, Prompt};
use hopper_core::message::Message;
use hopper_core::tool::ToolDefinition;

pub use window::fit_history;

/// Behavioural instructions sent with every decision.
pub const DEFAULT_INSTRUCTIONS: &str = "\
You are a helpful assistant with access to a small set of tools.
Answer directly when you can. When the request needs data you cannot know \
on your own (arithmetic over several numbers, currency conversion, the \
current date or time, weather, or recent information from the web), call \
exactly one tool.
After a tool result arrives, explain it to the user in plain language. \
If the tool failed, say so and answer as well as you can without it.";

/// Bounds applied to history before it reaches the engine.
#[derive(Debug, Clone, Copy)]
pub struct ContextLimits {
    pub history_messages: usize,
    pub token_budget: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            history_messages: 20,
            token_budget: 3000,
        }
    }
}

/// Prompt for the decision call: catalog, bounded history, the new message.
pub fn reasoning_prompt(
    instructions: &str,
    tools: Vec<ToolDefinition>,
    history: &[Message],
    user_turn: &str,
    limits: ContextLimits,
) -> Prompt {
    Prompt {
        instructions: instructions.to_string(),
        tools,
        history: fit_history(history, limits.history_messages, limits.token_budget),
        user_turn: user_turn.to_string(),
        observation: None,
    }
}

/// Prompt for the composition call: same context, the observation added,
/// and no catalog so the engine can only answer.
pub fn integration_prompt(reasoning: &Prompt, observation: Observation) -> Prompt {
    Prompt {
        tools: Vec::new(),
        observation: Some(observation),
        ..reasoning.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopper_core::tool::ToolCall;

    #[test]
    fn reasoning_prompt_bounds_history() {
        let history: Vec<Message> = (0..25).map(|i| Message::user(format!("m{i}"))).collect();
        let prompt = reasoning_prompt(
            DEFAULT_INSTRUCTIONS,
            vec![],
            &history,
            "latest",
            ContextLimits::default(),
        );

        assert_eq!(prompt.history.len(), 20);
        assert_eq!(prompt.history[0].content, "m5");
        assert_eq!(prompt.user_turn, "latest");
        assert!(prompt.observation.is_none());
    }

    #[test]
    fn integration_prompt_drops_catalog() {
        let reasoning = reasoning_prompt(
            DEFAULT_INSTRUCTIONS,
            vec![ToolDefinition {
                name: "calculate_sum".into(),
                description: "Sum".into(),
                parameters: serde_json::json!({"type": "object"}),
            }],
            &[Message::user("earlier")],
            "add 1 and 2",
            ContextLimits::default(),
        );

        let integration = integration_prompt(
            &reasoning,
            Observation {
                call: ToolCall {
                    id: "call_calculate_sum".into(),
                    name: "calculate_sum".into(),
                    arguments: serde_json::json!({"numbers": [1, 2]}),
                },
                rationale: None,
                content: "The sum of [1, 2] is 3".into(),
                success: true,
            },
        );

        assert!(integration.tools.is_empty());
        assert_eq!(integration.history, reasoning.history);
        assert_eq!(integration.user_turn, "add 1 and 2");
        assert!(integration.observation.unwrap().success);
    }
}
