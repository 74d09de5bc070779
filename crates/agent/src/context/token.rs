//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token, close enough
//! to BPE tokenizers on English text to keep prompts under budget.

use hopper_core::message::Message;
use hopper_core::tool::ToolDefinition;

/// Per-message overhead for role name and delimiters in the wire format.
const MESSAGE_OVERHEAD: usize = 4;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Estimate tokens for a single message including per-message overhead.
pub fn estimate_message_tokens(message: &Message) -> usize {
    MESSAGE_OVERHEAD + estimate_tokens(&message.content)
}

/// Estimate tokens for a slice of messages.
pub fn estimate_messages_tokens(messages: &[Message]) -> usize {
    messages.iter().map(estimate_message_tokens).sum()
}

/// Estimate tokens for the tool catalog (serialized as JSON).
pub fn estimate_tools_tokens(tools: &[ToolDefinition]) -> usize {
    tools
        .iter()
        .map(|t| estimate_tokens(&serde_json::to_string(t).unwrap_or_default()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn five_chars_rounds_up() {
        assert_eq!(estimate_tokens("hello"), 2);
    }

    #[test]
    fn message_includes_overhead() {
        let msg = Message::user("test"); // 1 token + 4 overhead
        assert_eq!(estimate_message_tokens(&msg), 5);
    }

    #[test]
    fn multiple_messages() {
        let msgs = vec![Message::user("hello"), Message::agent("world")];
        assert_eq!(estimate_messages_tokens(&msgs), 12);
    }

    #[test]
    fn tool_catalog_tokens() {
        let tool = ToolDefinition {
            name: "get_weather".to_string(),
            description: "Weather for a city".to_string(),
            parameters: serde_json::json!({"type": "object"}),
        };
        assert!(estimate_tools_tokens(&[tool]) > 0);
        assert_eq!(estimate_tools_tokens(&[]), 0);
    }
}
