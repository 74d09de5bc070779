//! History windowing: bounds how much of the conversation reaches the engine.

use hopper_core::message::Message;

use super::token::{estimate_message_tokens, estimate_messages_tokens};

/// The most recent part of `history` that fits both limits.
///
/// Keeps at most `max_messages`, then drops the oldest until the estimate
/// is within `token_budget`. Order is preserved.
pub fn fit_history(history: &[Message], max_messages: usize, token_budget: usize) -> Vec<Message> {
    let start = history.len().saturating_sub(max_messages);
    let mut window = &history[start..];
    let mut tokens = estimate_messages_tokens(window);

    while tokens > token_budget {
        let Some((oldest, rest)) = window.split_first() else {
            break;
        };
        tokens -= estimate_message_tokens(oldest);
        window = rest;
    }

    window.to_vec()
}
