//! The shared conversation store.
//!
//! One [`ConversationSession`] holds the history for a deployment scope.
//! Every operation takes the same async mutex, and no operation awaits
//! anything else while holding it, so readers never see a half-cleared
//! history and slow turns never block unrelated ones.

use tokio::sync::Mutex;

use crate::error::SessionError;
use crate::message::Message;

/// An immutable copy of the history at one instant.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Messages in arrival order
    pub messages: Vec<Message>,

    /// Clear counter at the time of the snapshot
    pub epoch: u64,
}

#[derive(Default)]
struct SessionState {
    messages: Vec<Message>,
    epoch: u64,
}

/// Ordered, append-only history with an atomic reset.
#[derive(Default)]
pub struct ConversationSession {
    state: Mutex<SessionState>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the end of the history.
    pub async fn append(&self, message: Message) {
        self.state.lock().await.messages.push(message);
    }

    /// Copy the current history.
    pub async fn snapshot(&self) -> Snapshot {
        let state = self.state.lock().await;
        Snapshot {
            messages: state.messages.clone(),
            epoch: state.epoch,
        }
    }

    /// Copy the history, then append `message`, in one critical section.
    ///
    /// The returned snapshot excludes `message`.
    pub async fn snapshot_and_append(&self, message: Message) -> Snapshot {
        let mut state = self.state.lock().await;
        let snapshot = Snapshot {
            messages: state.messages.clone(),
            epoch: state.epoch,
        };
        state.messages.push(message);
        snapshot
    }

    /// Append only if the history has not been cleared since `epoch`.
    pub async fn append_if_current(&self, epoch: u64, message: Message) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            return Err(SessionError::Conflict {
                expected: epoch,
                current: state.epoch,
            });
        }
        state.messages.push(message);
        Ok(())
    }

    /// Drop all messages. Idempotent.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.messages = Vec::new();
        state.epoch += 1;
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.messages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.messages.is_empty()
    }
}
