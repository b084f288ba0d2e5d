//! Conversation History
//!
//! Ordered log of turns owned by one chat session. Storage is permissive:
//! the UI-visible log may hold turns the wire exporter elides. The exporter
//! enforces the two invariants the remote protocol requires (strict role
//! alternation and no repeated (role, text) pairs), and every mutation
//! notifies subscribed listeners synchronously.

use std::collections::HashSet;

use colloquy_core::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attachment::Attachment;
use crate::types::{ChatError, ChatResult, MessageRole, WireMessage};

/// One message (user or assistant) in the conversation log.
///
/// Created on send, mutated in place while its stream is open, immutable
/// once finalized (except for the terminal error suffix appended once).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub role: MessageRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    pub finalized: bool,
}

impl Turn {
    /// A finalized user turn.
    pub fn user(text: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
            attachments,
            finalized: true,
        }
    }

    /// An empty, unfinalized assistant turn awaiting incoming deltas.
    pub fn assistant_placeholder() -> Self {
        Self {
            role: MessageRole::Assistant,
            text: String::new(),
            attachments: Vec::new(),
            finalized: false,
        }
    }
}

/// Listener invoked synchronously after every history mutation.
///
/// Listeners must tolerate notifications with no net visible change.
pub type HistoryListener = Box<dyn Fn(&[Turn]) + Send + Sync>;

/// Identifier returned by `subscribe`, used to unsubscribe.
pub type ListenerId = u64;

/// The conversation log for one adapter instance.
///
/// Invariant: at most one unfinalized turn exists at any time (the one
/// currently streaming).
#[derive(Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
    listeners: Vec<(ListenerId, HistoryListener)>,
    next_listener_id: ListenerId,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current turns, in conversation order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Register a change listener; returns the id used to unsubscribe.
    pub fn subscribe(&mut self, listener: HistoryListener) -> ListenerId {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Remove a previously registered listener. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.turns);
        }
    }

    /// Append a user turn.
    ///
    /// Rejected when the text trims to empty. When the immediately preceding
    /// turn is a finalized user turn with identical text the append is a
    /// no-op returning the existing index, so re-invoking send for the same
    /// logical action never duplicates the turn.
    pub fn append_user_turn(
        &mut self,
        text: &str,
        attachments: Vec<Attachment>,
    ) -> ChatResult<usize> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyInput);
        }

        if let Some(last) = self.turns.last() {
            if last.role == MessageRole::User && last.finalized && last.text == text {
                debug!("suppressing duplicate user turn");
                return Ok(self.turns.len() - 1);
            }
        }

        self.turns.push(Turn::user(text, attachments));
        self.notify();
        Ok(self.turns.len() - 1)
    }

    /// Append an empty, unfinalized assistant turn to be filled
    /// incrementally. Always succeeds.
    pub fn append_assistant_placeholder(&mut self) -> usize {
        self.turns.push(Turn::assistant_placeholder());
        self.notify();
        self.turns.len() - 1
    }

    fn open_turn_mut(&mut self) -> Option<&mut Turn> {
        self.turns
            .iter_mut()
            .rev()
            .find(|turn| turn.role == MessageRole::Assistant && !turn.finalized)
    }

    /// Append a delta to the open assistant turn; no-op when none is open.
    /// Listeners observe the new text synchronously.
    pub fn apply_delta(&mut self, delta: &str) {
        let applied = match self.open_turn_mut() {
            Some(turn) => {
                turn.text.push_str(delta);
                true
            }
            None => false,
        };
        if applied {
            self.notify();
        }
    }

    /// Append the terminal error suffix to the open assistant turn and
    /// finalize it; no-op when none is open.
    pub fn apply_error(&mut self, message: &str) {
        let applied = match self.open_turn_mut() {
            Some(turn) => {
                turn.text.push_str(&format!("\n\n[error]: {message}"));
                turn.finalized = true;
                true
            }
            None => false,
        };
        if applied {
            self.notify();
        }
    }

    /// Mark the open assistant turn finalized on clean stream close.
    pub fn finalize_open_turn(&mut self) {
        let applied = match self.open_turn_mut() {
            Some(turn) => {
                turn.finalized = true;
                true
            }
            None => false,
        };
        if applied {
            self.notify();
        }
    }

    /// Produce the wire-format message list for the next request.
    ///
    /// Walks history in order, skipping turns with empty text, turns whose
    /// (role, text) pair was already emitted earlier in this export, and
    /// turns whose role equals the immediately preceding exported role (the
    /// remote protocol requires strict user/assistant alternation).
    pub fn export_wire_messages(&self) -> Vec<WireMessage> {
        let mut messages: Vec<WireMessage> = Vec::new();
        let mut emitted: HashSet<(MessageRole, &str)> = HashSet::new();

        for turn in &self.turns {
            if turn.text.trim().is_empty() {
                continue;
            }
            if emitted.contains(&(turn.role, turn.text.as_str())) {
                continue;
            }
            if messages.last().map(|m| m.role) == Some(turn.role) {
                continue;
            }
            emitted.insert((turn.role, turn.text.as_str()));
            messages.push(WireMessage {
                role: turn.role,
                content: turn.text.clone(),
            });
        }

        messages
    }

    /// Drop all turns. One change notification.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.notify();
    }

    /// Replace the whole log. One change notification.
    ///
    /// Rejected when the new content would break the single-open-turn
    /// invariant.
    pub fn replace(&mut self, turns: Vec<Turn>) -> CoreResult<()> {
        let open = turns.iter().filter(|turn| !turn.finalized).count();
        if open > 1 {
            return Err(CoreError::validation(
                "history may hold at most one unfinalized turn",
            ));
        }
        self.turns = turns;
        self.notify();
        Ok(())
    }
}
