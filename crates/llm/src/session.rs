//! Chat Session
//!
//! Owns the conversation history and a provider, and orchestrates the
//! request lifecycle: validation, history mutation, wire-message export,
//! streaming, and failure propagation. Callers serialize sends themselves;
//! history has no per-call isolation.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use colloquy_core::streaming::StreamEvent;

use crate::anthropic::AnthropicProvider;
use crate::attachment::Attachment;
use crate::history::{ConversationHistory, HistoryListener, ListenerId};
use crate::provider::ChatProvider;
use crate::types::{ChatError, ChatResult, MessageRole, ProviderConfig, WireMessage};

/// Capacity of the internal relay channel between provider and session.
const RELAY_CHANNEL_CAPACITY: usize = 64;

/// One streaming chat adapter instance.
pub struct ChatSession {
    config: ProviderConfig,
    provider: Arc<dyn ChatProvider>,
    history: ConversationHistory,
}

impl ChatSession {
    /// Create a session backed by the Anthropic provider.
    pub fn new(config: ProviderConfig) -> Self {
        let provider = Arc::new(AnthropicProvider::new(config.clone()));
        Self {
            config,
            provider,
            history: ConversationHistory::new(),
        }
    }

    /// Create a session with an injected provider.
    pub fn with_provider(config: ProviderConfig, provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            config,
            provider,
            history: ConversationHistory::new(),
        }
    }

    /// Read access to the conversation log.
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Register a history change listener.
    pub fn subscribe(&mut self, listener: HistoryListener) -> ListenerId {
        self.history.subscribe(listener)
    }

    /// Remove a history change listener.
    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.history.unsubscribe(id);
    }

    /// Drop all turns.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Chat-mode entry point.
    ///
    /// Appends the pending turns, streams the response into both the output
    /// channel and the open history turn, and returns the accumulated
    /// assistant text. The channel always closes with exactly one terminal
    /// event.
    pub async fn send_chat(
        &mut self,
        prompt: &str,
        attachments: Vec<Attachment>,
        tx: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> ChatResult<String> {
        if !self.config.has_credential() {
            return Self::fail_before_request(&tx, ChatError::NotConfigured).await;
        }
        if prompt.trim().is_empty() {
            return Self::fail_before_request(&tx, ChatError::EmptyInput).await;
        }

        if let Err(err) = self.history.append_user_turn(prompt, attachments.clone()) {
            return Self::fail_before_request(&tx, err).await;
        }
        self.history.append_assistant_placeholder();

        let composed = compose_content(prompt, &attachments);
        let messages = self.build_wire_messages(&composed);
        debug!("sending {} wire messages", messages.len());

        let (relay_tx, mut relay_rx) = mpsc::channel::<StreamEvent>(RELAY_CHANNEL_CAPACITY);
        let provider = Arc::clone(&self.provider);
        let history = &mut self.history;

        let stream_call = provider.stream_message(messages, relay_tx, cancel);
        let relay = async {
            while let Some(event) = relay_rx.recv().await {
                match &event {
                    StreamEvent::TextDelta { content } => {
                        let _ = tx.send(event.clone()).await;
                        history.apply_delta(content);
                    }
                    StreamEvent::Error { message, .. } => {
                        history.apply_error(message);
                        let _ = tx.send(event.clone()).await;
                    }
                    StreamEvent::Complete => {
                        history.finalize_open_turn();
                        let _ = tx.send(event.clone()).await;
                    }
                }
            }
        };

        let (result, ()) = tokio::join!(stream_call, relay);
        result
    }

    /// One-shot entry point.
    ///
    /// Builds a single user message from the prompt alone and leaves history
    /// untouched. Empty prompts flow through unchanged.
    pub async fn generate(
        &self,
        prompt: &str,
        tx: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> ChatResult<String> {
        if !self.config.has_credential() {
            return Self::fail_before_request(&tx, ChatError::NotConfigured).await;
        }
        self.provider
            .stream_message(vec![WireMessage::user(prompt)], tx, cancel)
            .await
    }

    /// Export wire messages, substituting the freshly composed content for
    /// the final user message.
    fn build_wire_messages(&self, composed: &str) -> Vec<WireMessage> {
        let mut messages = self.history.export_wire_messages();
        if let Some(last_user) = messages
            .iter_mut()
            .rev()
            .find(|message| message.role == MessageRole::User)
        {
            last_user.content = composed.to_string();
        }
        messages
    }

    /// Deliver a pre-request failure as the channel's terminal event.
    async fn fail_before_request(
        tx: &mpsc::Sender<StreamEvent>,
        err: ChatError,
    ) -> ChatResult<String> {
        let _ = tx
            .send(StreamEvent::Error {
                message: err.to_string(),
                code: err.code(),
            })
            .await;
        Err(err)
    }
}

/// Compose the outgoing content: the prompt followed by one description line
/// per attachment.
fn compose_content(prompt: &str, attachments: &[Attachment]) -> String {
    if attachments.is_empty() {
        return prompt.to_string();
    }
    let mut content = prompt.to_string();
    for attachment in attachments {
        content.push('\n');
        content.push_str(&attachment.describe());
    }
    content
}
