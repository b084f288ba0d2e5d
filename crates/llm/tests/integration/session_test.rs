//! Session Integration Tests
//!
//! Drives a ChatSession end-to-end over a scripted provider: delta
//! propagation into both the output channel and history, terminal error
//! handling, and the one-shot entry point.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use colloquy_core::streaming::StreamEvent;
use colloquy_llm::{
    Attachment, ChatError, ChatProvider, ChatResult, ChatSession, MessageRole, ProviderConfig,
    WireMessage,
};

/// Provider that replays a fixed event script and records the wire messages
/// it was asked to send.
struct ScriptedProvider {
    script: Vec<StreamEvent>,
    result: ChatResult<String>,
    captured: Mutex<Vec<Vec<WireMessage>>>,
}

impl ScriptedProvider {
    fn new(script: Vec<StreamEvent>, result: ChatResult<String>) -> Arc<Self> {
        Arc::new(Self {
            script,
            result,
            captured: Mutex::new(Vec::new()),
        })
    }

    fn captured(&self) -> Vec<Vec<WireMessage>> {
        self.captured.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "test-model"
    }

    async fn stream_message(
        &self,
        messages: Vec<WireMessage>,
        tx: mpsc::Sender<StreamEvent>,
        _cancel: CancellationToken,
    ) -> ChatResult<String> {
        self.captured.lock().unwrap().push(messages);
        for event in &self.script {
            let _ = tx.send(event.clone()).await;
        }
        self.result.clone()
    }
}

fn test_config() -> ProviderConfig {
    ProviderConfig {
        api_key: Some("sk-test".to_string()),
        ..Default::default()
    }
}

async fn collect(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

fn delta(content: &str) -> StreamEvent {
    StreamEvent::TextDelta {
        content: content.to_string(),
    }
}

#[tokio::test]
async fn test_send_chat_streams_into_channel_and_history() {
    let provider = ScriptedProvider::new(
        vec![
            delta("Hel"),
            delta("lo"),
            delta(", world!"),
            StreamEvent::Complete,
        ],
        Ok("Hello, world!".to_string()),
    );
    let mut session = ChatSession::with_provider(test_config(), provider.clone());

    let (tx, rx) = mpsc::channel(16);
    let result = session
        .send_chat("hi there", Vec::new(), tx, CancellationToken::new())
        .await;
    assert_eq!(result.unwrap(), "Hello, world!");

    // The channel yields exactly the three deltas in order, then the
    // terminal Complete.
    let events = collect(rx).await;
    assert_eq!(
        events,
        vec![
            delta("Hel"),
            delta("lo"),
            delta(", world!"),
            StreamEvent::Complete,
        ]
    );

    // History holds the finalized assistant turn with the identical text.
    let turns = session.history().turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, MessageRole::User);
    assert_eq!(turns[1].role, MessageRole::Assistant);
    assert_eq!(turns[1].text, "Hello, world!");
    assert!(turns[1].finalized);
}

#[tokio::test]
async fn test_mid_stream_error_reaches_channel_and_history() {
    let message =
        "API error (rate_limit_error): slow down Reduce request frequency or wait before retrying."
            .to_string();
    let provider = ScriptedProvider::new(
        vec![
            delta("partial"),
            StreamEvent::Error {
                message: message.clone(),
                code: Some("rate_limit_error".to_string()),
            },
        ],
        Err(ChatError::Api {
            message: message.clone(),
            code: Some("rate_limit_error".to_string()),
        }),
    );
    let mut session = ChatSession::with_provider(test_config(), provider);

    let (tx, rx) = mpsc::channel(16);
    let result = session
        .send_chat("hi", Vec::new(), tx, CancellationToken::new())
        .await;
    assert!(result.is_err());

    let events = collect(rx).await;
    match events.last() {
        Some(StreamEvent::Error { message, .. }) => {
            assert!(message.contains("rate_limit_error"));
            assert!(message.contains("slow down"));
        }
        other => panic!("expected terminal Error, got {other:?}"),
    }

    let last = session.history().turns().last().unwrap().clone();
    assert!(last.finalized);
    assert!(last.text.contains("rate_limit_error"));
    assert!(last.text.contains("slow down"));
}

#[tokio::test]
async fn test_attachment_descriptions_substituted_into_final_message() {
    let provider = ScriptedProvider::new(
        vec![delta("ok"), StreamEvent::Complete],
        Ok("ok".to_string()),
    );
    let mut session = ChatSession::with_provider(test_config(), provider.clone());

    let (tx, _rx) = mpsc::channel(16);
    let attachments = vec![Attachment::File {
        path: "notes.txt".to_string(),
    }];
    session
        .send_chat("see this", attachments, tx, CancellationToken::new())
        .await
        .unwrap();

    let captured = provider.captured();
    assert_eq!(captured.len(), 1);
    let messages = &captured[0];
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, "see this\n[attached file: notes.txt]");

    // The history turn keeps the bare prompt; descriptions only exist in the
    // composed request.
    assert_eq!(session.history().turns()[0].text, "see this");
}

#[tokio::test]
async fn test_multi_turn_export_alternates() {
    let provider = ScriptedProvider::new(
        vec![delta("ack"), StreamEvent::Complete],
        Ok("ack".to_string()),
    );
    let mut session = ChatSession::with_provider(test_config(), provider.clone());

    let (tx, _rx) = mpsc::channel(16);
    session
        .send_chat("one", Vec::new(), tx, CancellationToken::new())
        .await
        .unwrap();

    let (tx, _rx) = mpsc::channel(16);
    session
        .send_chat("two", Vec::new(), tx, CancellationToken::new())
        .await
        .unwrap();

    let captured = provider.captured();
    let second_call = &captured[1];
    assert_eq!(second_call.len(), 3);
    assert_eq!(second_call[0].content, "one");
    assert_eq!(second_call[1].content, "ack");
    assert_eq!(second_call[2].content, "two");
    for pair in second_call.windows(2) {
        assert_ne!(pair[0].role, pair[1].role);
    }
}

#[tokio::test]
async fn test_generate_sends_single_user_message_and_skips_history() {
    let provider = ScriptedProvider::new(
        vec![delta("out"), StreamEvent::Complete],
        Ok("out".to_string()),
    );
    let session = ChatSession::with_provider(test_config(), provider.clone());

    let (tx, rx) = mpsc::channel(16);
    let result = session
        .generate("one-shot prompt", tx, CancellationToken::new())
        .await;
    assert_eq!(result.unwrap(), "out");

    let captured = provider.captured();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].len(), 1);
    assert_eq!(captured[0][0].role, MessageRole::User);
    assert_eq!(captured[0][0].content, "one-shot prompt");

    // One-shot calls never touch history.
    assert!(session.history().turns().is_empty());

    let events = collect(rx).await;
    assert_eq!(events.last(), Some(&StreamEvent::Complete));
}

#[tokio::test]
async fn test_generate_permits_empty_prompt() {
    let provider = ScriptedProvider::new(vec![StreamEvent::Complete], Ok(String::new()));
    let session = ChatSession::with_provider(test_config(), provider.clone());

    let (tx, _rx) = mpsc::channel(16);
    let result = session.generate("", tx, CancellationToken::new()).await;
    assert_eq!(result.unwrap(), "");

    // The empty prompt flows through unchanged.
    assert_eq!(provider.captured()[0][0].content, "");
}
