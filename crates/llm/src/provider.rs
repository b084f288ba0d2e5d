//! Chat Provider Trait
//!
//! Defines the provider seam the session orchestrator talks to, plus the
//! error-classification helpers shared by implementations.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use colloquy_core::streaming::StreamEvent;

use crate::types::{ChatError, ChatResult, WireMessage};

/// Trait implemented by streaming chat backends.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Returns the current model being used.
    fn model(&self) -> &str;

    /// Stream a response for the given wire messages.
    ///
    /// Deltas are delivered on `tx`, followed by exactly one terminal
    /// `Complete` or `Error` event before the sender is dropped; the channel
    /// is never left open. Returns the accumulated response text.
    async fn stream_message(
        &self,
        messages: Vec<WireMessage>,
        tx: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> ChatResult<String>;
}

/// Helper function to create an error for a missing API key
pub fn missing_api_key_error() -> ChatError {
    ChatError::NotConfigured
}

/// Classify an HTTP error status with its body.
///
/// A 400 body is read fully and classified as a structured API error when it
/// carries one; other statuses report the raw status with the body attached.
pub fn parse_http_error(status: u16, body: &str) -> ChatError {
    if status == 400 {
        if let Ok(value) = serde_json::from_str::<Value>(body) {
            if let Some(error) = value.get("error") {
                let (message, code) = classify_api_error(error);
                return ChatError::Api { message, code };
            }
        }
        return ChatError::HttpStatus {
            status,
            message: classify_error_line(body),
        };
    }
    ChatError::HttpStatus {
        status,
        message: body.trim().to_string(),
    }
}

/// Build the user-facing message for a structured error payload.
///
/// Structured objects produce `API error (<type>[, extra]): <message>` plus
/// a guidance suffix for the known categories; bare strings are wrapped as
/// `API error: <string>`. Returns the message and the machine-readable error
/// type when one was present.
pub fn classify_api_error(error: &Value) -> (String, Option<String>) {
    if let Some(text) = error.as_str() {
        return (format!("API error: {text}"), None);
    }

    let error_type = error.get("type").and_then(Value::as_str);
    let message = error.get("message").and_then(Value::as_str);

    let (error_type, message) = match (error_type, message) {
        (None, None) => {
            // Neither field present: surface the payload as-is.
            return (format!("API error: {error}"), None);
        }
        (error_type, message) => (
            error_type.unwrap_or("unknown"),
            message.unwrap_or_default(),
        ),
    };

    let mut extra = String::new();
    if let Some(code) = error.get("code").filter(|code| !code.is_null()) {
        extra.push_str(&format!(", code: {}", value_to_compact(code)));
    }
    if let Some(param) = error.get("param").and_then(Value::as_str) {
        extra.push_str(&format!(", param: {param}"));
    }

    let mut out = format!("API error ({error_type}{extra}): {message}");
    if let Some(hint) = guidance(error_type) {
        out.push(' ');
        out.push_str(hint);
    }
    (out, Some(error_type.to_string()))
}

/// Fallback for error bodies that never parsed: surface the raw text from
/// the first occurrence of the word "error" onward.
pub fn classify_error_line(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.find("error").or_else(|| trimmed.find("Error")) {
        Some(idx) => trimmed[idx..].to_string(),
        None => trimmed.to_string(),
    }
}

/// Fixed guidance appended for the known error categories.
fn guidance(error_type: &str) -> Option<&'static str> {
    match error_type {
        "invalid_request_error" => Some("Check the request parameters and model name."),
        "authentication_error" => Some("Check that the API key is valid and active."),
        "rate_limit_error" => Some("Reduce request frequency or wait before retrying."),
        "permission_error" => Some("The API key does not have access to this resource."),
        _ => None,
    }
}

fn value_to_compact(value: &Value) -> String {
    match value.as_str() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    }
}
