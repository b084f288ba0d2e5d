//! Shared Provider-Layer Types
//!
//! Message roles, the wire-format message shape, provider configuration, and
//! the chat error taxonomy.

use colloquy_core::proxy::ProxyConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of a message in the conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Wire-format role string.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// The only message shape accepted by the remote protocol.
///
/// Derived from history on every request, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireMessage {
    pub role: MessageRole,
    pub content: String,
}

impl WireMessage {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key; a missing or blank key means the adapter is not configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Endpoint override for self-hosted or compatible gateways.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Maximum tokens requested per response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Value of the API version header.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Optional proxy for the HTTP client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

fn default_model() -> String {
    "claude-3-5-sonnet-latest".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: None,
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
            proxy: None,
        }
    }
}

impl ProviderConfig {
    /// Whether a usable credential is present (non-blank API key).
    pub fn has_credential(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Chat error taxonomy.
///
/// `NotConfigured` and `EmptyInput` are local validation failures surfaced
/// before any network call; the remaining variants map transport, HTTP, and
/// payload failures. Malformed stream fragments are not errors at this level:
/// they are logged and dropped by the frame assembler.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    /// Missing or blank credential
    #[error("API key not configured")]
    NotConfigured,

    /// Prompt trims to empty (chat mode only)
    #[error("Message is empty")]
    EmptyInput,

    /// Network/connection failure, surfaced as-is, never retried here
    #[error("Network error: {message}")]
    Transport { message: String },

    /// Non-2xx response that did not classify as a structured API error
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// Structured error payload (mid-stream or classified HTTP body);
    /// `message` already carries the user-facing formatting
    #[error("{message}")]
    Api {
        message: String,
        code: Option<String>,
    },

    /// Cooperative cancellation
    #[error("Request cancelled")]
    Cancelled,
}

impl ChatError {
    /// Machine-readable code carried by structured API errors.
    pub fn code(&self) -> Option<String> {
        match self {
            ChatError::Api { code, .. } => code.clone(),
            _ => None,
        }
    }
}

/// Result type alias for chat errors
pub type ChatResult<T> = Result<T, ChatError>;
