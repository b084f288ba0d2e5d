//! Anthropic Provider
//!
//! Implementation of the ChatProvider trait for the Anthropic Messages API.
//! Issues the streaming request, classifies non-success responses, and
//! drives the response bytes through the frame assembler and event
//! extractor.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use colloquy_core::streaming::StreamEvent;

use crate::http_client::build_http_client;
use crate::provider::{missing_api_key_error, parse_http_error, ChatProvider};
use crate::stream::process_sse_stream;
use crate::types::{ChatError, ChatResult, ProviderConfig, WireMessage};

/// Default Anthropic API endpoint
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic provider
pub struct AnthropicProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with the given configuration
    pub fn new(config: ProviderConfig) -> Self {
        let client = build_http_client(config.proxy.as_ref());
        Self { config, client }
    }

    /// Get the API base URL
    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(ANTHROPIC_API_URL)
    }

    /// Build the request body for the Messages API
    fn build_request_body(&self, messages: &[WireMessage]) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "stream": true,
            "max_tokens": self.config.max_tokens,
        })
    }

    async fn stream_inner(
        &self,
        messages: &[WireMessage],
        tx: &mpsc::Sender<StreamEvent>,
        cancel: &CancellationToken,
    ) -> ChatResult<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(missing_api_key_error)?;

        let body = self.build_request_body(messages);
        let url = self.base_url();
        tracing::debug!("Anthropic stream_message POST {}", url);

        let response = self
            .client
            .post(url)
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.config.api_version)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body_text = response.text().await.map_err(|e| ChatError::Transport {
                message: e.to_string(),
            })?;
            tracing::warn!(
                "Anthropic API error: HTTP {} from {} — {}",
                status,
                url,
                body_text
            );
            return Err(parse_http_error(status, &body_text));
        }

        process_sse_stream(response.bytes_stream(), tx, cancel).await
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn stream_message(
        &self,
        messages: Vec<WireMessage>,
        tx: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> ChatResult<String> {
        let result = self.stream_inner(&messages, &tx, &cancel).await;

        // Every outcome closes the channel with exactly one terminal event.
        match &result {
            Ok(_) => {
                let _ = tx.send(StreamEvent::Complete).await;
            }
            Err(err) => {
                let _ = tx
                    .send(StreamEvent::Error {
                        message: err.to_string(),
                        code: err.code(),
                    })
                    .await;
            }
        }
        result
    }
}
