//! Event Extractor
//!
//! Classifies one decoded JSON payload and extracts at most one incremental
//! text delta. The precedence order is fixed: the endpoint may emit
//! overlapping shapes for the same logical event, and the first matching
//! rule must win so the same text is never emitted through two extraction
//! paths.

use serde_json::Value;
use tracing::debug;

/// Result of classifying one decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// An incremental text delta.
    Text(String),
    /// A structured error payload, routed to error classification.
    Error(Value),
    /// Recognized but carries no displayable text (stream start/stop, ping).
    None,
}

/// Extract the text delta (or error payload) carried by one decoded event.
pub fn extract(value: &Value) -> Extraction {
    let event_type = value.get("type").and_then(Value::as_str);

    // 1. content_block_delta with a text field in the nested delta
    if event_type == Some("content_block_delta") {
        if let Some(text) = value
            .get("delta")
            .and_then(|delta| delta.get("text"))
            .and_then(Value::as_str)
        {
            return Extraction::Text(text.to_string());
        }
    }

    // 2. content_block_start whose block is delivered whole
    if event_type == Some("content_block_start") {
        if let Some(text) = value
            .get("content_block")
            .and_then(|block| block.get("text"))
            .and_then(Value::as_str)
        {
            return Extraction::Text(text.to_string());
        }
    }

    // 3. a content array of blocks, texts concatenated in array order
    if let Some(blocks) = value.get("content").and_then(Value::as_array) {
        let text: String = blocks
            .iter()
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect();
        return Extraction::Text(text);
    }

    // 4. legacy completion field, verbatim
    if let Some(completion) = value.get("completion").and_then(Value::as_str) {
        return Extraction::Text(completion.to_string());
    }

    // 5. error payload (object or string)
    if let Some(error) = value.get("error") {
        return Extraction::Error(error.clone());
    }

    debug!(
        "event carries no displayable text: type={}",
        event_type.unwrap_or("<untyped>")
    );
    Extraction::None
}
