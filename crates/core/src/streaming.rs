//! Stream Event Types
//!
//! Events delivered on the adapter's output channel while a response streams
//! in. These types are shared between the provider crate (which produces
//! them) and any UI layer consuming the channel, so they carry serde tags in
//! the same `type`/snake_case shape the wire protocol uses.

use serde::{Deserialize, Serialize};

/// One event on the output channel of a streaming call.
///
/// A call produces zero or more `TextDelta` events followed by exactly one
/// terminal event: `Complete` on clean close, or `Error` on any failure.
/// After the terminal event the channel closes; no further deltas follow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Text content delta from the model
    TextDelta { content: String },

    /// Terminal error: classified API/transport failure
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },

    /// Stream complete
    Complete,
}
