//! Colloquy LLM
//!
//! Streaming chat adapter for an Anthropic-style text-generation API:
//! - incremental frame assembly over the SSE byte stream
//! - event extraction across the heterogeneous shapes the endpoint emits
//! - an observable conversation history with the alternation/deduplication
//!   invariants the wire protocol requires
//! - the chat session orchestrator tying request, stream, and history
//!   together
//!
//! Also includes the HTTP client factory and the provider trait seam.

pub mod anthropic;
pub mod attachment;
pub mod history;
pub mod http_client;
pub mod provider;
pub mod session;
pub mod stream;
pub mod types;

// Re-export main types
pub use anthropic::AnthropicProvider;
pub use attachment::Attachment;
pub use history::{ConversationHistory, HistoryListener, ListenerId, Turn};
pub use http_client::build_http_client;
pub use provider::ChatProvider;
pub use session::ChatSession;
pub use types::*;

// Re-export the stream pipeline pieces
pub use stream::{extract, process_sse_stream, Extraction, FrameAssembler, FrameOutput};
