//! Colloquy Core
//!
//! Foundational types for the Colloquy workspace: the stream events the
//! adapter emits on its output channel, proxy configuration shared with the
//! HTTP client factory, and the core error type. This crate has zero
//! dependencies on the provider layer (reqwest, tokio, etc.).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `proxy` - Proxy configuration data types
//! - `streaming` - Stream event types delivered on the output channel

pub mod error;
pub mod proxy;
pub mod streaming;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Proxy Types ────────────────────────────────────────────────────────
pub use proxy::{ProxyConfig, ProxyProtocol};

// ── Streaming Types ────────────────────────────────────────────────────
pub use streaming::StreamEvent;
