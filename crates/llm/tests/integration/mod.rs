//! Integration Tests Module
//!
//! End-to-end tests for the colloquy-llm crate: session orchestration over a
//! scripted provider, and the wire-message export behavior the remote
//! protocol depends on.

// Session lifecycle over a scripted provider
mod session_test;
