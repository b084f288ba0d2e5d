//! Frame Assembler
//!
//! Reconstructs complete JSON payloads from the line-delimited event stream.
//! A payload may arrive split across several `data:` lines, back-to-back with
//! another payload, or interleaved with SSE metadata lines; the assembler is
//! an explicit state machine (`Empty` / `Buffering`) with one entry point
//! `feed`, plus a `finish` drain for stream end.
//!
//! Chunk-boundary reassembly happens one layer up: the processor holds the
//! line remainder between chunks and only feeds complete lines here.

use serde_json::Value;
use tracing::{debug, warn};

/// Event marker prefixing data lines.
const DATA_PREFIX: &str = "data:";

/// Stream-terminator sentinel carried on a data line.
const DONE_SENTINEL: &str = "[DONE]";

/// One output of the frame assembler.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutput {
    /// A complete, parseable JSON payload.
    Payload(Value),
    /// A line carrying an explicit error indicator that is not JSON.
    ErrorLine(String),
    /// Buffered content that never looked like JSON, surfaced as raw
    /// incremental text (protocol tolerance).
    RawText(String),
    /// The terminator sentinel was observed.
    Done,
}

/// Buffer state for an in-progress, not-yet-parseable payload.
#[derive(Debug, Default)]
enum BufferState {
    #[default]
    Empty,
    Buffering(String),
}

/// Reassembles JSON payloads from complete lines.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    state: BufferState,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one complete line.
    ///
    /// Returns zero, one, or two outputs; two when a stale fragment is
    /// flushed ahead of a lexically valid successor (the two never merge).
    pub fn feed(&mut self, line: &str) -> Vec<FrameOutput> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        if let Some(rest) = trimmed.strip_prefix(DATA_PREFIX) {
            let rest = rest.trim_start();
            if rest == DONE_SENTINEL {
                // Terminator resets any in-progress fragment.
                self.state = BufferState::Empty;
                return vec![FrameOutput::Done];
            }
            return self.feed_payload(rest);
        }

        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            // Bare JSON line without the event marker: joins an open buffer,
            // otherwise parsed standalone.
            if matches!(self.state, BufferState::Buffering(_)) {
                return self.feed_payload(trimmed);
            }
            return match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => vec![FrameOutput::Payload(value)],
                Err(err) => {
                    debug!("discarding unparseable bare JSON line: {err}");
                    Vec::new()
                }
            };
        }

        if trimmed.contains("error") {
            // Explicit error indicator outside any payload; the open buffer
            // is discarded.
            self.state = BufferState::Empty;
            return vec![FrameOutput::ErrorLine(trimmed.to_string())];
        }

        // SSE metadata (event:, id:, comments) carries no payload.
        debug!("ignoring non-payload line: {trimmed}");
        Vec::new()
    }

    /// Drain the assembler at stream end.
    pub fn finish(&mut self) -> Vec<FrameOutput> {
        self.flush_buffer()
    }

    fn feed_payload(&mut self, payload: &str) -> Vec<FrameOutput> {
        match serde_json::from_str::<Value>(payload) {
            Ok(value) => {
                // A stale fragment never merges with a lexically valid
                // successor: it is flushed on its own first.
                let mut outputs = self.flush_buffer();
                outputs.push(FrameOutput::Payload(value));
                outputs
            }
            Err(_) => {
                let mut buffer = match std::mem::take(&mut self.state) {
                    BufferState::Buffering(buffer) => buffer,
                    BufferState::Empty => String::new(),
                };
                buffer.push_str(payload);

                match serde_json::from_str::<Value>(&buffer) {
                    Ok(value) => vec![FrameOutput::Payload(value)],
                    Err(_) => {
                        self.state = BufferState::Buffering(buffer);
                        Vec::new()
                    }
                }
            }
        }
    }

    /// Dispose of any buffered fragment: parse it if it completes, surface
    /// it as raw text if it never looked like JSON, otherwise drop it.
    fn flush_buffer(&mut self) -> Vec<FrameOutput> {
        match std::mem::take(&mut self.state) {
            BufferState::Empty => Vec::new(),
            BufferState::Buffering(buffer) => match serde_json::from_str::<Value>(&buffer) {
                Ok(value) => vec![FrameOutput::Payload(value)],
                Err(_) if !looks_like_json(&buffer) => vec![FrameOutput::RawText(buffer)],
                Err(err) => {
                    warn!(
                        "dropping unterminated JSON fragment ({} bytes): {err}",
                        buffer.len()
                    );
                    Vec::new()
                }
            },
        }
    }
}

fn looks_like_json(content: &str) -> bool {
    let trimmed = content.trim_start();
    trimmed.starts_with('{') || trimmed.starts_with('[')
}
