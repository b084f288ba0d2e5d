//! Stream Processor
//!
//! Drives the transport byte stream through the frame assembler and event
//! extractor, forwarding each extracted delta to the output channel. One
//! cooperative loop per call: suspension only while awaiting the next chunk,
//! cancellation stops the read loop and discards buffered fragments.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use colloquy_core::streaming::StreamEvent;

use super::extractor::{extract, Extraction};
use super::framer::{FrameAssembler, FrameOutput};
use crate::provider::{classify_api_error, classify_error_line};
use crate::types::{ChatError, ChatResult};

/// Whether the stream keeps going after an output was handled.
#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Done,
}

/// Consume an SSE byte stream to completion.
///
/// Emits a `TextDelta` on the channel for every extracted delta and returns
/// the accumulated response text. A recognized error payload terminates the
/// loop immediately with `ChatError::Api`; the caller emits the terminal
/// channel event for both outcomes.
pub async fn process_sse_stream<S, E>(
    mut byte_stream: S,
    tx: &mpsc::Sender<StreamEvent>,
    cancel: &CancellationToken,
) -> ChatResult<String>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    let mut framer = FrameAssembler::new();
    let mut line_buffer: Vec<u8> = Vec::new();
    let mut accumulated = String::new();

    'read: loop {
        let chunk = tokio::select! {
            // Cancellation wins over a ready chunk.
            biased;
            _ = cancel.cancelled() => return Err(ChatError::Cancelled),
            next = byte_stream.next() => match next {
                None => break 'read,
                Some(Ok(chunk)) => chunk,
                Some(Err(err)) => {
                    return Err(ChatError::Transport {
                        message: err.to_string(),
                    })
                }
            },
        };

        line_buffer.extend_from_slice(&chunk);

        // Drain complete lines; the remainder stays buffered as raw bytes
        // until the next chunk, so a multi-byte character split at a chunk
        // boundary survives. A line is never assumed complete at chunk end.
        while let Some(line_end) = line_buffer.iter().position(|&byte| byte == b'\n') {
            let line_bytes: Vec<u8> = line_buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&line_bytes[..line_end]);

            for output in framer.feed(&line) {
                if handle_output(output, tx, &mut accumulated).await? == Flow::Done {
                    break 'read;
                }
            }
        }
    }

    // The final line may arrive without a trailing newline.
    if !line_buffer.is_empty() {
        let line = String::from_utf8_lossy(&line_buffer).into_owned();
        for output in framer.feed(&line) {
            if handle_output(output, tx, &mut accumulated).await? == Flow::Done {
                return Ok(accumulated);
            }
        }
    }
    for output in framer.finish() {
        handle_output(output, tx, &mut accumulated).await?;
    }

    Ok(accumulated)
}

async fn handle_output(
    output: FrameOutput,
    tx: &mpsc::Sender<StreamEvent>,
    accumulated: &mut String,
) -> ChatResult<Flow> {
    match output {
        FrameOutput::Payload(value) => match extract(&value) {
            Extraction::Text(text) => {
                send_delta(tx, accumulated, text).await;
                Ok(Flow::Continue)
            }
            Extraction::Error(payload) => {
                let (message, code) = classify_api_error(&payload);
                Err(ChatError::Api { message, code })
            }
            Extraction::None => Ok(Flow::Continue),
        },
        FrameOutput::RawText(text) => {
            send_delta(tx, accumulated, text).await;
            Ok(Flow::Continue)
        }
        FrameOutput::ErrorLine(line) => Err(ChatError::Api {
            message: classify_error_line(&line),
            code: None,
        }),
        FrameOutput::Done => Ok(Flow::Done),
    }
}

async fn send_delta(tx: &mpsc::Sender<StreamEvent>, accumulated: &mut String, text: String) {
    if text.is_empty() {
        return;
    }
    accumulated.push_str(&text);
    let _ = tx.send(StreamEvent::TextDelta { content: text }).await;
}
