//! Stream Processing
//!
//! The frame assembler, the event extractor, and the processing loop that
//! drives transport bytes through both.

pub mod extractor;
pub mod framer;
pub mod processor;

pub use extractor::{extract, Extraction};
pub use framer::{FrameAssembler, FrameOutput};
pub use processor::process_sse_stream;
