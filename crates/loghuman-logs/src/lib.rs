//! Log processing for loghuman
//!
//! This crate turns JSON log lines into terminal-friendly text: decoding a
//! line as the selected record shape, rendering it, and driving a whole
//! input stream with raw passthrough for anything that does not decode.

mod decoder;
mod error;
mod reader;
mod render;
mod stream;

pub use decoder::LogDecoder;
pub use error::{DecodeError, StreamError};
pub use reader::LineReader;
pub use render::Renderer;
pub use stream::{LineOutput, StreamDriver, StreamStats};

// Re-export types used in our public API
pub use loghuman_types::{LogRecord, RunConfig, Variant};
