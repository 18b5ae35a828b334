use loghuman_types::Variant;
use thiserror::Error;

/// A line that cannot be read as the selected record shape.
///
/// Recovered by the stream driver, which echoes the raw line instead.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("line is not a JSON object")]
    NotAnObject,
    #[error("invalid {variant} record")]
    Json {
        variant: Variant,
        #[source]
        source: serde_json::Error,
    },
    #[error("timestamp {ts} is outside the representable range")]
    TimestampOutOfRange { ts: f64 },
}

/// Failures that end a run
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to read input")]
    Read(#[source] std::io::Error),
    #[error("line {line_number} exceeds the maximum of {max_line_bytes} bytes")]
    LineTooLong {
        line_number: usize,
        max_line_bytes: usize,
    },
    #[error("failed to write output")]
    Write(#[source] std::io::Error),
}
