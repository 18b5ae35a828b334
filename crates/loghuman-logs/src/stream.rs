use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};

use crate::decoder::LogDecoder;
use crate::error::StreamError;
use crate::reader::LineReader;
use crate::render::Renderer;
use loghuman_types::RunConfig;

/// Counters reported once the input is exhausted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Lines read from the input
    pub lines: usize,
    /// Lines echoed unchanged because they did not decode
    pub passthrough: usize,
}

/// What a single input line turns into
#[derive(Debug, PartialEq, Eq)]
pub enum LineOutput<'a> {
    /// Decoded and rendered text, terminators included
    Rendered(String),
    /// The raw line, to be echoed as-is
    Passthrough(&'a [u8]),
}

impl LineOutput<'_> {
    /// Bytes to write for this line
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Rendered(text) => text.into_bytes(),
            Self::Passthrough(raw) => {
                let mut bytes = Vec::with_capacity(raw.len() + 1);
                bytes.extend_from_slice(raw);
                bytes.push(b'\n');
                bytes
            }
        }
    }
}

/// Reads log lines, reformats the ones that decode and echoes the rest
pub struct StreamDriver {
    config: RunConfig,
}

impl StreamDriver {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Decode and render one line, falling back to the raw bytes
    pub fn process_line<'a>(&self, line: &'a [u8]) -> LineOutput<'a> {
        match LogDecoder::decode(line, self.config.variant) {
            Ok(record) => LineOutput::Rendered(Renderer::render(&record)),
            Err(_) => LineOutput::Passthrough(line),
        }
    }

    /// Process the whole input, in order, until it is exhausted.
    ///
    /// Each line's output is written and flushed before the next line is
    /// read. Read and write failures end the run.
    pub async fn run<R, W>(&self, input: R, output: &mut W) -> Result<StreamStats, StreamError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = LineReader::new(input, self.config.max_line_bytes);
        let mut stats = StreamStats::default();

        while let Some(line) = lines.next_line().await? {
            stats.lines += 1;

            let rendered = self.process_line(&line);
            if matches!(rendered, LineOutput::Passthrough(_)) {
                stats.passthrough += 1;
                tracing::trace!(line_number = lines.line_number(), "passing line through");
            }

            output
                .write_all(&rendered.into_bytes())
                .await
                .map_err(StreamError::Write)?;
            output.flush().await.map_err(StreamError::Write)?;
        }

        tracing::debug!(
            lines = stats.lines,
            passthrough = stats.passthrough,
            "input exhausted"
        );
        Ok(stats)
    }
}
