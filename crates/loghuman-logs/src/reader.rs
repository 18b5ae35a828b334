use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::StreamError;

/// Splits an async byte stream into lines with a bounded length.
///
/// Lines are yielded without their `\n` terminator and without one trailing
/// `\r`. A final line lacking a terminator is still yielded; empty input
/// yields nothing.
pub struct LineReader<R> {
    reader: R,
    max_line_bytes: usize,
    line_number: usize,
    done: bool,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub fn new(reader: R, max_line_bytes: usize) -> Self {
        Self {
            reader,
            max_line_bytes,
            line_number: 0,
            done: false,
        }
    }

    /// Number of lines yielded so far
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read the next line, `None` once the stream is exhausted
    pub async fn next_line(&mut self) -> Result<Option<Vec<u8>>, StreamError> {
        if self.done {
            return Ok(None);
        }

        let mut line = Vec::new();
        loop {
            let (consumed, complete) = {
                let available = match self.reader.fill_buf().await {
                    Ok(available) => available,
                    Err(e) => {
                        self.done = true;
                        return Err(StreamError::Read(e));
                    }
                };

                if available.is_empty() {
                    self.done = true;
                    if line.is_empty() {
                        return Ok(None);
                    }
                    break;
                }

                match available.iter().position(|b| *b == b'\n') {
                    Some(idx) => {
                        line.extend_from_slice(&available[..idx]);
                        (idx + 1, true)
                    }
                    None => {
                        line.extend_from_slice(available);
                        (available.len(), false)
                    }
                }
            };
            self.reader.consume(consumed);

            if line.len() > self.max_line_bytes {
                self.done = true;
                return Err(StreamError::LineTooLong {
                    line_number: self.line_number + 1,
                    max_line_bytes: self.max_line_bytes,
                });
            }

            if complete {
                break;
            }
        }

        self.line_number += 1;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    async fn collect(input: &[u8], max_line_bytes: usize) -> Result<Vec<Vec<u8>>, StreamError> {
        let mut reader = LineReader::new(input, max_line_bytes);
        let mut lines = Vec::new();
        while let Some(line) = reader.next_line().await? {
            lines.push(line);
        }
        Ok(lines)
    }

    #[tokio::test]
    async fn test_splits_lines() {
        let lines = collect(b"one\ntwo\n\nfour\n", 64).await.unwrap();
        assert_eq!(lines, vec![b"one".to_vec(), b"two".to_vec(), vec![], b"four".to_vec()]);
    }

    #[tokio::test]
    async fn test_final_line_without_newline() {
        let lines = collect(b"one\ntwo", 64).await.unwrap();
        assert_eq!(lines, vec![b"one".to_vec(), b"two".to_vec()]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        assert!(collect(b"", 64).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_strips_carriage_return() {
        let lines = collect(b"one\r\ntwo\r\n", 64).await.unwrap();
        assert_eq!(lines, vec![b"one".to_vec(), b"two".to_vec()]);
    }

    #[tokio::test]
    async fn test_line_too_long() {
        let err = collect(b"short\nthis line is too long\n", 10).await.unwrap_err();
        match err {
            StreamError::LineTooLong {
                line_number,
                max_line_bytes,
            } => {
                assert_eq!(line_number, 2);
                assert_eq!(max_line_bytes, 10);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_line_at_limit_is_accepted() {
        let lines = collect(b"0123456789\n", 10).await.unwrap();
        assert_eq!(lines, vec![b"0123456789".to_vec()]);
    }

    #[tokio::test]
    async fn test_lines_spanning_small_buffer() {
        let input: &[u8] = b"a fairly long first line\nsecond\n";
        let mut reader = LineReader::new(BufReader::with_capacity(4, input), 64);
        assert_eq!(
            reader.next_line().await.unwrap(),
            Some(b"a fairly long first line".to_vec())
        );
        assert_eq!(reader.next_line().await.unwrap(), Some(b"second".to_vec()));
        assert_eq!(reader.next_line().await.unwrap(), None);
        assert_eq!(reader.line_number(), 2);
    }
}
