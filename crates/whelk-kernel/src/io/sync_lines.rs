//! Whole-line read granularity.

use async_trait::async_trait;
use std::io;

use super::traits::{BoxRead, ChunkRead};

/// Buffers delegate chunks and releases only complete lines.
///
/// For commands that declare line-granular input: every chunk this reader
/// returns ends with a line feed, except an unterminated tail released at
/// end-of-stream.
pub struct SyncLinesReader {
    delegate: BoxRead,
    buffer: Vec<u8>,
    eof: bool,
}

impl SyncLinesReader {
    /// Wrap `delegate`.
    pub fn new(delegate: BoxRead) -> Self {
        Self {
            delegate,
            buffer: Vec::new(),
            eof: false,
        }
    }
}

#[async_trait]
impl ChunkRead for SyncLinesReader {
    async fn read(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            if let Some(pos) = self.buffer.iter().rposition(|&b| b == b'\n') {
                let rest = self.buffer.split_off(pos + 1);
                let lines = std::mem::replace(&mut self.buffer, rest);
                return Ok(Some(lines));
            }
            if self.eof {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(std::mem::take(&mut self.buffer)));
            }
            match self.delegate.read().await? {
                Some(chunk) => self.buffer.extend_from_slice(&chunk),
                None => self.eof = true,
            }
        }
    }
}
