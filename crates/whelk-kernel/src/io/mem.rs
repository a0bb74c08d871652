//! In-memory readers and writers.

use async_trait::async_trait;
use std::io;
use std::sync::{Arc, Mutex};

use super::traits::{ChunkRead, ChunkWrite};

/// Reader over an owned byte buffer: one chunk, then end-of-stream.
///
/// Used for input redirects (the target file's full contents stand in for
/// the inherited stdin).
#[derive(Debug)]
pub struct MemReader {
    data: Option<Vec<u8>>,
}

impl MemReader {
    /// Create a reader over `data`.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        Self {
            data: if data.is_empty() { None } else { Some(data) },
        }
    }
}

#[async_trait]
impl ChunkRead for MemReader {
    async fn read(&mut self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.data.take())
    }
}

/// Accumulating writer with a cloneable shared buffer.
///
/// Every clone appends to the same buffer, so the engine can hand a clone
/// into a stream chain and read the accumulated bytes back afterwards —
/// command-substitution capture and output-redirect staging both work this
/// way.
#[derive(Debug, Clone, Default)]
pub struct MemWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the accumulated bytes.
    pub fn snapshot(&self) -> Vec<u8> {
        self.buf.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Take the accumulated bytes as a string (lossy UTF-8), clearing the
    /// buffer.
    pub fn take_string(&self) -> String {
        let mut buf = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        let bytes = std::mem::take(&mut *buf);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Accumulated length in bytes.
    pub fn len(&self) -> usize {
        self.buf.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ChunkWrite for MemWriter {
    async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.buf
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(chunk);
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mem_reader_yields_one_chunk_then_eof() {
        let mut r = MemReader::new(b"hello".to_vec());
        assert_eq!(r.read().await.unwrap(), Some(b"hello".to_vec()));
        assert_eq!(r.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_mem_reader_is_immediate_eof() {
        let mut r = MemReader::new(Vec::new());
        assert_eq!(r.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn mem_writer_accumulates_across_clones() {
        let writer = MemWriter::new();
        let mut clone = writer.clone();
        clone.write(b"abc").await.unwrap();
        clone.write(b"def").await.unwrap();
        assert_eq!(writer.snapshot(), b"abcdef");
    }

    #[tokio::test]
    async fn take_string_clears_the_buffer() {
        let mut writer = MemWriter::new();
        writer.write(b"result\n").await.unwrap();
        assert_eq!(writer.take_string(), "result\n");
        assert!(writer.is_empty());
    }
}
