//! Fan-out and suppression writers for output redirection.
//!
//! With redirects present, a command's output goes to one in-memory writer
//! per redirect target while the original sink receives nothing — but still
//! sees `close`, so downstream end-of-stream semantics survive.

use async_trait::async_trait;
use std::io;

use super::traits::{BoxWrite, ChunkWrite};

/// Broadcasts every write to all delegates, in order.
pub struct MultiWriter {
    delegates: Vec<BoxWrite>,
}

impl MultiWriter {
    /// Create a fan-out over `delegates`.
    pub fn new(delegates: Vec<BoxWrite>) -> Self {
        Self { delegates }
    }
}

#[async_trait]
impl ChunkWrite for MultiWriter {
    async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        for delegate in &mut self.delegates {
            delegate.write(chunk).await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        for delegate in &mut self.delegates {
            delegate.close().await?;
        }
        Ok(())
    }
}

/// Swallows writes but forwards `close` to its delegate.
pub struct NullifyWriter {
    delegate: BoxWrite,
}

impl NullifyWriter {
    /// Wrap `delegate`, suppressing its data.
    pub fn new(delegate: BoxWrite) -> Self {
        Self { delegate }
    }
}

#[async_trait]
impl ChunkWrite for NullifyWriter {
    async fn write(&mut self, _chunk: &[u8]) -> io::Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        self.delegate.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemWriter;

    #[tokio::test]
    async fn multi_writer_reaches_every_delegate() {
        let a = MemWriter::new();
        let b = MemWriter::new();
        let mut multi = MultiWriter::new(vec![Box::new(a.clone()), Box::new(b.clone())]);

        multi.write(b"fan").await.unwrap();
        multi.write(b"out").await.unwrap();
        multi.close().await.unwrap();

        assert_eq!(a.snapshot(), b"fanout");
        assert_eq!(b.snapshot(), b"fanout");
    }

    #[tokio::test]
    async fn nullify_writer_suppresses_data_but_closes() {
        let sink = MemWriter::new();
        let mut nullified = NullifyWriter::new(Box::new(sink.clone()));

        nullified.write(b"never seen").await.unwrap();
        nullified.close().await.unwrap();

        assert!(sink.is_empty());
    }
}
