//! Core chunked-stream traits.

use async_trait::async_trait;
use std::io;

/// A boxed chunk reader, the form streams take inside execution contexts.
pub type BoxRead = Box<dyn ChunkRead>;

/// A boxed chunk writer.
pub type BoxWrite = Box<dyn ChunkWrite>;

/// A source of byte chunks.
#[async_trait]
pub trait ChunkRead: Send + Sync {
    /// Read the next chunk. `Ok(None)` is end-of-stream.
    ///
    /// Chunk boundaries carry no meaning; callers needing exact lengths or
    /// line granularity wrap the reader (see `ChunkBuffer`,
    /// `SyncLinesReader`).
    async fn read(&mut self) -> io::Result<Option<Vec<u8>>>;
}

/// A sink for byte chunks.
#[async_trait]
pub trait ChunkWrite: Send + Sync {
    /// Write one chunk. May await backpressure.
    async fn write(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Signal end-of-stream to downstream readers.
    async fn close(&mut self) -> io::Result<()>;
}

#[async_trait]
impl ChunkRead for BoxRead {
    async fn read(&mut self) -> io::Result<Option<Vec<u8>>> {
        (**self).read().await
    }
}

#[async_trait]
impl ChunkWrite for BoxWrite {
    async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        (**self).write(chunk).await
    }

    async fn close(&mut self) -> io::Result<()> {
        (**self).close().await
    }
}

/// A reader that is always at end-of-stream.
#[derive(Debug, Default)]
pub struct NullReader;

#[async_trait]
impl ChunkRead for NullReader {
    async fn read(&mut self) -> io::Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

/// A writer that accepts and discards everything.
#[derive(Debug, Default)]
pub struct DiscardWriter;

#[async_trait]
impl ChunkWrite for DiscardWriter {
    async fn write(&mut self, _chunk: &[u8]) -> io::Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}
