//! Bounded chunk pipe connecting adjacent pipeline stages.
//!
//! Single producer, single consumer, with backpressure: the writer awaits
//! when the channel is full, the reader awaits when it is empty. Dropping
//! or closing the write end signals end-of-stream; dropping the read end
//! turns further writes into broken pipes. Bytes arrive in write order,
//! exactly once.

use async_trait::async_trait;
use std::io;

use tokio::sync::mpsc;

use crate::io::{ChunkRead, ChunkWrite};

/// Default number of in-flight chunks per pipe.
pub const PIPE_CHUNK_CAPACITY: usize = 16;

/// Create a connected pipe pair with room for `capacity` in-flight chunks.
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (PipeWriter { tx: Some(tx) }, PipeReader { rx })
}

/// Create a pipe pair with the default capacity.
pub fn pipe_default() -> (PipeWriter, PipeReader) {
    pipe(PIPE_CHUNK_CAPACITY)
}

/// Write end of a pipe.
pub struct PipeWriter {
    tx: Option<mpsc::Sender<Vec<u8>>>,
}

#[async_trait]
impl ChunkWrite for PipeWriter {
    async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        let Some(tx) = &self.tx else {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "pipe write end already closed",
            ));
        };
        tx.send(chunk.to_vec())
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader closed"))
    }

    async fn close(&mut self) -> io::Result<()> {
        self.tx = None;
        Ok(())
    }
}

impl std::fmt::Debug for PipeWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeWriter")
            .field("closed", &self.tx.is_none())
            .finish()
    }
}

/// Read end of a pipe.
pub struct PipeReader {
    rx: mpsc::Receiver<Vec<u8>>,
}

#[async_trait]
impl ChunkRead for PipeReader {
    async fn read(&mut self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.rx.recv().await)
    }
}

impl std::fmt::Debug for PipeReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeReader").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn chunks_arrive_in_write_order() {
        let (mut writer, mut reader) = pipe(8);

        writer.write(b"first").await.unwrap();
        writer.write(b"second").await.unwrap();
        writer.close().await.unwrap();

        assert_eq!(reader.read().await.unwrap(), Some(b"first".to_vec()));
        assert_eq!(reader.read().await.unwrap(), Some(b"second".to_vec()));
        assert_eq!(reader.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn dropping_writer_signals_eof() {
        let (writer, mut reader) = pipe(8);
        drop(writer);
        assert_eq!(reader.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn writing_after_reader_drop_is_broken_pipe() {
        let (mut writer, reader) = pipe(8);
        drop(reader);
        let err = writer.write(b"data").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn writing_after_close_is_an_error() {
        let (mut writer, _reader) = pipe(8);
        writer.close().await.unwrap();
        let err = writer.write(b"late").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn full_pipe_applies_backpressure_without_loss() {
        let (mut writer, mut reader) = pipe(2);

        let write_task = tokio::spawn(async move {
            for i in 0u32..100 {
                writer.write(&i.to_le_bytes()).await.unwrap();
            }
            // Writer dropped here — EOF.
        });

        let mut total = Vec::new();
        while let Some(chunk) = reader.read().await.unwrap() {
            total.extend_from_slice(&chunk);
        }
        write_task.await.unwrap();

        assert_eq!(total.len(), 400);
        let expected: Vec<u8> = (0u32..100).flat_map(|i| i.to_le_bytes()).collect();
        assert_eq!(total, expected);
    }

    /// A slow consumer with a fast producer must not hang or drop chunks.
    #[tokio::test]
    async fn stress_small_capacity_no_hang() {
        let result = tokio::time::timeout(Duration::from_secs(5), async {
            let (mut writer, mut reader) = pipe(1);

            let write_task = tokio::spawn(async move {
                let chunk = vec![0xABu8; 37];
                for _ in 0..1000 {
                    writer.write(&chunk).await.unwrap();
                }
            });

            let mut total = 0usize;
            while let Some(chunk) = reader.read().await.unwrap() {
                total += chunk.len();
            }
            write_task.await.unwrap();
            assert_eq!(total, 37 * 1000);
        })
        .await;

        assert!(result.is_ok(), "pipe stress test timed out");
    }

    #[tokio::test]
    async fn empty_writes_are_skipped() {
        let (mut writer, mut reader) = pipe(8);
        writer.write(b"").await.unwrap();
        writer.write(b"real").await.unwrap();
        writer.close().await.unwrap();
        assert_eq!(reader.read().await.unwrap(), Some(b"real".to_vec()));
        assert_eq!(reader.read().await.unwrap(), None);
    }
}
