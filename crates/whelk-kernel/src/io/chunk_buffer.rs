//! Chunk-buffering reader with exact-length reads.
//!
//! Underlying sources hand out chunks of arbitrary size. [`ChunkBuffer`]
//! lets a consumer ask for either "whatever is next" or "exactly N bytes",
//! carrying leftover bytes between calls. No byte is ever dropped or
//! duplicated: a chunk that overruns an exact-length read is split and the
//! remainder pushed back for the next call.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;

use super::traits::{BoxRead, ChunkRead};

/// Buffering adapter over a chunked byte source.
pub struct ChunkBuffer {
    delegate: BoxRead,
    chunks: VecDeque<Vec<u8>>,
}

impl ChunkBuffer {
    /// Wrap `delegate`.
    pub fn new(delegate: BoxRead) -> Self {
        Self {
            delegate,
            chunks: VecDeque::new(),
        }
    }

    /// Total bytes currently buffered.
    fn buffered_len(&self) -> usize {
        self.chunks.iter().map(|c| c.len()).sum()
    }

    /// Read the next available chunk.
    ///
    /// With nothing buffered, the delegate's next chunk is returned verbatim
    /// (no copy). Otherwise everything buffered is merged into one chunk and
    /// the buffer cleared.
    pub async fn read_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        if self.chunks.is_empty() {
            return self.delegate.read().await;
        }
        let mut merged = Vec::with_capacity(self.buffered_len());
        while let Some(chunk) = self.chunks.pop_front() {
            merged.extend_from_slice(&chunk);
        }
        Ok(Some(merged))
    }

    /// Fill `buf` completely before returning.
    ///
    /// Accumulates delegate chunks until enough bytes are buffered, then
    /// copies byte-for-byte. The final source chunk is split if it overruns
    /// the target, and the remainder kept for the next call. Fails with
    /// [`io::ErrorKind::UnexpectedEof`] if the source ends first.
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        while self.buffered_len() < buf.len() {
            match self.delegate.read().await? {
                Some(chunk) => {
                    if !chunk.is_empty() {
                        self.chunks.push_back(chunk);
                    }
                }
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "source ended before the requested length",
                    ));
                }
            }
        }

        let mut offset = 0;
        while offset < buf.len() {
            // Exhausting the queue here contradicts the length check above.
            let Some(mut chunk) = self.chunks.pop_front() else {
                panic!("chunk buffer accounting desynchronized");
            };
            if offset + chunk.len() > buf.len() {
                let take = buf.len() - offset;
                let rest = chunk.split_off(take);
                self.chunks.push_front(rest);
            }
            buf[offset..offset + chunk.len()].copy_from_slice(&chunk);
            offset += chunk.len();
        }
        Ok(())
    }
}

#[async_trait]
impl ChunkRead for ChunkBuffer {
    async fn read(&mut self) -> io::Result<Option<Vec<u8>>> {
        self.read_chunk().await
    }
}

/// The stdin shape handed to command bodies: a [`ChunkBuffer`] plus
/// collection conveniences.
pub struct CommandInput {
    buffer: ChunkBuffer,
}

impl CommandInput {
    /// Wrap a base reader.
    pub fn new(delegate: BoxRead) -> Self {
        Self {
            buffer: ChunkBuffer::new(delegate),
        }
    }

    /// Read the next available chunk. `Ok(None)` is end-of-stream.
    pub async fn read(&mut self) -> io::Result<Option<Vec<u8>>> {
        self.buffer.read_chunk().await
    }

    /// Fill `buf` exactly.
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.buffer.read_exact(buf).await
    }

    /// Read until end-of-stream.
    pub async fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(chunk) = self.buffer.read_chunk().await? {
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }

    /// Read until end-of-stream as a string (lossy UTF-8).
    pub async fn read_to_string(&mut self) -> io::Result<String> {
        let bytes = self.read_to_end().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Unwrap back into a plain chunk reader. Bytes already buffered are
    /// preserved and yielded first.
    pub fn into_stream(self) -> BoxRead {
        Box::new(self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test source yielding a fixed chunk sequence.
    struct Chunks(VecDeque<Vec<u8>>);

    impl Chunks {
        fn new<const N: usize>(chunks: [&[u8]; N]) -> Box<Self> {
            Box::new(Self(chunks.iter().map(|c| c.to_vec()).collect()))
        }
    }

    #[async_trait]
    impl ChunkRead for Chunks {
        async fn read(&mut self) -> io::Result<Option<Vec<u8>>> {
            Ok(self.0.pop_front())
        }
    }

    #[tokio::test]
    async fn exact_reads_repartition_chunks_without_loss() {
        // Chunks of length [3, 5, 2]; exact reads of [4, 6] must yield the
        // first 4 and next 6 bytes of the concatenation.
        let mut buf = ChunkBuffer::new(Chunks::new([b"abc", b"defgh", b"ij"]));

        let mut first = [0u8; 4];
        buf.read_exact(&mut first).await.unwrap();
        assert_eq!(&first, b"abcd");

        let mut second = [0u8; 6];
        buf.read_exact(&mut second).await.unwrap();
        assert_eq!(&second, b"efghij");
    }

    #[tokio::test]
    async fn leftover_bytes_survive_between_calls() {
        let mut buf = ChunkBuffer::new(Chunks::new([b"abcdef"]));

        let mut head = [0u8; 2];
        buf.read_exact(&mut head).await.unwrap();
        assert_eq!(&head, b"ab");

        // The split remainder comes back merged on a plain read.
        assert_eq!(buf.read_chunk().await.unwrap(), Some(b"cdef".to_vec()));
    }

    #[tokio::test]
    async fn plain_read_passes_chunks_through_when_unbuffered() {
        let mut buf = ChunkBuffer::new(Chunks::new([b"one", b"two"]));
        assert_eq!(buf.read_chunk().await.unwrap(), Some(b"one".to_vec()));
        assert_eq!(buf.read_chunk().await.unwrap(), Some(b"two".to_vec()));
        assert_eq!(buf.read_chunk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn exact_read_past_eof_errors() {
        let mut buf = ChunkBuffer::new(Chunks::new([b"ab"]));
        let mut target = [0u8; 5];
        let err = buf.read_exact(&mut target).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn zero_length_exact_read_is_a_no_op() {
        let mut buf = ChunkBuffer::new(Chunks::new([b"xyz"]));
        let mut empty = [0u8; 0];
        buf.read_exact(&mut empty).await.unwrap();
        assert_eq!(buf.read_chunk().await.unwrap(), Some(b"xyz".to_vec()));
    }

    #[tokio::test]
    async fn command_input_collects_to_string() {
        let mut input = CommandInput::new(Chunks::new([b"hello ", b"world"]));
        assert_eq!(input.read_to_string().await.unwrap(), "hello world");
    }

    #[tokio::test]
    async fn into_stream_preserves_buffered_bytes() {
        let mut input = CommandInput::new(Chunks::new([b"abcdef"]));
        let mut head = [0u8; 1];
        input.read_exact(&mut head).await.unwrap();

        let mut rest = input.into_stream();
        assert_eq!(rest.read().await.unwrap(), Some(b"bcdef".to_vec()));
        assert_eq!(rest.read().await.unwrap(), None);
    }
}
