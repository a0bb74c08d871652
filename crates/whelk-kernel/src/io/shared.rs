//! Cloneable stream handles.
//!
//! A session owns one terminal reader and writer but lends them to every
//! dispatch it runs. These handles wrap a stream in a shared lock so each
//! dispatch context gets its own clone while bytes still flow through the
//! single underlying stream.

use async_trait::async_trait;
use std::io;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::traits::{BoxRead, BoxWrite, ChunkRead, ChunkWrite};

/// Cloneable handle to a shared reader.
#[derive(Clone)]
pub struct SharedReader {
    inner: Arc<Mutex<BoxRead>>,
}

impl SharedReader {
    /// Wrap a reader for shared use.
    pub fn new(reader: BoxRead) -> Self {
        Self {
            inner: Arc::new(Mutex::new(reader)),
        }
    }
}

#[async_trait]
impl ChunkRead for SharedReader {
    async fn read(&mut self) -> io::Result<Option<Vec<u8>>> {
        self.inner.lock().await.read().await
    }
}

/// Cloneable handle to a shared writer.
#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<BoxWrite>>,
}

impl SharedWriter {
    /// Wrap a writer for shared use.
    pub fn new(writer: BoxWrite) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Write a string through the shared handle.
    pub async fn write_str(&self, text: &str) -> io::Result<()> {
        self.inner.lock().await.write(text.as_bytes()).await
    }
}

#[async_trait]
impl ChunkWrite for SharedWriter {
    async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.inner.lock().await.write(chunk).await
    }

    async fn close(&mut self) -> io::Result<()> {
        self.inner.lock().await.close().await
    }
}
