//! Core filesystem trait and types.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Metadata about a file or directory.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// True if this is a directory.
    pub is_dir: bool,
    /// True if this is a file.
    pub is_file: bool,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time, if available.
    pub modified: Option<SystemTime>,
}

/// Abstract filesystem interface consumed by the execution engine.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Read the entire contents of a file.
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write data to a file, creating it if it doesn't exist.
    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Get metadata for a file or directory. Fails with
    /// [`io::ErrorKind::NotFound`] for missing paths.
    async fn stat(&self, path: &Path) -> io::Result<Metadata>;

    /// Create a directory (and parent directories if needed).
    async fn mkdir(&self, path: &Path) -> io::Result<()>;

    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> bool {
        self.stat(path).await.is_ok()
    }

    /// True if this provider reports missing paths with POSIX-style error
    /// codes; false if errors carry provider-specific codes callers must
    /// translate.
    fn posix_error_codes(&self) -> bool {
        true
    }
}
