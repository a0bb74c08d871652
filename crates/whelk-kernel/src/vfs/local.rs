//! Local filesystem provider.
//!
//! Rooted at a real directory; paths that escape the root are rejected.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::traits::{Filesystem, Metadata};

/// Filesystem provider over a real directory.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    /// Create a provider rooted at `root`. The root must exist and be a
    /// directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a path to an absolute path within the root.
    ///
    /// Returns an error if the path escapes the root (via `..`).
    fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        let path = path.strip_prefix("/").unwrap_or(path);
        let full = self.root.join(path);

        // Canonicalize what exists; for new files, canonicalize the parent
        // and append the filename.
        let canonical = if full.exists() {
            full.canonicalize()?
        } else {
            let parent = full
                .parent()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid path"))?;
            let filename = full
                .file_name()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid path"))?;
            if parent.exists() {
                parent.canonicalize()?.join(filename)
            } else {
                full
            }
        };

        let canonical_root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        if !canonical.starts_with(&canonical_root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "path escapes root: {} is not under {}",
                    canonical.display(),
                    canonical_root.display()
                ),
            ));
        }

        Ok(canonical)
    }
}

#[async_trait]
impl Filesystem for LocalFs {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let full = self.resolve(path)?;
        fs::read(&full).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&full, data).await
    }

    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let full = self.resolve(path)?;
        let meta = fs::metadata(&full).await?;
        Ok(Metadata {
            is_dir: meta.is_dir(),
            is_file: meta.is_file(),
            size: meta.len(),
            modified: meta.modified().ok(),
        })
    }

    async fn mkdir(&self, path: &Path) -> io::Result<()> {
        let full = self.resolve(path)?;
        fs::create_dir_all(&full).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("whelk-localfs-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp root");
        dir
    }

    #[tokio::test]
    async fn write_read_round_trip() {
        let root = temp_root("rw");
        let fs = LocalFs::new(&root);

        fs.write(Path::new("notes/a.txt"), b"local bytes").await.unwrap();
        let data = fs.read(Path::new("notes/a.txt")).await.unwrap();
        assert_eq!(data, b"local bytes");

        let meta = fs.stat(Path::new("notes/a.txt")).await.unwrap();
        assert!(meta.is_file);
        assert_eq!(meta.size, 11);
    }

    #[tokio::test]
    async fn escaping_the_root_is_rejected() {
        let root = temp_root("escape");
        let fs = LocalFs::new(&root);

        let result = fs.read(Path::new("../../etc/passwd")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn mkdir_creates_nested_directories() {
        let root = temp_root("mkdir");
        let fs = LocalFs::new(&root);

        fs.mkdir(Path::new("a/b/c")).await.unwrap();
        let meta = fs.stat(Path::new("a/b/c")).await.unwrap();
        assert!(meta.is_dir);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let root = temp_root("missing");
        let fs = LocalFs::new(&root);

        let err = fs.read(Path::new("ghost.txt")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
