//! Drain-and-signal-completion adapter.

use std::io;

use tokio::task::JoinHandle;

use crate::io::{BoxRead, BoxWrite};

/// Drains a read end into a write end and exposes a completion signal.
///
/// The pipeline couples its tail pipe into the caller-supplied output sink
/// through one of these; `wait` resolving means the final byte has been
/// delivered. The destination sink is not closed — the caller owns it.
pub struct Coupler {
    handle: JoinHandle<io::Result<u64>>,
}

impl Coupler {
    /// Start draining `reader` into `writer`.
    pub fn spawn(mut reader: BoxRead, mut writer: BoxWrite) -> Self {
        let handle = tokio::spawn(async move {
            let mut total = 0u64;
            while let Some(chunk) = reader.read().await? {
                if chunk.is_empty() {
                    continue;
                }
                writer.write(&chunk).await?;
                total += chunk.len() as u64;
            }
            Ok(total)
        });
        Self { handle }
    }

    /// Wait until the source is drained; returns the bytes delivered.
    pub async fn wait(self) -> io::Result<u64> {
        self.handle
            .await
            .map_err(|e| io::Error::other(format!("coupler task failed: {e}")))?
    }
}
