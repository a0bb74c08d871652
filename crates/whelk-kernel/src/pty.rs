//! Pseudo-terminal device model.
//!
//! A [`Pty`] is the controlling side of a simulated terminal: one write-in
//! stream broadcast to every registered observer ([`PtyTarget`]), and one
//! read-in stream fed by observer writes.
//!
//! ```text
//!   Pty::write ──▶ target 1 read-out
//!              └─▶ target 2 read-out        (fan-out)
//!   target N write ──▶ Pty::read            (funnel-in)
//! ```
//!
//! When the output-mode flag is set, writes in both directions rewrite
//! every line feed to carriage-return + line-feed. Observer registration is
//! append-only for the PTY's lifetime; a shell session owns a small,
//! mostly-static set of observers, so targets are never pruned.

use async_trait::async_trait;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::io::{ChunkRead, ChunkWrite};

const LF: u8 = 0x0A;
const CR: u8 = 0x0D;

/// Rewrite every LF to CR LF.
///
/// Scans once to count line feeds, allocates the exact `n + k` output, then
/// copies — the buffer never grows during the copy.
pub fn lf_to_crlf(input: &[u8]) -> Vec<u8> {
    let lf_count = input.iter().filter(|&&b| b == LF).count();
    let mut output = Vec::with_capacity(input.len() + lf_count);
    for &byte in input {
        if byte == LF {
            output.push(CR);
        }
        output.push(byte);
    }
    output
}

/// Controlling side of the terminal device.
pub struct Pty {
    output_nlcr: Arc<AtomicBool>,
    inbound_tx: mpsc::UnboundedSender<Vec<u8>>,
    inbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    targets: Vec<mpsc::UnboundedSender<Vec<u8>>>,
}

impl Pty {
    /// Create a PTY with LF→CRLF output rewriting enabled.
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            output_nlcr: Arc::new(AtomicBool::new(true)),
            inbound_tx,
            inbound_rx,
            targets: Vec::new(),
        }
    }

    /// Enable or disable LF→CRLF rewriting for both directions.
    pub fn set_output_nlcr(&self, enabled: bool) {
        self.output_nlcr.store(enabled, Ordering::Relaxed);
    }

    /// Register a new observer. Targets live as long as the PTY.
    pub fn open_target(&mut self) -> PtyTarget {
        let (tx, rx) = mpsc::unbounded_channel();
        self.targets.push(tx);
        PtyTarget {
            output_nlcr: self.output_nlcr.clone(),
            outbound_rx: rx,
            inbound_tx: self.inbound_tx.clone(),
        }
    }

    /// Write a chunk: rewritten per the output mode, then enqueued to every
    /// registered observer. Observers that are gone are skipped.
    pub fn write(&self, chunk: &[u8]) {
        let data = if self.output_nlcr.load(Ordering::Relaxed) {
            lf_to_crlf(chunk)
        } else {
            chunk.to_vec()
        };
        for target in &self.targets {
            let _ = target.send(data.clone());
        }
    }

    /// Write a string; normalized to bytes first.
    pub fn write_str(&self, text: &str) {
        self.write(text.as_bytes());
    }

    /// Read the next chunk funneled in from any observer's writes.
    ///
    /// `None` once every target's write side is gone.
    pub async fn read(&mut self) -> Option<Vec<u8>> {
        self.inbound_rx.recv().await
    }
}

impl Default for Pty {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of the terminal device.
///
/// Reads see everything the controller writes; writes funnel back into the
/// controller's single read-in stream.
pub struct PtyTarget {
    output_nlcr: Arc<AtomicBool>,
    outbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    inbound_tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl PtyTarget {
    /// Read the next chunk of controller output. `None` when the PTY is
    /// gone.
    pub async fn read(&mut self) -> Option<Vec<u8>> {
        self.outbound_rx.recv().await
    }

    /// Write a chunk toward the controller, applying the owning PTY's
    /// output mode.
    pub fn write(&self, chunk: &[u8]) {
        let data = if self.output_nlcr.load(Ordering::Relaxed) {
            lf_to_crlf(chunk)
        } else {
            chunk.to_vec()
        };
        let _ = self.inbound_tx.send(data);
    }

    /// Write a string; normalized to bytes first.
    pub fn write_str(&self, text: &str) {
        self.write(text.as_bytes());
    }

    /// Split into chunk-stream halves usable as session externs.
    pub fn split(self) -> (PtyTargetReader, PtyTargetWriter) {
        (
            PtyTargetReader {
                outbound_rx: self.outbound_rx,
            },
            PtyTargetWriter {
                output_nlcr: self.output_nlcr,
                inbound_tx: self.inbound_tx,
            },
        )
    }
}

/// [`ChunkRead`] half of a split target.
pub struct PtyTargetReader {
    outbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

#[async_trait]
impl ChunkRead for PtyTargetReader {
    async fn read(&mut self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.outbound_rx.recv().await)
    }
}

/// [`ChunkWrite`] half of a split target.
pub struct PtyTargetWriter {
    output_nlcr: Arc<AtomicBool>,
    inbound_tx: mpsc::UnboundedSender<Vec<u8>>,
}

#[async_trait]
impl ChunkWrite for PtyTargetWriter {
    async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        let data = if self.output_nlcr.load(Ordering::Relaxed) {
            lf_to_crlf(chunk)
        } else {
            chunk.to_vec()
        };
        self.inbound_tx
            .send(data)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "pty closed"))
    }

    async fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"a\nb\n".as_slice(), b"a\r\nb\r\n".as_slice())]
    #[case(b"no feeds".as_slice(), b"no feeds".as_slice())]
    #[case(b"\n".as_slice(), b"\r\n".as_slice())]
    #[case(b"".as_slice(), b"".as_slice())]
    #[case(b"\n\n\n".as_slice(), b"\r\n\r\n\r\n".as_slice())]
    fn lf_rewrite_cases(#[case] input: &[u8], #[case] expected: &[u8]) {
        assert_eq!(lf_to_crlf(input), expected);
    }

    #[test]
    fn rewrite_output_is_exactly_n_plus_k_bytes() {
        let input = b"one\ntwo\nthree";
        let output = lf_to_crlf(input);
        assert_eq!(output.len(), input.len() + 2);
        assert_eq!(output.capacity(), input.len() + 2);
    }

    #[tokio::test]
    async fn controller_writes_fan_out_to_all_targets() {
        let mut pty = Pty::new();
        pty.set_output_nlcr(false);
        let mut first = pty.open_target();
        let mut second = pty.open_target();

        pty.write(b"broadcast");
        assert_eq!(first.read().await, Some(b"broadcast".to_vec()));
        assert_eq!(second.read().await, Some(b"broadcast".to_vec()));
    }

    #[tokio::test]
    async fn target_registered_after_a_write_misses_it() {
        let mut pty = Pty::new();
        pty.set_output_nlcr(false);
        let mut early = pty.open_target();
        pty.write(b"first");
        let mut late = pty.open_target();
        pty.write(b"second");

        assert_eq!(early.read().await, Some(b"first".to_vec()));
        assert_eq!(early.read().await, Some(b"second".to_vec()));
        assert_eq!(late.read().await, Some(b"second".to_vec()));
    }

    #[tokio::test]
    async fn target_writes_funnel_into_controller() {
        let mut pty = Pty::new();
        pty.set_output_nlcr(false);
        let a = pty.open_target();
        let b = pty.open_target();

        a.write(b"from a");
        b.write(b"from b");
        assert_eq!(pty.read().await, Some(b"from a".to_vec()));
        assert_eq!(pty.read().await, Some(b"from b".to_vec()));
    }

    #[tokio::test]
    async fn output_mode_rewrites_both_directions() {
        let mut pty = Pty::new();
        let mut target = pty.open_target();

        pty.write_str("out\n");
        assert_eq!(target.read().await, Some(b"out\r\n".to_vec()));

        target.write_str("in\n");
        assert_eq!(pty.read().await, Some(b"in\r\n".to_vec()));
    }

    #[tokio::test]
    async fn split_halves_carry_the_same_streams() {
        let mut pty = Pty::new();
        pty.set_output_nlcr(false);
        let (mut reader, mut writer) = pty.open_target().split();

        pty.write(b"down");
        assert_eq!(ChunkRead::read(&mut reader).await.unwrap(), Some(b"down".to_vec()));

        writer.write(b"up").await.unwrap();
        assert_eq!(pty.read().await, Some(b"up".to_vec()));
    }
}
