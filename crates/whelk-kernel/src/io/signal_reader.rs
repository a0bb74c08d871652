//! Interrupt-aware read decorator.

use async_trait::async_trait;
use std::io;

use crate::signal::{Signal, SignalReceiver};

use super::traits::{BoxRead, ChunkRead};

/// Races every read against the dispatch's signal channel.
///
/// When an interrupt arrives while a read is pending, the read fails with
/// [`io::ErrorKind::Interrupted`] and the in-flight delegate read is
/// dropped — its partial result is never delivered to the command body.
/// The engine maps the interrupted read to exit code 130.
pub struct SignalReader {
    delegate: BoxRead,
    signals: SignalReceiver,
    /// Set once the signal channel is gone; reads then pass straight through.
    detached: bool,
}

impl SignalReader {
    /// Wrap `delegate` with a subscription taken from the dispatch's channel.
    pub fn new(delegate: BoxRead, signals: SignalReceiver) -> Self {
        Self {
            delegate,
            signals,
            detached: false,
        }
    }
}

#[async_trait]
impl ChunkRead for SignalReader {
    async fn read(&mut self) -> io::Result<Option<Vec<u8>>> {
        if self.detached {
            return self.delegate.read().await;
        }
        tokio::select! {
            result = self.delegate.read() => result,
            signal = self.signals.recv() => match signal {
                Some(Signal::Interrupt) => Err(io::Error::new(
                    io::ErrorKind::Interrupted,
                    "interrupted",
                )),
                // Channel closed: no more signals can ever arrive.
                None => {
                    self.detached = true;
                    self.delegate.read().await
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{MemReader, NullReader};
    use crate::scheduler::pipe;
    use crate::signal::SignalChannel;
    use std::time::Duration;

    #[tokio::test]
    async fn passes_data_through_without_signals() {
        let chan = SignalChannel::new();
        let mut reader = SignalReader::new(Box::new(MemReader::new(b"data".to_vec())), chan.subscribe());
        assert_eq!(reader.read().await.unwrap(), Some(b"data".to_vec()));
        assert_eq!(reader.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn interrupt_fails_a_pending_read() {
        let chan = SignalChannel::new();
        // A pipe with no writes keeps the read pending.
        let (_writer, pipe_reader) = pipe(4);
        let mut reader = SignalReader::new(Box::new(pipe_reader), chan.subscribe());

        let read_task = tokio::spawn(async move { reader.read().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        chan.emit(Signal::Interrupt);

        let result = tokio::time::timeout(Duration::from_secs(2), read_task)
            .await
            .expect("read did not resolve after interrupt")
            .unwrap();
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::Interrupted);
    }

    #[tokio::test]
    async fn closed_channel_falls_back_to_plain_reads() {
        let chan = SignalChannel::new();
        let subscription = chan.subscribe();
        drop(chan);

        let mut reader = SignalReader::new(Box::new(MemReader::new(b"ok".to_vec())), subscription);
        assert_eq!(reader.read().await.unwrap(), Some(b"ok".to_vec()));
        assert_eq!(reader.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn eof_is_still_eof_with_signals_attached() {
        let chan = SignalChannel::new();
        let mut reader = SignalReader::new(Box::new(NullReader), chan.subscribe());
        assert_eq!(reader.read().await.unwrap(), None);
    }
}
