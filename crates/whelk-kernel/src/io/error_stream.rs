//! Shared error stream for pipeline stages.
//!
//! Every stage of a dispatch writes error text concurrently; the session
//! owns the receiving side and drains it to the real error sink. The handle
//! is a cloneable unbounded channel sender, so it crosses `tokio::spawn`
//! boundaries without locking.

use tokio::sync::mpsc;

/// Cloneable handle for writing error text.
#[derive(Clone, Debug)]
pub struct ErrorStream {
    tx: mpsc::UnboundedSender<String>,
}

/// Receiving end, owned by the session.
#[derive(Debug)]
pub struct ErrorSink {
    rx: mpsc::UnboundedReceiver<String>,
}

/// Create a connected error stream pair.
pub fn error_stream() -> (ErrorStream, ErrorSink) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ErrorStream { tx }, ErrorSink { rx })
}

impl ErrorStream {
    /// Write error text.
    ///
    /// Non-blocking. If the session has dropped the sink the text is
    /// discarded, the same as writing to a closed pipe.
    pub fn write(&self, text: &str) {
        if !text.is_empty() {
            let _ = self.tx.send(text.to_string());
        }
    }
}

impl ErrorSink {
    /// Wait for the next piece of error text. `None` once every handle is
    /// gone.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Collect everything currently pending into one string, without
    /// blocking.
    pub fn drain(&mut self) -> String {
        let mut out = String::new();
        while let Ok(text) = self.rx.try_recv() {
            out.push_str(&text);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn text_flows_handle_to_sink() {
        let (stream, mut sink) = error_stream();
        stream.write("first\n");
        stream.clone().write("second\n");
        assert_eq!(sink.drain(), "first\nsecond\n");
    }

    #[tokio::test]
    async fn dropped_sink_discards_silently() {
        let (stream, sink) = error_stream();
        drop(sink);
        stream.write("nobody listening");
    }

    #[tokio::test]
    async fn empty_writes_are_skipped() {
        let (stream, mut sink) = error_stream();
        stream.write("");
        stream.write("real");
        assert_eq!(sink.recv().await.as_deref(), Some("real"));
    }
}
