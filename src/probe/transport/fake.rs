//! In-process fake transport for probe unit tests
//!
//! [`FakeTransport`] and [`FakeTransportHandle`] are an in-process pair that
//! replace the spawned server in tests. The test reads what the probe sent
//! via `handle.outbound_rx` and injects scripted server lines via
//! `handle.inbound_tx`.
//!
//! ```text
//! probe send() -------> outbound_tx -----> outbound_rx (handle reads)
//! handle inbound_tx --> inbound_tx  -----> inbound_rx  (probe receive())
//! ```

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use tokio::sync::{mpsc, Mutex};

use crate::error::Result;
use crate::probe::transport::Transport;

/// In-process fake transport for use in tests.
///
/// Implements the full [`Transport`] trait using in-memory channels, so
/// tests can drive the probe without spawning a real server process.
#[derive(Debug)]
pub struct FakeTransport {
    /// Sender side for `send()`; drained by the handle's `outbound_rx`.
    outbound_tx: mpsc::UnboundedSender<String>,
    /// Shared receiver for the inbound channel; exposed via `receive()`.
    inbound_rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    /// Sender used by `inject_response()` to push messages onto the inbound
    /// channel without going through the handle.
    inbound_inject_tx: mpsc::UnboundedSender<String>,
}

impl FakeTransport {
    /// Create a new `(FakeTransport, FakeTransportHandle)` pair.
    pub fn new() -> (Self, FakeTransportHandle) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<String>();

        let transport = Self {
            outbound_tx,
            inbound_rx: Arc::new(Mutex::new(inbound_rx)),
            inbound_inject_tx: inbound_tx.clone(),
        };

        let handle = FakeTransportHandle {
            outbound_rx,
            inbound_tx,
        };

        (transport, handle)
    }

    /// Inject a [`serde_json::Value`] as a server line.
    ///
    /// The value is serialized and pushed onto the inbound channel, so the
    /// next item from [`Transport::receive`] will be it.
    ///
    /// # Panics
    ///
    /// Panics if the inbound channel has been closed.
    pub fn inject_response(&self, response: serde_json::Value) {
        let serialized =
            serde_json::to_string(&response).expect("FakeTransport: failed to serialize response");
        self.inbound_inject_tx
            .send(serialized)
            .expect("FakeTransport: inbound channel closed before inject_response");
    }
}

/// The test-side handle for a [`FakeTransport`].
///
/// Read messages the probe sent via `outbound_rx.recv().await`; inject
/// server lines the probe will receive via `inbound_tx.send(...)`.
#[derive(Debug)]
pub struct FakeTransportHandle {
    /// Receives every message the probe sends.
    pub outbound_rx: mpsc::UnboundedReceiver<String>,
    /// Injects lines for the probe to receive.
    pub inbound_tx: mpsc::UnboundedSender<String>,
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn send(&self, message: String) -> Result<()> {
        self.outbound_tx.send(message).map_err(|e| {
            anyhow::anyhow!(crate::error::McprobeError::Transport(format!(
                "fake outbound channel closed: {}",
                e
            )))
        })
    }

    fn receive(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>> {
        let rx = Arc::clone(&self.inbound_rx);
        Box::pin(futures::stream::unfold(rx, |rx| async move {
            let mut guard = rx.lock().await;
            let item = guard.recv().await?;
            drop(guard);
            Some((item, rx))
        }))
    }

    fn receive_err(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>> {
        Box::pin(futures::stream::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_send_is_observable_on_handle() {
        let (transport, mut handle) = FakeTransport::new();
        transport
            .send(r#"{"jsonrpc":"2.0","id":"x","method":"tools/list","params":{}}"#.to_string())
            .await
            .unwrap();
        let sent = handle.outbound_rx.recv().await.unwrap();
        assert!(sent.contains("tools/list"));
    }

    #[tokio::test]
    async fn test_injected_response_arrives_on_receive() {
        let (transport, _handle) = FakeTransport::new();
        transport.inject_response(serde_json::json!({
            "jsonrpc": "2.0",
            "id": "x",
            "result": {}
        }));
        let received = transport.receive().next().await.unwrap();
        assert!(received.contains("result"));
    }

    #[tokio::test]
    async fn test_receive_err_is_empty() {
        let (transport, _handle) = FakeTransport::new();
        let item = transport.receive_err().next().await;
        assert!(item.is_none());
    }
}
