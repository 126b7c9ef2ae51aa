//! Channel-backed JSON-RPC 2.0 client with id-based response correlation
//!
//! This module provides [`RpcClient`], the probe's replacement for
//! sleep-based sequencing: every request registers a waiter in a pending map
//! keyed by its UUID id, and [`start_read_loop`] resolves the waiter when
//! the matching response line arrives. Callers block on the waiter (with a
//! timeout) instead of guessing how long the server needs.
//!
//! # Design
//!
//! - Outbound messages are written to `outbound_tx` as newline-free JSON
//!   strings. The transport layer is responsible for framing.
//! - Inbound lines arrive on `inbound_rx`. The read loop first forwards the
//!   raw line to `echo_tx` (so the printer can emit it labeled, in arrival
//!   order, unmodified) and then attempts to correlate it against the
//!   pending map. Lines that are not parseable JSON, or whose id matches no
//!   outstanding request, are still echoed and then discarded.
//! - A [`tokio_util::sync::CancellationToken`] stops the read loop cleanly
//!   and drops all pending senders so that awaiting callers receive an error
//!   instead of hanging.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_util::sync::CancellationToken;

use crate::error::{McprobeError, Result};
use crate::probe::types::{JsonRpcError, JsonRpcRequest};

/// Default timeout applied to every request when the caller does not specify one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The pending-response map: request id -> waiter for the correlated reply.
type PendingMap =
    HashMap<String, oneshot::Sender<std::result::Result<serde_json::Value, JsonRpcError>>>;

/// Channel-backed JSON-RPC 2.0 client with per-request correlation.
///
/// Create one with [`RpcClient::new`], passing the outbound channel sender,
/// then call [`start_read_loop`] with the inbound receiver. Issue requests
/// with [`RpcClient::request`] and fire-and-forget notifications with
/// [`RpcClient::notify`].
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
/// use tokio_util::sync::CancellationToken;
/// use mcprobe::probe::client::{start_read_loop, RpcClient};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let (out_tx, _out_rx) = mpsc::unbounded_channel::<String>();
///     let (_in_tx, in_rx) = mpsc::unbounded_channel::<String>();
///     let (echo_tx, _echo_rx) = mpsc::unbounded_channel::<String>();
///     let token = CancellationToken::new();
///     let client = Arc::new(RpcClient::new(out_tx));
///     let _handle = start_read_loop(in_rx, token, Arc::clone(&client), echo_tx);
///     Ok(())
/// }
/// ```
pub struct RpcClient {
    /// In-flight requests waiting for a response, keyed by UUID id.
    pending: Arc<Mutex<PendingMap>>,
    /// Channel used to send serialized JSON-RPC messages to the transport.
    outbound_tx: mpsc::UnboundedSender<String>,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient").finish_non_exhaustive()
    }
}

impl RpcClient {
    /// Create a new `RpcClient`.
    ///
    /// The caller is responsible for wiring `outbound_rx` to a transport
    /// writer and calling [`start_read_loop`] with the inbound receiver.
    pub fn new(outbound_tx: mpsc::UnboundedSender<String>) -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            outbound_tx,
        }
    }

    /// Send a JSON-RPC request and await the correlated response.
    ///
    /// Generates a fresh UUID id, registers the waiter, serializes the
    /// request to a single line, sends it, and blocks until the matching
    /// response arrives or the timeout elapses.
    ///
    /// # Arguments
    ///
    /// * `method` - The JSON-RPC method name.
    /// * `params` - Parameters to serialize into the `params` field.
    /// * `timeout` - Optional timeout; defaults to [`DEFAULT_REQUEST_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns [`McprobeError::Transport`] if the outbound channel is closed
    /// or the read loop exits before the response arrives.
    /// Returns [`McprobeError::Timeout`] if no response arrives in time.
    /// Returns [`McprobeError::Rpc`] if the server returns an error object.
    pub async fn request<P: serde::Serialize + Send>(
        &self,
        method: &str,
        params: P,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value> {
        let request = JsonRpcRequest::new(method, params)?;
        let id = request
            .id
            .as_ref()
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| McprobeError::Transport("request built without an id".to_string()))?;

        // Register the waiter before sending so the response can never
        // arrive before we are ready to receive it.
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(id.clone(), tx);
        }

        let message = serde_json::to_string(&request)?;
        if self.outbound_tx.send(message).is_err() {
            // Clean up the orphaned waiter.
            self.pending.lock().await.remove(&id);
            return Err(McprobeError::Transport("outbound channel closed".to_string()).into());
        }

        let deadline = timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let outcome = match tokio::time::timeout(deadline, rx).await {
            Ok(outcome) => outcome,
            Err(_) => {
                // The server never answered; drop the stale waiter so a late
                // reply is discarded rather than resolving a finished step.
                self.pending.lock().await.remove(&id);
                return Err(McprobeError::Timeout {
                    method: method.to_string(),
                    seconds: deadline.as_secs(),
                }
                .into());
            }
        };

        // The oneshot was dropped (read loop exited) before a response arrived.
        let rpc_result = outcome.map_err(|_| {
            McprobeError::Transport("read loop exited before response arrived".to_string())
        })?;

        rpc_result.map_err(|e| {
            McprobeError::Rpc {
                code: e.code,
                message: e.message,
            }
            .into()
        })
    }

    /// Send a JSON-RPC notification (no response expected).
    ///
    /// Notifications have no `id` field and the server MUST NOT reply.
    ///
    /// # Errors
    ///
    /// Returns [`McprobeError::Transport`] if the outbound channel is closed.
    pub fn notify<P: serde::Serialize + Send>(&self, method: &str, params: P) -> Result<()> {
        let message = serde_json::to_string(&JsonRpcRequest::notification(method, params)?)?;
        self.outbound_tx
            .send(message)
            .map_err(|_| McprobeError::Transport("outbound channel closed".to_string()))?;
        Ok(())
    }
}

/// Start the read loop as a background Tokio task.
///
/// For every line received on `inbound_rx` the loop:
///
/// 1. Forwards the raw line to `echo_tx`, unmodified, in arrival order. The
///    printer task on the other end labels and prints it. Echoing never
///    depends on the line being valid JSON.
/// 2. Attempts to parse the line as a JSON-RPC response and resolve the
///    pending waiter whose id matches. Unparseable lines, responses with
///    unknown ids, and server notifications are logged at debug level and
///    discarded.
///
/// On cancellation, or when `inbound_rx` closes (the server exited), all
/// pending senders are dropped so any in-flight `request()` receives a
/// channel-closed error rather than blocking until its timeout.
///
/// # Arguments
///
/// * `inbound_rx` - Receiver for inbound lines from the transport.
/// * `cancellation` - Token used to stop the loop gracefully.
/// * `client` - Shared reference to the client whose pending map to service.
/// * `echo_tx` - Sink receiving every raw line for labeled printing.
///
/// # Returns
///
/// A [`tokio::task::JoinHandle`] for the background task.
pub fn start_read_loop(
    mut inbound_rx: mpsc::UnboundedReceiver<String>,
    cancellation: CancellationToken,
    client: Arc<RpcClient>,
    echo_tx: mpsc::UnboundedSender<String>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;

                _ = cancellation.cancelled() => {
                    // Drop all pending senders so that callers receive a
                    // channel-closed error instead of waiting forever.
                    let mut pending = client.pending.lock().await;
                    pending.clear();
                    break;
                }

                maybe_line = inbound_rx.recv() => {
                    let raw = match maybe_line {
                        Some(s) => s,
                        None => {
                            // End of stream: the server closed stdout.
                            let mut pending = client.pending.lock().await;
                            pending.clear();
                            break;
                        }
                    };

                    // Echo first; correlation failures must not suppress output.
                    let _ = echo_tx.send(raw.clone());

                    dispatch_line(&raw, &client).await;
                }
            }
        }
    })
}

/// Attempt to correlate one inbound line against the pending map.
///
/// Extracted from the loop body to keep `start_read_loop` readable and to
/// allow direct unit testing of the dispatch logic.
async fn dispatch_line(raw: &str, client: &Arc<RpcClient>) {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("read loop: inbound line is not JSON ({e}); echoed and discarded");
            return;
        }
    };

    let Some(id) = value.get("id").and_then(|v| v.as_str()).map(str::to_string) else {
        // Notifications and responses with non-string ids cannot belong to
        // one of our requests (we only ever send UUID string ids).
        let method = value.get("method").and_then(|m| m.as_str()).unwrap_or("?");
        tracing::debug!("read loop: uncorrelatable message (method={method}); discarded");
        return;
    };

    let tx = {
        let mut pending = client.pending.lock().await;
        pending.remove(&id)
    };

    let Some(tx) = tx else {
        tracing::debug!("read loop: response for unknown id {id}; discarded");
        return;
    };

    let outcome: std::result::Result<serde_json::Value, JsonRpcError> =
        if let Some(error_val) = value.get("error") {
            match serde_json::from_value::<JsonRpcError>(error_val.clone()) {
                Ok(e) => Err(e),
                Err(_) => Err(JsonRpcError {
                    code: -32603,
                    message: format!("malformed error object: {error_val}"),
                    data: None,
                }),
            }
        } else {
            Ok(value
                .get("result")
                .cloned()
                .unwrap_or(serde_json::Value::Null))
        };

    // Ignore send errors: the caller may have already timed out.
    let _ = tx.send(outcome);
}
