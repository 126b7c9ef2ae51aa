//! MCP stdio probe: transport, correlating client, and handshake driver
//!
//! This module contains everything needed to smoke-test an MCP server over
//! stdio:
//!
//! - `types`     -- JSON-RPC 2.0 wire types and probe request shapes
//! - `transport` -- `Transport` trait, stdio implementation, test fake
//! - `client`    -- correlating JSON-RPC client and its read loop
//! - `driver`    -- the fixed probe scenario and its report
//!
//! [`connect`] wires a [`Transport`] to an [`client::RpcClient`]: it starts
//! the bridge tasks and the read loop, and hands back the client, the echo
//! channel carrying every raw server line, and a cancellation token.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub mod client;
pub mod driver;
pub mod transport;
pub mod types;

use client::{start_read_loop, RpcClient};
use transport::Transport;

/// A live probe connection: the correlating client plus the channels and
/// token that service it.
pub struct Connection {
    /// The correlating JSON-RPC client; requests go through here.
    pub client: Arc<RpcClient>,
    /// Receives every raw line of server stdout, in arrival order.
    pub echo_rx: mpsc::UnboundedReceiver<String>,
    /// Cancel to stop the read loop and fail any in-flight requests.
    pub cancel: CancellationToken,
}

/// Wire a transport to a fresh [`RpcClient`].
///
/// Three background tasks are started:
///
/// 1. An outbound bridge forwarding client messages to [`Transport::send`].
/// 2. An inbound bridge forwarding [`Transport::receive`] lines to the read
///    loop.
/// 3. The read loop itself, which echoes every line to `Connection::echo_rx`
///    and resolves correlated responses.
///
/// When the server closes its stdout the inbound bridge ends, the read loop
/// observes the closed channel, and all pending requests fail instead of
/// hanging.
pub fn connect(transport: Arc<dyn Transport>) -> Connection {
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();
    let (echo_tx, echo_rx) = mpsc::unbounded_channel::<String>();
    let cancel = CancellationToken::new();

    let client = Arc::new(RpcClient::new(out_tx));
    start_read_loop(in_rx, cancel.clone(), Arc::clone(&client), echo_tx);

    // Outbound bridge: client -> transport.
    let transport_send = Arc::clone(&transport);
    tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if let Err(e) = transport_send.send(msg).await {
                tracing::warn!("outbound bridge: transport send failed: {e}");
                break;
            }
        }
    });

    // Inbound bridge: transport -> read loop.
    tokio::spawn(async move {
        use futures::StreamExt;
        let mut stream = transport.receive();
        while let Some(line) = stream.next().await {
            if in_tx.send(line).is_err() {
                break;
            }
        }
        // Dropping in_tx here closes the read loop's inbound channel.
    });

    Connection {
        client,
        echo_rx,
        cancel,
    }
}
