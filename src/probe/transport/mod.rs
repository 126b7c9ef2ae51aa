//! Transport abstraction for the probe
//!
//! This module defines the [`Transport`] trait the probe drives its server
//! process through. The only production implementation is
//! [`stdio::StdioTransport`], which spawns a child process and exchanges
//! newline-delimited JSON over its stdin/stdout pipes. A scripted
//! [`fake::FakeTransport`] exists for driver unit tests (cfg(test) only).
//!
//! # Design
//!
//! The trait is intentionally minimal: callers `send` a serialized JSON-RPC
//! string and `receive` a stream of serialized JSON-RPC strings (one per
//! logical message). Framing is the responsibility of the implementation.
//!
//! The `receive_err` stream carries diagnostic output (the child's stderr).
//! Diagnostic output is never treated as an error condition.

use std::pin::Pin;

use futures::Stream;

use crate::error::Result;

/// Abstraction over the probe's server connection.
///
/// All methods are `async` or return pinned [`Stream`]s so implementations
/// can drive I/O without blocking the Tokio executor.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Send a complete JSON-RPC message string to the server.
    ///
    /// The string MUST be a single, complete JSON object with no embedded
    /// newline. The transport appends whatever framing the medium requires
    /// (a trailing `\n` for stdio).
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::McprobeError::Transport`] if the underlying
    /// I/O operation fails.
    async fn send(&self, message: String) -> Result<()>;

    /// Returns a stream of inbound message lines from the server.
    ///
    /// Each item is one line of server stdout with the trailing newline
    /// stripped. The stream ends when the server closes its stdout.
    fn receive(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>>;

    /// Returns a stream of diagnostic lines (the server's stderr).
    fn receive_err(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>>;
}

pub mod stdio;

#[cfg(test)]
pub mod fake;
