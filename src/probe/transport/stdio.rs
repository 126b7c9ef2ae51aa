//! Stdio transport for the probed server process
//!
//! [`StdioTransport`] spawns the server executable and communicates with it
//! over its stdin/stdout pipes using newline-delimited JSON framing.
//!
//! # Protocol
//!
//! - Outbound messages are written to the child's stdin as a single JSON
//!   object followed by a newline (`\n`) and flushed immediately, so the
//!   server observes each request without buffering delay.
//! - Inbound messages are read from the child's stdout, one JSON object per
//!   line (newline stripped before delivery).
//! - The child's stderr is drained line-by-line and logged at `DEBUG`;
//!   stderr output is diagnostic only, never an error condition.
//!
//! # Lifecycle
//!
//! The transport is created via [`StdioTransport::spawn`]. Three background
//! Tokio tasks are started immediately: one feeds stdin, one drains stdout,
//! one drains stderr. When the [`StdioTransport`] is dropped, a best-effort
//! SIGTERM (Unix) or `start_kill` (non-Unix) is sent to the child process.

use std::collections::HashMap;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;

use futures::Stream;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex};

use crate::error::{McprobeError, Result};
use crate::probe::transport::Transport;

/// Stdio-based transport that drives the server child process.
///
/// Communication happens over the child's stdin (outbound) and stdout
/// (inbound) using newline-delimited JSON.
///
/// # Examples
///
/// ```no_run
/// use std::collections::HashMap;
/// use mcprobe::probe::transport::stdio::StdioTransport;
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let transport = StdioTransport::spawn(
///     "codex".into(),
///     vec!["mcp-server".into()],
///     HashMap::new(),
///     None,
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StdioTransport {
    /// Sender side of the stdin channel; `send()` writes here.
    stdin_tx: mpsc::UnboundedSender<String>,
    /// Shared receiver for stdout lines (one JSON message per line).
    stdout_rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    /// Shared receiver for stderr lines (diagnostics only).
    stderr_rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    /// Handle to the spawned child process; used by `Drop`.
    child: Arc<Mutex<Child>>,
}

impl StdioTransport {
    /// Spawn the server process and wire up stdio pipes.
    ///
    /// The caller-supplied `env` map is layered on top of the inherited
    /// environment. If `working_dir` is `Some`, the child's working
    /// directory is set accordingly.
    ///
    /// # Arguments
    ///
    /// * `executable` - Path to the server executable.
    /// * `args` - Command-line arguments selecting the server mode.
    /// * `env` - Extra environment variables for the child process.
    /// * `working_dir` - Optional working directory for the child process.
    ///
    /// # Errors
    ///
    /// Returns [`McprobeError::Transport`] immediately if the process cannot
    /// be spawned (e.g. the executable is absent) or if the stdio pipes are
    /// unavailable. A missing executable fails fast; it never hangs.
    pub fn spawn(
        executable: PathBuf,
        args: Vec<String>,
        env: HashMap<String, String>,
        working_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let mut cmd = Command::new(&executable);
        cmd.args(&args);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.envs(&env);
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            McprobeError::Transport(format!(
                "failed to spawn MCP server `{}`: {}",
                executable.display(),
                e
            ))
        })?;

        // Take ownership of all three stdio handles. Each is guaranteed to be
        // Some because we set Stdio::piped() above.
        let stdin = child.stdin.take().ok_or_else(|| {
            McprobeError::Transport("child stdin unavailable after spawn".into())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            McprobeError::Transport("child stdout unavailable after spawn".into())
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            McprobeError::Transport("child stderr unavailable after spawn".into())
        })?;

        // Channel for writing to child stdin.
        let (stdin_tx, mut stdin_rx) = mpsc::unbounded_channel::<String>();

        // Channel pair for inbound stdout lines.
        let (stdout_tx, stdout_rx) = mpsc::unbounded_channel::<String>();

        // Channel pair for inbound stderr lines (diagnostics).
        let (stderr_tx, stderr_rx) = mpsc::unbounded_channel::<String>();

        // Background task: forward stdin_rx -> child stdin, one line per
        // message, flushed so the server sees it immediately.
        tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(msg) = stdin_rx.recv().await {
                let line = format!("{}\n", msg);
                if stdin.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if stdin.flush().await.is_err() {
                    break;
                }
            }
        });

        // Background task: drain child stdout -> stdout_tx.
        tokio::spawn(async move {
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if stdout_tx.send(line).is_err() {
                    break;
                }
            }
        });

        // Background task: drain child stderr -> stderr_tx + tracing log.
        tokio::spawn(async move {
            let reader = BufReader::new(stderr);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!(
                    target: "mcprobe::probe::transport::stdio",
                    "server stderr: {}",
                    line
                );
                if stderr_tx.send(line).is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            stdin_tx,
            stdout_rx: Arc::new(Mutex::new(stdout_rx)),
            stderr_rx: Arc::new(Mutex::new(stderr_rx)),
            child: Arc::new(Mutex::new(child)),
        })
    }
}

#[async_trait::async_trait]
impl Transport for StdioTransport {
    /// Send a JSON-RPC message to the server via its stdin.
    ///
    /// # Errors
    ///
    /// Returns [`McprobeError::Transport`] if the internal channel is closed
    /// (i.e. the background writer task has exited).
    async fn send(&self, message: String) -> Result<()> {
        self.stdin_tx.send(message).map_err(|e| {
            anyhow::anyhow!(McprobeError::Transport(format!(
                "stdin channel closed: {}",
                e
            )))
        })
    }

    /// Returns a stream of lines received from the server's stdout.
    fn receive(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>> {
        let rx = Arc::clone(&self.stdout_rx);
        Box::pin(futures::stream::unfold(rx, |rx| async move {
            let mut guard = rx.lock().await;
            let item = guard.recv().await?;
            drop(guard);
            Some((item, rx))
        }))
    }

    /// Returns a stream of diagnostic lines from the server's stderr.
    fn receive_err(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>> {
        let rx = Arc::clone(&self.stderr_rx);
        Box::pin(futures::stream::unfold(rx, |rx| async move {
            let mut guard = rx.lock().await;
            let item = guard.recv().await?;
            drop(guard);
            Some((item, rx))
        }))
    }
}

impl Drop for StdioTransport {
    /// Best-effort termination of the child process on drop.
    ///
    /// On Unix, sends SIGTERM to the child PID via `libc::kill`. On
    /// non-Unix platforms, calls `start_kill()` on the child handle. This
    /// method MUST NOT block.
    fn drop(&mut self) {
        // Skip the kill if the lock is contended; the OS reaps the child
        // when the probe process exits anyway.
        if let Ok(child) = self.child.try_lock() {
            #[cfg(unix)]
            {
                if let Some(pid) = child.id() {
                    // SAFETY: pid is a valid process ID obtained from tokio::process::Child.
                    unsafe {
                        libc::kill(pid as libc::pid_t, libc::SIGTERM);
                    }
                }
            }
            #[cfg(not(unix))]
            {
                let _ = child.start_kill();
            }
        }
    }
}
