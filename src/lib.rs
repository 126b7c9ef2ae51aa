//! mcprobe - smoke-test harness for MCP servers over stdio
//!
//! This library provides the building blocks for probing an external MCP
//! server process that speaks JSON-RPC 2.0 over stdin/stdout.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `probe`: transport, correlating JSON-RPC client, and the handshake driver
//! - `config`: probe configuration loading and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use mcprobe::probe::driver::ProbeDriver;
//! use mcprobe::probe::transport::stdio::StdioTransport;
//! use mcprobe::probe::types::Implementation;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let transport = StdioTransport::spawn(
//!         "codex".into(),
//!         vec!["mcp-server".into()],
//!         Default::default(),
//!         None,
//!     )?;
//!     let conn = mcprobe::probe::connect(Arc::new(transport));
//!     let driver = ProbeDriver::new(
//!         Arc::clone(&conn.client),
//!         Implementation::default(),
//!         "2024-11-05".to_string(),
//!         Duration::from_secs(10),
//!         Duration::from_secs(30),
//!     );
//!     let report = driver.run("codex", serde_json::json!({"prompt": "hi"})).await?;
//!     println!("passed: {}", report.passed());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod probe;

// Re-export commonly used types
pub use config::ProbeConfig;
pub use error::{McprobeError, Result};
pub use probe::driver::{ProbeDriver, ProbeReport, StepOutcome, StepReport};
