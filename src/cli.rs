//! Command-line interface definition for mcprobe
//!
//! This module defines the CLI structure using clap's derive API. The probe
//! does one thing, so there are no subcommands: the server command line is
//! given positionally and everything else is flags.

use clap::Parser;
use std::path::PathBuf;

use crate::config::ProbeConfig;
use crate::error::{McprobeError, Result};

/// mcprobe - smoke-test harness for MCP servers over stdio
///
/// Spawns the server, performs the initialize/initialized handshake, probes
/// `capabilities.get` and `tools/list`, invokes one tool, and echoes every
/// line the server writes.
#[derive(Parser, Debug, Clone)]
#[command(name = "mcprobe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Server executable to spawn (may also come from the config file)
    ///
    /// Probe flags must precede it; everything after the executable is
    /// passed through to the server verbatim, flags included.
    pub server: Option<String>,

    /// Arguments passed to the server executable (e.g. `mcp-server`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub server_args: Vec<String>,

    /// Path to a YAML probe configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Tool to invoke in the tools/call step
    #[arg(short, long)]
    pub tool: Option<String>,

    /// Tool arguments as a JSON object
    #[arg(long, value_name = "JSON")]
    pub args: Option<String>,

    /// Timeout in seconds for handshake and list probes
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Timeout in seconds for the tools/call reply
    #[arg(long, value_name = "SECS")]
    pub call_timeout: Option<u64>,

    /// Extra environment variable for the server (KEY=VALUE, repeatable)
    #[arg(short, long, value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Working directory for the server process
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Fold CLI overrides into a loaded [`ProbeConfig`].
    ///
    /// CLI values win over file values. `--args` is parsed as JSON here so
    /// malformed payloads fail before the server is spawned.
    ///
    /// # Errors
    ///
    /// Returns [`McprobeError::Config`] if `--args` is not valid JSON or an
    /// `--env` entry is missing the `=` separator.
    pub fn apply_to(&self, config: &mut ProbeConfig) -> Result<()> {
        if let Some(server) = &self.server {
            config.server.command = server.clone();
            config.server.args = self.server_args.clone();
        }
        if let Some(cwd) = &self.cwd {
            config.server.working_dir = Some(cwd.clone());
        }
        for entry in &self.env {
            let (key, value) = entry.split_once('=').ok_or_else(|| {
                McprobeError::Config(format!("invalid --env entry `{entry}`, expected KEY=VALUE"))
            })?;
            config
                .server
                .env
                .insert(key.to_string(), value.to_string());
        }
        if let Some(tool) = &self.tool {
            config.tool.name = tool.clone();
        }
        if let Some(args) = &self.args {
            config.tool.arguments = serde_json::from_str(args).map_err(|e| {
                McprobeError::Config(format!("--args is not valid JSON: {e}"))
            })?;
        }
        if let Some(timeout) = self.timeout {
            config.timeouts.request_seconds = timeout;
        }
        if let Some(call_timeout) = self.call_timeout {
            config.timeouts.call_seconds = call_timeout;
        }
        Ok(())
    }
}
