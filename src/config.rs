//! Configuration management for mcprobe
//!
//! This module handles loading, parsing, validating, and merging probe
//! configuration from an optional YAML file and CLI overrides. CLI values
//! win over file values, which win over built-in defaults.

use crate::error::{McprobeError, Result};
use crate::probe::types::ADVERTISED_PROTOCOL_VERSION;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main configuration structure for a probe run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// The server process under test.
    #[serde(default)]
    pub server: ServerConfig,

    /// Identity and protocol revision advertised during the handshake.
    #[serde(default)]
    pub client: ClientConfig,

    /// Per-step wait windows.
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// The tool invoked in the `tools/call` step.
    #[serde(default)]
    pub tool: ToolConfig,
}

/// The server process to spawn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the server executable.
    #[serde(default)]
    pub command: String,

    /// Arguments selecting the server mode (e.g. `["mcp-server"]`).
    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment variables for the child process.
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Optional working directory for the child process.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

/// Identity advertised in the `initialize` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Client name sent as `clientInfo.name`.
    #[serde(default = "default_client_name")]
    pub name: String,

    /// Client version sent as `clientInfo.version`.
    #[serde(default = "default_client_version")]
    pub version: String,

    /// Protocol revision sent as `protocolVersion`, verbatim.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
}

fn default_client_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_protocol_version() -> String {
    ADVERTISED_PROTOCOL_VERSION.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: default_client_name(),
            version: default_client_version(),
            protocol_version: default_protocol_version(),
        }
    }
}

/// Per-step wait windows, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Wait for handshake and list probe replies.
    #[serde(default = "default_request_seconds")]
    pub request_seconds: u64,

    /// Wait for the `tools/call` reply; tool responses may be slow.
    #[serde(default = "default_call_seconds")]
    pub call_seconds: u64,
}

fn default_request_seconds() -> u64 {
    10
}

fn default_call_seconds() -> u64 {
    30
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_seconds: default_request_seconds(),
            call_seconds: default_call_seconds(),
        }
    }
}

/// The tool invocation for the `tools/call` step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Tool name, as advertised by `tools/list`.
    #[serde(default = "default_tool_name")]
    pub name: String,

    /// JSON argument payload for the tool.
    #[serde(default = "default_tool_arguments")]
    pub arguments: serde_json::Value,
}

fn default_tool_name() -> String {
    "echo".to_string()
}

fn default_tool_arguments() -> serde_json::Value {
    serde_json::json!({})
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            name: default_tool_name(),
            arguments: default_tool_arguments(),
        }
    }
}

impl ProbeConfig {
    /// Load configuration from an optional YAML file.
    ///
    /// When `path` is `None`, built-in defaults are returned. When `path` is
    /// `Some`, the file must exist and parse.
    ///
    /// # Errors
    ///
    /// Returns [`McprobeError::Config`] if the file cannot be read and
    /// [`McprobeError::Yaml`] if it does not parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path).map_err(|e| {
            McprobeError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: ProbeConfig = serde_yaml::from_str(&contents).map_err(McprobeError::Yaml)?;
        Ok(config)
    }

    /// Validate the merged configuration.
    ///
    /// # Errors
    ///
    /// Returns [`McprobeError::Config`] when the server command is empty,
    /// a timeout is zero, the tool name is empty, or the tool arguments are
    /// not a JSON object.
    pub fn validate(&self) -> Result<()> {
        if self.server.command.trim().is_empty() {
            return Err(McprobeError::Config(
                "server command is required (positional argument or `server.command` in the config file)"
                    .to_string(),
            )
            .into());
        }
        if self.timeouts.request_seconds == 0 || self.timeouts.call_seconds == 0 {
            return Err(McprobeError::Config("timeouts must be greater than zero".to_string()).into());
        }
        if self.tool.name.trim().is_empty() {
            return Err(McprobeError::Config("tool name must not be empty".to_string()).into());
        }
        if !self.tool.arguments.is_object() {
            return Err(
                McprobeError::Config("tool arguments must be a JSON object".to_string()).into(),
            );
        }
        Ok(())
    }
}
