//! Error types for mcprobe
//!
//! This module defines all error types used throughout the probe,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for mcprobe operations
///
/// This enum encompasses all possible errors that can occur while
/// spawning the server process, exchanging JSON-RPC messages, and
/// loading probe configuration.
#[derive(Error, Debug)]
pub enum McprobeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level errors (spawn failure, closed pipes, dead channels)
    #[error("Transport error: {0}")]
    Transport(String),

    /// A request timed out waiting for the correlated response
    #[error("Timed out waiting for response to `{method}` after {seconds}s")]
    Timeout {
        /// The JSON-RPC method that went unanswered
        method: String,
        /// The timeout window that elapsed
        seconds: u64,
    },

    /// The server returned a JSON-RPC error object
    #[error("JSON-RPC error {code}: {message}")]
    Rpc {
        /// Numeric JSON-RPC error code
        code: i64,
        /// Human-readable error description from the server
        message: String,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for mcprobe operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = McprobeError::Config("missing server command".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: missing server command"
        );
    }

    #[test]
    fn test_transport_error_display() {
        let error = McprobeError::Transport("stdin channel closed".to_string());
        assert_eq!(error.to_string(), "Transport error: stdin channel closed");
    }

    #[test]
    fn test_timeout_error_display() {
        let error = McprobeError::Timeout {
            method: "tools/call".to_string(),
            seconds: 30,
        };
        let s = error.to_string();
        assert!(s.contains("tools/call"));
        assert!(s.contains("30s"));
    }

    #[test]
    fn test_rpc_error_display() {
        let error = McprobeError::Rpc {
            code: -32601,
            message: "Method not found".to_string(),
        };
        assert_eq!(error.to_string(), "JSON-RPC error -32601: Method not found");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let error: McprobeError = io_error.into();
        assert!(matches!(error, McprobeError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
        let error: McprobeError = json_error.into();
        assert!(matches!(error, McprobeError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("a: : b").unwrap_err();
        let error: McprobeError = yaml_error.into();
        assert!(matches!(error, McprobeError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<McprobeError>();
    }
}
