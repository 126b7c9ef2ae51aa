//! JSON-RPC 2.0 wire types and probe request shapes
//!
//! Every message the probe exchanges with the server is a single line of
//! JSON. Requests carry exactly the fields `jsonrpc`, `id`, `method`, and
//! `params`; notifications are the same shape minus `id`. Request ids are
//! freshly generated UUID v4 strings, so ids are pairwise distinct across a
//! run without any shared counter.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Protocol constants
// ---------------------------------------------------------------------------

/// The protocol revision advertised in the `initialize` request.
///
/// The probe sends this verbatim and records whatever the server replies
/// with; it performs no version negotiation.
pub const ADVERTISED_PROTOCOL_VERSION: &str = "2024-11-05";

/// Lifecycle: client sends `initialize` to open a session.
pub const METHOD_INITIALIZE: &str = "initialize";
/// Lifecycle: client confirms the handshake after `initialize` is answered.
pub const METHOD_INITIALIZED: &str = "initialized";
/// Ask the server to describe its capabilities.
pub const METHOD_CAPABILITIES_GET: &str = "capabilities.get";
/// Request the list of available tools.
pub const METHOD_TOOLS_LIST: &str = "tools/list";
/// Invoke a named tool.
pub const METHOD_TOOLS_CALL: &str = "tools/call";

/// Generate a fresh request id.
///
/// Ids are UUID v4 strings; uniqueness across the run is the only invariant
/// the wire format requires of them.
///
/// # Examples
///
/// ```
/// use mcprobe::probe::types::new_request_id;
///
/// let a = new_request_id();
/// let b = new_request_id();
/// assert_ne!(a, b);
/// ```
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 wire types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request object.
///
/// `jsonrpc` MUST always be `"2.0"`. `id` is `None` only for notifications.
///
/// # Examples
///
/// ```
/// use mcprobe::probe::types::JsonRpcRequest;
///
/// let req = JsonRpcRequest::new("tools/list", serde_json::json!({})).unwrap();
/// assert_eq!(req.jsonrpc, "2.0");
/// assert!(req.id.is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version identifier; always `"2.0"`.
    pub jsonrpc: String,
    /// Request correlation identifier. Present for requests, absent for notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    /// The method name to invoke.
    pub method: String,
    /// Method parameters. The probe always sends an object here.
    pub params: serde_json::Value,
}

impl JsonRpcRequest {
    /// Build a request with a fresh UUID id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::McprobeError::Serialization`] if `params`
    /// cannot be serialized to a JSON value.
    pub fn new<P: Serialize>(method: &str, params: P) -> crate::error::Result<Self> {
        Ok(Self {
            jsonrpc: "2.0".to_string(),
            id: Some(serde_json::Value::String(new_request_id())),
            method: method.to_string(),
            params: serde_json::to_value(params).map_err(crate::error::McprobeError::Serialization)?,
        })
    }

    /// Build a notification (a request with no `id`).
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::McprobeError::Serialization`] if `params`
    /// cannot be serialized to a JSON value.
    pub fn notification<P: Serialize>(method: &str, params: P) -> crate::error::Result<Self> {
        Ok(Self {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: method.to_string(),
            params: serde_json::to_value(params).map_err(crate::error::McprobeError::Serialization)?,
        })
    }
}

/// A JSON-RPC 2.0 response object.
///
/// Exactly one of `result` or `error` is present in a valid response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version identifier; always `"2.0"`.
    pub jsonrpc: String,
    /// Mirrors the `id` from the corresponding request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    /// Successful result value; mutually exclusive with `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error object; mutually exclusive with `result`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// A JSON-RPC 2.0 error object.
///
/// Implements `Display` as `"JSON-RPC error {code}: {message}"`.
///
/// # Examples
///
/// ```
/// use mcprobe::probe::types::JsonRpcError;
///
/// let e = JsonRpcError { code: -32601, message: "Method not found".to_string(), data: None };
/// assert_eq!(e.to_string(), "JSON-RPC error -32601: Method not found");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code as defined by JSON-RPC 2.0.
    pub code: i64,
    /// Human-readable error description.
    pub message: String,
    /// Optional additional error context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

// ---------------------------------------------------------------------------
// Handshake parameter types
// ---------------------------------------------------------------------------

/// Name and version of this client, sent in `initialize`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Implementation {
    /// Implementation name.
    pub name: String,
    /// Implementation version string.
    pub version: String,
}

impl Default for Implementation {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Capabilities advertised by the probe.
///
/// The probe consumes tools only, so this serializes as an empty object
/// unless experimental entries are added.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCapabilities {
    /// Experimental, non-standard capabilities.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Parameters for the `initialize` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol revision the client speaks.
    pub protocol_version: String,
    /// Client identity.
    pub client_info: Implementation,
    /// Capabilities the client advertises.
    pub capabilities: ClientCapabilities,
}

/// Parameters for the `tools/call` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    /// The tool name as returned by `tools/list`.
    pub name: String,
    /// JSON arguments matching the tool's input schema.
    pub arguments: serde_json::Value,
}
