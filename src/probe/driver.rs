//! The fixed probe scenario and its report
//!
//! [`ProbeDriver`] runs the handshake and probe sequence against a wired
//! [`RpcClient`], in order: `initialize`, the `initialized` notification,
//! `capabilities.get`, `tools/list`, and `tools/call`.
//!
//! Sequencing is driven by correlated responses, not timing: `initialized`
//! is only sent once the `initialize` reply has actually arrived, and every
//! probe step waits for its own reply (or a timeout) before the next request
//! goes out. Fixed sleeps between requests would give no guarantee the
//! handshake had completed before `tools/call` was issued.
//!
//! A smoke probe reports everything it saw, so a JSON-RPC error or timeout
//! on a post-handshake step is recorded and the run continues. A failed
//! `initialize` aborts the scenario: nothing after it is meaningful.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{McprobeError, Result};
use crate::probe::client::RpcClient;
use crate::probe::types::{
    CallToolParams, ClientCapabilities, Implementation, InitializeParams, METHOD_CAPABILITIES_GET,
    METHOD_INITIALIZE, METHOD_INITIALIZED, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
};

/// How a single probe step ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The server answered with a `result`.
    Ok(serde_json::Value),
    /// The server answered with a JSON-RPC error object.
    RpcError {
        /// Numeric JSON-RPC error code.
        code: i64,
        /// Server-supplied error message.
        message: String,
    },
    /// No response arrived within the step's timeout window.
    Timeout {
        /// The window that elapsed, in seconds.
        seconds: u64,
    },
}

impl StepOutcome {
    /// True when the step received a successful result.
    pub fn is_ok(&self) -> bool {
        matches!(self, StepOutcome::Ok(_))
    }
}

/// One entry in the probe report.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// The JSON-RPC method this step invoked.
    pub method: String,
    /// How the step ended.
    pub outcome: StepOutcome,
}

/// The aggregated outcome of a probe run.
#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    /// Per-step outcomes, in scenario order.
    pub steps: Vec<StepReport>,
    /// The protocol revision the server reported in `initialize`, verbatim.
    pub protocol_version: Option<String>,
    /// The server identity reported in `initialize`, verbatim.
    pub server_info: Option<serde_json::Value>,
}

impl ProbeReport {
    /// Overall pass criterion: the handshake and the tool invocation both
    /// succeeded. The middle probes (`capabilities.get`, `tools/list`) are
    /// informational; some servers reject `capabilities.get` outright.
    pub fn passed(&self) -> bool {
        let ok = |method: &str| {
            self.steps
                .iter()
                .any(|s| s.method == method && s.outcome.is_ok())
        };
        ok(METHOD_INITIALIZE) && ok(METHOD_TOOLS_CALL)
    }

    fn step(&self, method: &str) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.method == method)
    }

    /// True when the run stopped after a failed `initialize`.
    pub fn aborted(&self) -> bool {
        self.step(METHOD_INITIALIZE)
            .map(|s| !s.outcome.is_ok())
            .unwrap_or(false)
    }
}

/// Runs the fixed probe scenario against a wired [`RpcClient`].
#[derive(Debug)]
pub struct ProbeDriver {
    client: Arc<RpcClient>,
    /// Identity advertised in `initialize`.
    client_info: Implementation,
    /// Protocol revision advertised in `initialize`.
    protocol_version: String,
    /// Timeout for handshake and list probes.
    request_timeout: Duration,
    /// Timeout for `tools/call`; tool responses may be slow.
    call_timeout: Duration,
}

impl ProbeDriver {
    /// Create a driver for the given client.
    ///
    /// # Arguments
    ///
    /// * `client` - A connected client (see [`crate::probe::connect`]).
    /// * `client_info` - Identity advertised in `initialize`.
    /// * `protocol_version` - Protocol revision advertised in `initialize`.
    /// * `request_timeout` - Per-step wait for handshake and list probes.
    /// * `call_timeout` - Wait for the `tools/call` reply.
    pub fn new(
        client: Arc<RpcClient>,
        client_info: Implementation,
        protocol_version: String,
        request_timeout: Duration,
        call_timeout: Duration,
    ) -> Self {
        Self {
            client,
            client_info,
            protocol_version,
            request_timeout,
            call_timeout,
        }
    }

    /// Run the full scenario: handshake, capability probes, tool call.
    ///
    /// # Arguments
    ///
    /// * `tool` - Name of the tool to invoke in the `tools/call` step.
    /// * `arguments` - JSON argument payload for the tool.
    ///
    /// # Errors
    ///
    /// Returns an error only on transport failure (closed channels, dead
    /// read loop). JSON-RPC errors and timeouts are recorded as step
    /// outcomes, not propagated.
    pub async fn run(&self, tool: &str, arguments: serde_json::Value) -> Result<ProbeReport> {
        let mut report = ProbeReport::default();

        // Step 1: initialize, awaited. No request leaves before this is
        // answered.
        let init = self
            .probe_step(
                METHOD_INITIALIZE,
                InitializeParams {
                    protocol_version: self.protocol_version.clone(),
                    client_info: self.client_info.clone(),
                    capabilities: ClientCapabilities::default(),
                },
                self.request_timeout,
            )
            .await?;

        if let StepOutcome::Ok(result) = &init.outcome {
            report.protocol_version = result
                .get("protocolVersion")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            report.server_info = result.get("serverInfo").cloned();
        }
        let initialized_ok = init.outcome.is_ok();
        report.steps.push(init);

        if !initialized_ok {
            tracing::warn!("initialize failed; aborting probe scenario");
            return Ok(report);
        }

        // Step 2: confirm the handshake. Fire-and-forget by protocol, but
        // only sent now that the initialize reply is in hand.
        self.client.notify(METHOD_INITIALIZED, serde_json::json!({}))?;
        tracing::info!("handshake complete, server accepted initialize");

        // Steps 3 and 4: capability probes. Errors are informational.
        let caps = self
            .probe_step(
                METHOD_CAPABILITIES_GET,
                serde_json::json!({}),
                self.request_timeout,
            )
            .await?;
        report.steps.push(caps);

        let tools = self
            .probe_step(
                METHOD_TOOLS_LIST,
                serde_json::json!({}),
                self.request_timeout,
            )
            .await?;
        report.steps.push(tools);

        // Step 5: invoke the tool on the long timeout window.
        let call = self
            .probe_step(
                METHOD_TOOLS_CALL,
                CallToolParams {
                    name: tool.to_string(),
                    arguments,
                },
                self.call_timeout,
            )
            .await?;
        report.steps.push(call);

        Ok(report)
    }

    /// Issue one request and fold its outcome into a [`StepReport`].
    ///
    /// JSON-RPC errors and timeouts become step outcomes; transport errors
    /// propagate.
    async fn probe_step<P: serde::Serialize + Send>(
        &self,
        method: &str,
        params: P,
        timeout: Duration,
    ) -> Result<StepReport> {
        tracing::debug!("probe step: {method}");
        let outcome = match self.client.request(method, params, Some(timeout)).await {
            Ok(result) => StepOutcome::Ok(result),
            Err(e) => match e.downcast_ref::<McprobeError>() {
                Some(McprobeError::Rpc { code, message }) => StepOutcome::RpcError {
                    code: *code,
                    message: message.clone(),
                },
                Some(McprobeError::Timeout { seconds, .. }) => {
                    StepOutcome::Timeout { seconds: *seconds }
                }
                _ => return Err(e),
            },
        };

        Ok(StepReport {
            method: method.to_string(),
            outcome,
        })
    }
}
