//! The per-decision audit record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One reached decision, serialized as a single JSON line.
///
/// Field order here is the wire order. `parent_agent` is omitted from the
/// serialization when absent; every other field is always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// When the decision was reached (UTC, RFC3339).
    pub timestamp: DateTime<Utc>,
    /// Hex trace id of the active request span; empty when none is active.
    pub trace_id: String,
    /// Agent identifier from the `X-Agent-ID` header.
    pub agent_id: String,
    /// Tool name from the request path.
    pub tool: String,
    /// Action name from the request path.
    pub action: String,
    /// Whether the call was permitted.
    pub decision_allow: bool,
    /// Explanation attached to the decision.
    pub reason: String,
    /// Version of the policy that decided; zero when no policy matched.
    pub policy_version: u32,
    /// 64-hex-character SHA-256 fingerprint of the request body.
    pub params_hash: String,
    /// Wall-clock time from request start to decision, in milliseconds.
    pub latency_ms: f64,
    /// Calling agent's parent, when the `X-Parent-Agent` header was present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_agent: Option<String>,
}
