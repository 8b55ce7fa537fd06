//! Wire-level error shaping.
//!
//! Every error response is JSON `{error, reason?}` with one of the stable
//! kind strings below. Internal detail (paths, parser positions) stays in
//! the logs and never reaches the wire.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

pub const MISSING_HEADER: &str = "MissingHeader";
pub const INVALID_REQUEST: &str = "InvalidRequest";
pub const POLICY_VIOLATION: &str = "PolicyViolation";
pub const ADAPTER_NOT_FOUND: &str = "AdapterNotFound";
pub const ADAPTER_ERROR: &str = "AdapterError";
pub const RELOAD_FAILED: &str = "ReloadFailed";

/// The JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Build a JSON error response with the given status, kind, and reason.
pub fn error_response(status: StatusCode, kind: &str, reason: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: kind.to_string(),
            reason: Some(reason.into()),
        }),
    )
        .into_response()
}

/// Relay an adapter's status code and body verbatim, as JSON.
pub fn relay_response(status: u16, body: axum::body::Bytes) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}
