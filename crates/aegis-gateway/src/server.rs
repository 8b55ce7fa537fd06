//! The request orchestrator: HTTP surface and per-call sequence.
//!
//! `POST /tools/{tool}/{action}` fuses header parsing, body capture, policy
//! evaluation, adapter forwarding, timing, and audit emission. The policy
//! check always precedes the adapter lookup: a tool nobody configured still
//! produces a `PolicyViolation` through the no-match path, never a `404`.
//! `GET /health` and `POST /policies/reload` round out the surface.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{error, field, info_span, Instrument, Span};
use uuid::Uuid;

use aegis_audit::{AuditEmitter, AuditRecord};
use aegis_policy::{hasher, Evaluator, PolicyStore};
use aegis_types::AegisError;

use crate::adapters::{target_url, AdapterRouter};
use crate::wire::{
    error_response, relay_response, ADAPTER_ERROR, ADAPTER_NOT_FOUND, INVALID_REQUEST,
    MISSING_HEADER, POLICY_VIOLATION, RELOAD_FAILED,
};

/// Hard deadline for the complete adapter round-trip.
const ADAPTER_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared state for all request handlers.
pub struct GatewayState {
    store: Arc<PolicyStore>,
    evaluator: Evaluator,
    adapters: AdapterRouter,
    emitter: Arc<AuditEmitter>,
    client: reqwest::Client,
}

impl GatewayState {
    /// Assemble the gateway from its collaborators.
    ///
    /// The HTTP client is built once and pooled across requests, with the
    /// adapter deadline applied to every outbound call.
    pub fn new(
        store: Arc<PolicyStore>,
        adapters: AdapterRouter,
        emitter: Arc<AuditEmitter>,
    ) -> Result<Self, AegisError> {
        let client = reqwest::Client::builder()
            .timeout(ADAPTER_TIMEOUT)
            .build()
            .map_err(|e| AegisError::GatewayError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            store,
            evaluator: Evaluator::new(),
            adapters,
            emitter,
            client,
        })
    }
}

/// Build the gateway router over the shared state.
pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/tools/{tool}/{action}", post(handle_tool_request))
        .route("/health", get(handle_health))
        .route("/policies/reload", post(handle_reload))
        .with_state(state)
}

async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "healthy"}))
}

async fn handle_reload(State(state): State<Arc<GatewayState>>) -> Response {
    let store = Arc::clone(&state.store);
    match tokio::task::spawn_blocking(move || store.reload()).await {
        Ok(Ok(())) => (StatusCode::OK, Json(json!({"status": "reloaded"}))).into_response(),
        Ok(Err(e)) => {
            error!(error = %e, "manual policy reload failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, RELOAD_FAILED, e.to_string())
        }
        Err(e) => {
            error!(error = %e, "policy reload task panicked");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                RELOAD_FAILED,
                "reload did not complete",
            )
        }
    }
}

async fn handle_tool_request(
    State(state): State<Arc<GatewayState>>,
    Path((tool, action)): Path<(String, String)>,
    request: Request,
) -> Response {
    let started = Instant::now();
    let trace_id = Uuid::new_v4().simple().to_string();
    let span = info_span!(
        "gateway.handleToolRequest",
        trace_id = %trace_id,
        agent.id = field::Empty,
        tool.name = %tool,
        tool.action = %action,
        decision.allow = field::Empty,
        policy.version = field::Empty,
        params.hash = field::Empty,
        latency.ms = field::Empty,
        parent.agent = field::Empty,
    );
    handle_tool_inner(state, tool, action, request, started, trace_id)
        .instrument(span)
        .await
}

async fn handle_tool_inner(
    state: Arc<GatewayState>,
    tool: String,
    action: String,
    request: Request,
    started: Instant,
    trace_id: String,
) -> Response {
    let agent_id = header_string(&request, "X-Agent-ID");
    let parent_agent = {
        let value = header_string(&request, "X-Parent-Agent");
        (!value.is_empty()).then_some(value)
    };

    // The agent identity is the audit subject; without it there is nothing
    // meaningful to record.
    if agent_id.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            MISSING_HEADER,
            "X-Agent-ID header is required",
        );
    }

    let body = match axum::body::to_bytes(request.into_body(), usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                INVALID_REQUEST,
                "Failed to read request body",
            );
        }
    };

    let params: Map<String, Value> = match serde_json::from_slice(&body) {
        Ok(params) => params,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                INVALID_REQUEST,
                "Request body must be valid JSON",
            );
        }
    };

    let params_hash = hasher::hash_params(&params);
    let decision =
        state
            .evaluator
            .evaluate(&state.store.snapshot(), &agent_id, &tool, &action, &params);
    let latency_ms = started.elapsed().as_micros() as f64 / 1000.0;

    let span = Span::current();
    span.record("agent.id", agent_id.as_str());
    span.record("decision.allow", decision.allow);
    span.record("policy.version", decision.version);
    span.record("params.hash", params_hash.as_str());
    span.record("latency.ms", latency_ms);
    if let Some(parent) = &parent_agent {
        span.record("parent.agent", parent.as_str());
    }

    state.emitter.emit(&AuditRecord {
        timestamp: Utc::now(),
        trace_id,
        agent_id,
        tool: tool.clone(),
        action: action.clone(),
        decision_allow: decision.allow,
        reason: decision.reason.clone(),
        policy_version: decision.version,
        params_hash,
        latency_ms,
        parent_agent,
    });

    if !decision.allow {
        return error_response(StatusCode::FORBIDDEN, POLICY_VIOLATION, decision.reason);
    }

    let Some(base) = state.adapters.resolve(&tool) else {
        return error_response(
            StatusCode::NOT_FOUND,
            ADAPTER_NOT_FOUND,
            format!("No adapter configured for tool: {tool}"),
        );
    };

    // Forward the raw bytes read above, not a re-serialization: the digest
    // must correspond to what the adapter receives.
    match forward_to_adapter(&state.client, target_url(base, &action), body).await {
        Ok((status, bytes)) => relay_response(status, bytes),
        Err(reason) => error_response(StatusCode::BAD_GATEWAY, ADAPTER_ERROR, reason),
    }
}

/// POST the original body to the adapter and collect its response.
///
/// The pooled client applies the 10-second total deadline to the whole
/// round-trip; on expiry the error surfaces as `AdapterError`. A mid-flight
/// client disconnect is not observed by the HTTP/1.1 server while this call
/// is pending, so the call runs to completion or deadline either way.
async fn forward_to_adapter(
    client: &reqwest::Client,
    url: String,
    body: Bytes,
) -> Result<(u16, Bytes), String> {
    let span = info_span!("gateway.forward_to_adapter", url = %url);
    async move {
        let response = client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|_| "Failed to read adapter response".to_string())?;
        Ok((status, bytes))
    }
    .instrument(span)
    .await
}

fn header_string(request: &Request, name: &str) -> String {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string()
}
