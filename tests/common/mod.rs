//! Shared helpers for integration tests.
//!
//! Each integration test file compiles common/ as its own module, so not
//! every helper is used in every file.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use tempfile::TempDir;

use aegis_audit::{AuditEmitter, AuditRecord, NdjsonReader};
use aegis_gateway::{router, AdapterRouter, GatewayState};
use aegis_policy::PolicyStore;

pub const FINANCE_POLICY: &str = r#"
version: 1
agents:
  - id: finance-agent
    allow:
      - tool: payments
        actions: [create, refund]
        conditions:
          max_amount: 5000
          currencies: [USD, EUR]
"#;

pub const HR_POLICY: &str = r#"
version: 1
agents:
  - id: hr-agent
    allow:
      - tool: files
        actions: [read]
        conditions:
          folder_prefix: /hr-docs/
"#;

/// A gateway serving on an ephemeral port, backed by a temp policy dir.
pub struct TestGateway {
    pub base_url: String,
    pub policy_dir: PathBuf,
    pub audit_log: PathBuf,
    pub store: Arc<PolicyStore>,
    _tmp: TempDir,
}

impl TestGateway {
    /// The URL of a tool-call endpoint on this gateway.
    pub fn url(&self, tool: &str, action: &str) -> String {
        format!("{}/tools/{tool}/{action}", self.base_url)
    }

    /// All audit records emitted so far.
    pub fn audit_records(&self) -> Vec<AuditRecord> {
        if !self.audit_log.exists() {
            return Vec::new();
        }
        NdjsonReader::read_all(&self.audit_log).expect("audit log lines should parse")
    }

    /// The raw audit log lines.
    pub fn audit_lines(&self) -> Vec<String> {
        if !self.audit_log.exists() {
            return Vec::new();
        }
        NdjsonReader::read_lines(&self.audit_log).expect("audit log should be readable")
    }
}

/// Start a gateway with the given policy files and adapter map.
pub async fn spawn_gateway(
    policies: &[(&str, &str)],
    adapters: HashMap<String, String>,
) -> TestGateway {
    let tmp = TempDir::new().expect("should create temp dir");
    let policy_dir = tmp.path().join("policies");
    std::fs::create_dir(&policy_dir).expect("should create policy dir");
    for (name, text) in policies {
        std::fs::write(policy_dir.join(name), text).expect("should write policy file");
    }
    let audit_log = tmp.path().join("audit.log");

    let store = Arc::new(PolicyStore::open(&policy_dir).expect("should open policy store"));
    let emitter = Arc::new(AuditEmitter::open(&audit_log));
    let state = Arc::new(
        GatewayState::new(Arc::clone(&store), AdapterRouter::new(adapters), emitter)
            .expect("should build gateway state"),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind gateway listener");
    let addr = listener.local_addr().expect("should read local addr");
    tokio::spawn(async move {
        axum::serve(listener, router(state))
            .await
            .expect("gateway server should keep running");
    });

    TestGateway {
        base_url: format!("http://{addr}"),
        policy_dir,
        audit_log,
        store,
        _tmp: tmp,
    }
}

/// Records requests received by a mock adapter.
#[derive(Clone, Default)]
pub struct AdapterLog {
    hits: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl AdapterLog {
    pub fn count(&self) -> usize {
        self.hits.lock().expect("adapter log lock").len()
    }

    pub fn last(&self) -> Option<(String, Vec<u8>)> {
        self.hits.lock().expect("adapter log lock").last().cloned()
    }
}

/// Start a mock adapter that answers every POST with a canned response.
pub async fn spawn_adapter(status: u16, body: &'static str) -> (String, AdapterLog) {
    let log = AdapterLog::default();
    let app = Router::new()
        .fallback(adapter_handler)
        .with_state((log.clone(), status, body));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind adapter listener");
    let addr = listener.local_addr().expect("should read adapter addr");
    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("adapter server should keep running");
    });

    (format!("http://{addr}"), log)
}

async fn adapter_handler(
    State((log, status, body)): State<(AdapterLog, u16, &'static str)>,
    request: Request,
) -> impl IntoResponse {
    let path = request.uri().path().to_string();
    let bytes = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .unwrap_or_default();
    log.hits
        .lock()
        .expect("adapter log lock")
        .push((path, bytes.to_vec()));
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::OK),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

/// An address on localhost with nothing listening behind it.
pub async fn dead_adapter_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind throwaway listener");
    let addr = listener.local_addr().expect("should read addr");
    drop(listener);
    format!("http://{addr}")
}
