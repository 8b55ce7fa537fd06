//! HTTP orchestrator for the Aegis gateway.
//!
//! Composes the policy store, evaluator, adapter router, and audit emitter
//! into the public surface: `POST /tools/{tool}/{action}`, `GET /health`,
//! and `POST /policies/reload`, plus the background policy watcher.

pub mod adapters;
pub mod server;
pub mod watcher;
pub mod wire;

pub use adapters::AdapterRouter;
pub use server::{router, GatewayState};
pub use watcher::PolicyWatcher;
