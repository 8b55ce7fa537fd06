//! Shared types for the Aegis gateway.
//!
//! Home of the [`Decision`] produced by policy evaluation, the [`AegisError`]
//! enum used across crates, and the [`GatewayConfig`] loaded at startup.

pub mod config;
pub mod decision;
pub mod error;

pub use config::GatewayConfig;
pub use decision::Decision;
pub use error::AegisError;
