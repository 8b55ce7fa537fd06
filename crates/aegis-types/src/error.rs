//! Error types shared across all Aegis crates.

/// Errors that can occur across the Aegis gateway.
///
/// Each variant corresponds to a different subsystem: policy loading and
/// evaluation, the audit sink, configuration, or the gateway itself.
#[derive(Debug, thiserror::Error)]
pub enum AegisError {
    /// Policy loading, parsing, or validation failure.
    #[error("policy error: {0}")]
    PolicyError(String),

    /// Audit log sink failure.
    #[error("audit log error: {0}")]
    AuditError(String),

    /// Configuration loading or validation error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Gateway construction or serving failure.
    #[error("gateway error: {0}")]
    GatewayError(String),
}
