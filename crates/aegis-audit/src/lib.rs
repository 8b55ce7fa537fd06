//! Audit trail for the Aegis gateway.
//!
//! One [`AuditRecord`] is emitted per reached decision, as a single JSON
//! line to stdout and to an append-only NDJSON file.

pub mod emitter;
pub mod ndjson;
pub mod record;

pub use emitter::AuditEmitter;
pub use ndjson::{NdjsonReader, NdjsonWriter};
pub use record::AuditRecord;
