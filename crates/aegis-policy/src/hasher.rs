//! Deterministic request-body fingerprints for PII-safe audit.
//!
//! Produces a 64-hex-character SHA-256 digest over a canonical serialization
//! of the parsed body: object keys are sorted lexicographically at every
//! nesting level, so two deep-equal JSON values always hash identically
//! regardless of key insertion order in the source text. Hashing never
//! fails; a serialization error falls back to the digest of an empty body.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::warn;

/// Hash a parsed request body (a JSON object).
pub fn hash_params(params: &Map<String, Value>) -> String {
    let mut buf = Vec::new();
    match write_object(params, &mut buf) {
        Ok(()) => digest(&buf),
        Err(e) => {
            warn!(error = %e, "failed to serialize params for hashing, hashing empty body");
            digest(&[])
        }
    }
}

/// Hash any JSON value. Non-mapping bodies (arrays, scalars) hash by their
/// canonical serialization.
pub fn hash_value(value: &Value) -> String {
    let mut buf = Vec::new();
    match write_canonical(value, &mut buf) {
        Ok(()) => digest(&buf),
        Err(e) => {
            warn!(error = %e, "failed to serialize value for hashing, hashing empty body");
            digest(&[])
        }
    }
}

fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) -> serde_json::Result<()> {
    match value {
        Value::Object(map) => write_object(map, out),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
            Ok(())
        }
        scalar => serde_json::to_writer(out, scalar),
    }
}

fn write_object(map: &Map<String, Value>, out: &mut Vec<u8>) -> serde_json::Result<()> {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by_key(|(key, _)| key.as_str());

    out.push(b'{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        serde_json::to_writer(&mut *out, key.as_str())?;
        out.push(b':');
        write_canonical(value, out)?;
    }
    out.push(b'}');
    Ok(())
}
