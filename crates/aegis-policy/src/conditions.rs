//! Condition predicates and the registry that dispatches them.
//!
//! Each predicate shares the signature `(value, request_params) -> Option<reason>`:
//! `None` means satisfied, `Some(reason)` denies the request with that reason.
//! Unknown condition names are skipped so policies written for newer builds
//! keep working, and a malformed condition *value* is skipped with a warning
//! rather than denying unrelated requests. A missing or ill-typed *request*
//! field referenced by an active condition denies with
//! `Invalid <field> parameter`.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::schema::ConditionValue;

/// A condition predicate: `None` = satisfied, `Some(reason)` = deny.
pub type Predicate = fn(&ConditionValue, &Map<String, Value>) -> Option<String>;

/// Registry of named condition predicates.
///
/// New predicates are added with [`register`]; the evaluator dispatches
/// through the registry and never needs to change.
///
/// [`register`]: ConditionRegistry::register
pub struct ConditionRegistry {
    predicates: HashMap<String, Predicate>,
}

impl ConditionRegistry {
    /// An empty registry with no predicates.
    pub fn empty() -> Self {
        Self {
            predicates: HashMap::new(),
        }
    }

    /// The registry of built-in predicates: `max_amount`, `currencies`,
    /// `folder_prefix`.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("max_amount", check_max_amount);
        registry.register("currencies", check_currencies);
        registry.register("folder_prefix", check_folder_prefix);
        registry
    }

    /// Register a predicate under a condition name, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, predicate: Predicate) {
        self.predicates.insert(name.into(), predicate);
    }

    /// Evaluate every condition of a permission against the request params.
    ///
    /// Returns the first non-empty reason, or `None` when all conditions are
    /// satisfied.
    pub fn check(
        &self,
        conditions: &BTreeMap<String, ConditionValue>,
        params: &Map<String, Value>,
    ) -> Option<String> {
        for (name, value) in conditions {
            let Some(predicate) = self.predicates.get(name) else {
                debug!(condition = %name, "unknown condition name, treating as satisfied");
                continue;
            };
            if let Some(reason) = predicate(value, params) {
                return Some(reason);
            }
        }
        None
    }
}

impl Default for ConditionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// `amount` must not exceed the configured maximum. Equality is allowed.
fn check_max_amount(value: &ConditionValue, params: &Map<String, Value>) -> Option<String> {
    let max = match value {
        ConditionValue::Number(n) => *n,
        other => {
            warn!(value = ?other, "max_amount condition has a non-numeric value, skipping");
            return None;
        }
    };
    let amount = match params.get("amount").and_then(Value::as_f64) {
        Some(a) => a,
        None => return Some("Invalid amount parameter".to_string()),
    };
    (amount > max).then(|| format!("Amount {amount:.2} exceeds max_amount={max:.2}"))
}

/// `currency` must be one of the listed strings, compared case-sensitively.
///
/// Non-string entries were already dropped from the list at parse time, so a
/// single mistyped entry narrows the allow-list rather than disabling it.
fn check_currencies(value: &ConditionValue, params: &Map<String, Value>) -> Option<String> {
    let allowed = match value {
        ConditionValue::TextList(list) => list,
        other => {
            warn!(value = ?other, "currencies condition is not a list, skipping");
            return None;
        }
    };
    let currency = match params.get("currency").and_then(Value::as_str) {
        Some(c) => c,
        None => return Some("Invalid currency parameter".to_string()),
    };
    (!allowed.iter().any(|c| c == currency))
        .then(|| format!("Currency {currency} not in allowed list"))
}

/// `path` must start with the configured prefix, byte for byte.
fn check_folder_prefix(value: &ConditionValue, params: &Map<String, Value>) -> Option<String> {
    let prefix = match value {
        ConditionValue::Text(p) => p,
        other => {
            warn!(value = ?other, "folder_prefix condition is not a string, skipping");
            return None;
        }
    };
    let path = match params.get("path").and_then(Value::as_str) {
        Some(p) => p,
        None => return Some("Invalid path parameter".to_string()),
    };
    (!path.starts_with(prefix))
        .then(|| format!("Path {path} does not match required prefix {prefix}"))
}
