//! Declarative permission documents parsed from YAML.
//!
//! One [`Policy`] corresponds to one file in the policy directory. The
//! in-memory aggregate of all loaded files is the [`PolicyModel`], keyed by
//! source filename.

use std::collections::BTreeMap;

use serde::Deserialize;

use aegis_types::AegisError;

/// One file's worth of permissions.
#[derive(Debug, Clone, Deserialize)]
pub struct Policy {
    /// Monotonic hint reported in audit records; not used for ordering.
    pub version: u32,
    /// Agent rules in declared order.
    pub agents: Vec<AgentRule>,
}

/// Permissions granted to a single agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentRule {
    /// Agent identifier matched against the `X-Agent-ID` header.
    pub id: String,
    /// Permissions in declared order.
    #[serde(default)]
    pub allow: Vec<Permission>,
}

/// One (tool, actions, conditions) grant.
#[derive(Debug, Clone, Deserialize)]
pub struct Permission {
    /// Tool name this permission applies to.
    pub tool: String,
    /// Permitted action names (membership semantics).
    pub actions: Vec<String>,
    /// Condition name -> typed value. Values are classified at parse time
    /// but not validated; the evaluator handles unexpected shapes.
    #[serde(default)]
    pub conditions: BTreeMap<String, ConditionValue>,
}

/// A condition parameter as written in YAML.
///
/// YAML integers and floats both land in `Number`. A sequence keeps its
/// string elements and drops the rest, so one mistyped entry in a list
/// narrows the list instead of disabling the whole condition. Anything else
/// is preserved in `Other` so the evaluator can warn and skip it.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Number(f64),
    Text(String),
    TextList(Vec<String>),
    Other(serde_yaml::Value),
}

impl ConditionValue {
    fn classify(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Number(n) => match n.as_f64() {
                Some(number) => ConditionValue::Number(number),
                None => ConditionValue::Other(serde_yaml::Value::Number(n)),
            },
            serde_yaml::Value::String(text) => ConditionValue::Text(text),
            serde_yaml::Value::Sequence(items) => ConditionValue::TextList(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        serde_yaml::Value::String(text) => Some(text),
                        _ => None,
                    })
                    .collect(),
            ),
            other => ConditionValue::Other(other),
        }
    }
}

impl<'de> serde::Deserialize<'de> for ConditionValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self::classify(serde_yaml::Value::deserialize(deserializer)?))
    }
}

/// The aggregate of all currently loaded policies, keyed by source filename.
pub type PolicyModel = BTreeMap<String, Policy>;

impl Policy {
    /// Validate structural invariants before the policy enters the model.
    ///
    /// Condition values are deliberately not checked here; a bad value in one
    /// condition must not take the rest of the file out of service.
    pub fn validate(&self) -> Result<(), AegisError> {
        if self.version < 1 {
            return Err(AegisError::PolicyError(
                "policy version must be >= 1".into(),
            ));
        }
        if self.agents.is_empty() {
            return Err(AegisError::PolicyError(
                "policy must have at least one agent".into(),
            ));
        }
        for agent in &self.agents {
            if agent.id.is_empty() {
                return Err(AegisError::PolicyError("agent ID cannot be empty".into()));
            }
        }
        Ok(())
    }
}
