//! Policy model, store, and evaluator for the Aegis gateway.
//!
//! Policies are YAML documents loaded from a directory into an immutable
//! aggregate. The store publishes snapshots atomically for hot reload, and
//! the evaluator decides each tool call against one snapshot using an
//! extensible registry of condition predicates.

pub mod conditions;
pub mod evaluator;
pub mod hasher;
pub mod schema;
pub mod store;

pub use conditions::ConditionRegistry;
pub use evaluator::Evaluator;
pub use schema::{AgentRule, ConditionValue, Permission, Policy, PolicyModel};
pub use store::PolicyStore;
