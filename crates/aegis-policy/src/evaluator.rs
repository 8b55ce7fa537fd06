//! Policy evaluation: `(agent, tool, action, params) -> Decision`.
//!
//! Pure with respect to a [`PolicyModel`] snapshot. Matching walks files,
//! then agents, then permissions, all in declared order, and the first
//! (agent, tool, action) match decides: a failing condition on that match
//! denies without falling through to later permissions.

use serde_json::{Map, Value};

use aegis_types::Decision;

use crate::conditions::ConditionRegistry;
use crate::schema::PolicyModel;

/// Reason reported on every allow decision.
const ALLOW_REASON: &str = "Policy allows this action";

/// Evaluates tool calls against a policy snapshot.
pub struct Evaluator {
    registry: ConditionRegistry,
}

impl Evaluator {
    /// An evaluator with the built-in condition predicates.
    pub fn new() -> Self {
        Self {
            registry: ConditionRegistry::builtin(),
        }
    }

    /// An evaluator dispatching through a caller-supplied registry.
    pub fn with_registry(registry: ConditionRegistry) -> Self {
        Self { registry }
    }

    /// Decide whether `agent` may invoke `action` on `tool` with `params`.
    pub fn evaluate(
        &self,
        model: &PolicyModel,
        agent: &str,
        tool: &str,
        action: &str,
        params: &Map<String, Value>,
    ) -> Decision {
        for policy in model.values() {
            for rule in &policy.agents {
                if rule.id != agent {
                    continue;
                }
                for permission in &rule.allow {
                    if permission.tool != tool {
                        continue;
                    }
                    if !permission.actions.iter().any(|a| a == action) {
                        continue;
                    }
                    if let Some(reason) = self.registry.check(&permission.conditions, params) {
                        return Decision::deny(reason, policy.version);
                    }
                    return Decision::allow(ALLOW_REASON, policy.version);
                }
            }
        }
        Decision::no_match(agent, tool, action)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Policy;
    use serde_json::json;

    fn model(files: &[(&str, &str)]) -> PolicyModel {
        files
            .iter()
            .map(|(name, text)| {
                let policy: Policy =
                    serde_yaml::from_str(text).expect("test policy should parse");
                (name.to_string(), policy)
            })
            .collect()
    }

    fn params(value: Value) -> Map<String, Value> {
        value
            .as_object()
            .expect("test params must be a JSON object")
            .clone()
    }

    const FINANCE: &str = r#"
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

    const HR: &str = r#"
version: 2
agents:
  - id: hr-agent
    allow:
      - tool: files
        actions: [read]
        conditions:
          folder_prefix: /hr-docs/
"#;

    #[test]
    fn allows_matching_call_within_conditions() {
        let evaluator = Evaluator::new();
        let model = model(&[("finance.yaml", FINANCE)]);
        let decision = evaluator.evaluate(
            &model,
            "finance-agent",
            "payments",
            "create",
            &params(json!({"amount": 1000, "currency": "USD", "vendor_id": "V42"})),
        );
        assert!(decision.allow);
        assert_eq!(decision.reason, "Policy allows this action");
        assert_eq!(decision.version, 1);
    }

    #[test]
    fn condition_failure_denies_with_policy_version() {
        let evaluator = Evaluator::new();
        let model = model(&[("finance.yaml", FINANCE)]);
        let decision = evaluator.evaluate(
            &model,
            "finance-agent",
            "payments",
            "create",
            &params(json!({"amount": 50000, "currency": "USD"})),
        );
        assert!(!decision.allow);
        assert_eq!(
            decision.reason,
            "Amount 50000.00 exceeds max_amount=5000.00"
        );
        assert_eq!(decision.version, 1);
    }

    #[test]
    fn no_match_reports_version_zero() {
        let evaluator = Evaluator::new();
        let model = model(&[("finance.yaml", FINANCE)]);
        let decision = evaluator.evaluate(
            &model,
            "finance-agent",
            "files",
            "read",
            &params(json!({"path": "/hr-docs/x"})),
        );
        assert!(!decision.allow);
        assert_eq!(
            decision.reason,
            "No policy found for agent=finance-agent, tool=files, action=read"
        );
        assert_eq!(decision.version, 0);
    }

    #[test]
    fn unknown_agent_and_unknown_action_both_miss() {
        let evaluator = Evaluator::new();
        let model = model(&[("finance.yaml", FINANCE)]);

        let unknown_agent = evaluator.evaluate(
            &model,
            "intern-agent",
            "payments",
            "create",
            &params(json!({"amount": 1})),
        );
        assert!(!unknown_agent.allow);
        assert_eq!(unknown_agent.version, 0);

        let unknown_action = evaluator.evaluate(
            &model,
            "finance-agent",
            "payments",
            "void",
            &params(json!({"amount": 1})),
        );
        assert!(!unknown_action.allow);
        assert_eq!(unknown_action.version, 0);
    }

    #[test]
    fn action_membership_is_case_sensitive() {
        let evaluator = Evaluator::new();
        let model = model(&[("finance.yaml", FINANCE)]);
        let decision = evaluator.evaluate(
            &model,
            "finance-agent",
            "payments",
            "Create",
            &params(json!({"amount": 1, "currency": "USD"})),
        );
        assert!(!decision.allow);
        assert_eq!(decision.version, 0);
    }

    #[test]
    fn first_tool_match_is_terminal_for_condition_failures() {
        // Two permissions for the same (agent, tool): a later, laxer one must
        // not rescue a request the first one denies.
        let text = r#"
version: 3
agents:
  - id: finance-agent
    allow:
      - tool: payments
        actions: [create]
        conditions:
          max_amount: 100
      - tool: payments
        actions: [create]
        conditions:
          max_amount: 1000000
"#;
        let evaluator = Evaluator::new();
        let model = model(&[("finance.yaml", text)]);
        let decision = evaluator.evaluate(
            &model,
            "finance-agent",
            "payments",
            "create",
            &params(json!({"amount": 5000})),
        );
        assert!(!decision.allow);
        assert_eq!(decision.reason, "Amount 5000.00 exceeds max_amount=100.00");
        assert_eq!(decision.version, 3);
    }

    #[test]
    fn action_mismatch_falls_through_to_later_permission() {
        let text = r#"
version: 1
agents:
  - id: a
    allow:
      - tool: files
        actions: [read]
      - tool: files
        actions: [write]
"#;
        let evaluator = Evaluator::new();
        let model = model(&[("p.yaml", text)]);
        let decision =
            evaluator.evaluate(&model, "a", "files", "write", &params(json!({})));
        assert!(decision.allow);
    }

    #[test]
    fn matches_across_multiple_files() {
        let evaluator = Evaluator::new();
        let model = model(&[("finance.yaml", FINANCE), ("hr.yaml", HR)]);

        let decision = evaluator.evaluate(
            &model,
            "hr-agent",
            "files",
            "read",
            &params(json!({"path": "/hr-docs/employee-handbook.pdf"})),
        );
        assert!(decision.allow);
        assert_eq!(decision.version, 2);
    }

    #[test]
    fn evaluation_is_deterministic_for_a_snapshot() {
        let evaluator = Evaluator::new();
        let model = model(&[("finance.yaml", FINANCE), ("hr.yaml", HR)]);
        let p = params(json!({"amount": 7000, "currency": "EUR"}));

        let first = evaluator.evaluate(&model, "finance-agent", "payments", "refund", &p);
        for _ in 0..10 {
            let again =
                evaluator.evaluate(&model, "finance-agent", "payments", "refund", &p);
            assert_eq!(again, first);
        }
    }
}
