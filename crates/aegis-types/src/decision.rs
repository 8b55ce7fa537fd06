//! The policy decision produced by the evaluator.

/// The outcome of evaluating one tool call against the loaded policies.
///
/// `version` carries the `version` field of the policy that decided the
/// request, or zero when no policy matched at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Whether the call is permitted.
    pub allow: bool,
    /// Human-readable explanation. Required on deny, informational on allow.
    pub reason: String,
    /// Version of the matched policy; zero when no policy matched.
    pub version: u32,
}

impl Decision {
    /// Create an allow decision attributed to the given policy version.
    pub fn allow(reason: impl Into<String>, version: u32) -> Self {
        Self {
            allow: true,
            reason: reason.into(),
            version,
        }
    }

    /// Create a deny decision attributed to the given policy version.
    pub fn deny(reason: impl Into<String>, version: u32) -> Self {
        Self {
            allow: false,
            reason: reason.into(),
            version,
        }
    }

    /// The deny produced when no permission matches across all policies.
    pub fn no_match(agent: &str, tool: &str, action: &str) -> Self {
        Self::deny(
            format!("No policy found for agent={agent}, tool={tool}, action={action}"),
            0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_and_deny_constructors() {
        let d = Decision::allow("Policy allows this action", 3);
        assert!(d.allow);
        assert_eq!(d.version, 3);

        let d = Decision::deny("Currency XYZ not in allowed list", 1);
        assert!(!d.allow);
        assert_eq!(d.reason, "Currency XYZ not in allowed list");
    }

    #[test]
    fn no_match_carries_version_zero() {
        let d = Decision::no_match("ops-agent", "payments", "refund");
        assert!(!d.allow);
        assert_eq!(d.version, 0);
        assert_eq!(
            d.reason,
            "No policy found for agent=ops-agent, tool=payments, action=refund"
        );
    }
}
