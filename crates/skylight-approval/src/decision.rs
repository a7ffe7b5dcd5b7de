//! Decision types for tool-authorization requests.
//!
//! A [`Decision`] is what the UI (or the broker itself, on timeout and
//! cancellation) delivers to an agent run that is suspended on
//! [`ApprovalBroker::register`](crate::ApprovalBroker::register). Denials
//! produced by the broker are ordinary [`Decision::Deny`] values — the agent
//! runtime never needs to distinguish them from an explicit user denial.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A key-value record describing the tool invocation being authorized.
///
/// Preserved verbatim from registration so it can be echoed back on approval.
pub type ToolInput = Map<String, Value>;

/// Denial reason injected when a pending request exceeds the expiry timeout.
pub(crate) const TIMEOUT_REASON: &str = "approval request timed out";

/// Denial reason injected when the cancellation signal fires.
pub(crate) const ABORTED_REASON: &str = "approval request aborted";

/// Denial reason injected when a newer registration reuses a pending id.
pub(crate) const SUPERSEDED_REASON: &str = "approval request superseded";

/// The resolution of a tool-authorization request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "behavior", rename_all = "snake_case")]
pub enum Decision {
    /// Allow this one invocation.
    ///
    /// `updated_input: None` means "approve this exact call"; the broker
    /// substitutes the originally registered input when completing the
    /// request. `Some(..)` carries input the approver explicitly edited.
    Allow {
        /// Tool input the agent should execute with.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        updated_input: Option<ToolInput>,
    },
    /// Allow this invocation and every later one like it for the session.
    ///
    /// Session-wide allow bookkeeping belongs to the caller; the broker
    /// treats this identically to [`Decision::Allow`] when completing the
    /// pending entry.
    AllowForSession {
        /// Tool input the agent should execute with.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        updated_input: Option<ToolInput>,
    },
    /// Deny the invocation.
    Deny {
        /// Why the invocation was denied.
        reason: String,
    },
}

impl Decision {
    /// One-time approval of the registered call.
    #[must_use]
    pub fn allow() -> Self {
        Self::Allow {
            updated_input: None,
        }
    }

    /// One-time approval with input the approver edited.
    #[must_use]
    pub fn allow_with_input(input: ToolInput) -> Self {
        Self::Allow {
            updated_input: Some(input),
        }
    }

    /// Session-wide approval of the registered call.
    #[must_use]
    pub fn allow_for_session() -> Self {
        Self::AllowForSession {
            updated_input: None,
        }
    }

    /// Denial with a caller-supplied reason.
    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self::Deny {
            reason: reason.into(),
        }
    }

    /// Denial outcome for requests that outlived the expiry timeout.
    #[must_use]
    pub(crate) fn denied_timeout() -> Self {
        Self::deny(TIMEOUT_REASON)
    }

    /// Denial outcome for requests whose cancellation signal fired.
    #[must_use]
    pub(crate) fn denied_aborted() -> Self {
        Self::deny(ABORTED_REASON)
    }

    /// Denial outcome for waiters displaced by an id reuse.
    #[must_use]
    pub(crate) fn denied_superseded() -> Self {
        Self::deny(SUPERSEDED_REASON)
    }

    /// Check whether this decision approves the invocation.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        !matches!(self, Self::Deny { .. })
    }

    /// The denial reason, when this is a denial.
    #[must_use]
    pub fn denial_reason(&self) -> Option<&str> {
        match self {
            Self::Deny { reason } => Some(reason),
            _ => None,
        }
    }

    /// The input the agent should execute with, when approved.
    #[must_use]
    pub fn updated_input(&self) -> Option<&ToolInput> {
        match self {
            Self::Allow { updated_input } | Self::AllowForSession { updated_input } => {
                updated_input.as_ref()
            },
            Self::Deny { .. } => None,
        }
    }

    /// Fill in the approved input when the approver did not edit it.
    ///
    /// No-op for denials and for approvals that already carry an explicit
    /// `updated_input`.
    pub(crate) fn fill_missing_input(&mut self, original: ToolInput) {
        match self {
            Self::Allow { updated_input } | Self::AllowForSession { updated_input } => {
                if updated_input.is_none() {
                    *updated_input = Some(original);
                }
            },
            Self::Deny { .. } => {},
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow { .. } => write!(f, "allow (once)"),
            Self::AllowForSession { .. } => write!(f, "allow (session)"),
            Self::Deny { reason } => write!(f, "deny: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_input() -> ToolInput {
        let mut input = ToolInput::new();
        input.insert("command".to_string(), json!("ls -la"));
        input
    }

    #[test]
    fn test_allow_has_no_input_by_default() {
        let decision = Decision::allow();
        assert!(decision.is_approved());
        assert!(decision.updated_input().is_none());
        assert!(decision.denial_reason().is_none());
    }

    #[test]
    fn test_deny_carries_reason() {
        let decision = Decision::deny("too risky");
        assert!(!decision.is_approved());
        assert_eq!(decision.denial_reason(), Some("too risky"));
    }

    #[test]
    fn test_fill_missing_input_injects_original() {
        let mut decision = Decision::allow();
        decision.fill_missing_input(sample_input());
        assert_eq!(decision.updated_input(), Some(&sample_input()));
    }

    #[test]
    fn test_fill_missing_input_keeps_explicit_edit() {
        let mut edited = ToolInput::new();
        edited.insert("command".to_string(), json!("ls"));
        let mut decision = Decision::allow_with_input(edited.clone());
        decision.fill_missing_input(sample_input());
        assert_eq!(decision.updated_input(), Some(&edited));
    }

    #[test]
    fn test_fill_missing_input_ignores_denials() {
        let mut decision = Decision::deny("no");
        decision.fill_missing_input(sample_input());
        assert!(decision.updated_input().is_none());
    }

    #[test]
    fn test_serialization_tags_behavior() {
        let json = serde_json::to_value(Decision::allow()).unwrap();
        assert_eq!(json["behavior"], "allow");
        assert!(json.get("updated_input").is_none());

        let json = serde_json::to_value(Decision::deny("nope")).unwrap();
        assert_eq!(json["behavior"], "deny");
        assert_eq!(json["reason"], "nope");
    }

    #[test]
    fn test_round_trip_session_approval() {
        let decision = Decision::allow_for_session();
        let json = serde_json::to_string(&decision).unwrap();
        let back: Decision = serde_json::from_str(&json).unwrap();
        assert_eq!(decision, back);
        assert!(back.is_approved());
    }

    #[test]
    fn test_display() {
        assert_eq!(Decision::allow().to_string(), "allow (once)");
        assert_eq!(Decision::deny("busy").to_string(), "deny: busy");
    }
}
