use canopy_core::{Timestamp, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier for a [`PendingApproval`], handed to the caller so they can
/// later resolve it. Displays as `approval:<uuid>` to make log lines and
/// error messages self-describing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalId(Uuid);

impl ApprovalId {
    /// Mint a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The wrapped UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ApprovalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApprovalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "approval:{}", self.0)
    }
}

/// The two shapes a staged approval can take.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApprovalKind {
    /// A destructive tool call staged for direct execution through the
    /// broker once approved.
    Local {
        /// Name of the tool to invoke.
        tool_name: String,
        /// Arguments to invoke it with.
        tool_args: Value,
    },
    /// An approval raised by a remote peer that itself paused
    /// (`input-required`); the decision is forwarded verbatim to that peer.
    Proxy {
        /// The peer's task id, used to continue its paused task.
        remote_task_id: String,
        /// The configured name of the peer runtime.
        remote_agent_name: String,
    },
}

/// A human-in-the-loop gate staged on a conversation.
///
/// At most one may be pending per conversation at a time (enforced by the
/// conversation record, not by this type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingApproval {
    /// Unique handle for this approval.
    pub id: ApprovalId,
    /// Human-readable description shown to the approver.
    pub description: String,
    /// When this approval was staged.
    pub staged_at: Timestamp,
    /// The staged operation.
    pub kind: ApprovalKind,
}

impl PendingApproval {
    /// Stage a new approval with a freshly minted id and the current time.
    #[must_use]
    pub fn new(description: impl Into<String>, kind: ApprovalKind) -> Self {
        Self {
            id: ApprovalId::new(),
            description: description.into(),
            staged_at: Timestamp::now(),
            kind,
        }
    }

    /// Whether this approval is a proxy for a remote peer's paused task.
    #[must_use]
    pub fn is_proxy(&self) -> bool {
        matches!(self.kind, ApprovalKind::Proxy { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn ids_are_unique_and_display_with_prefix() {
        let a = ApprovalId::new();
        let b = ApprovalId::new();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("approval:"));
    }

    #[test]
    fn local_approval_round_trips_through_json() {
        let approval = PendingApproval::new(
            "delete the staging table",
            ApprovalKind::Local {
                tool_name: "delete_table".to_string(),
                tool_args: Value::Map(BTreeMap::new()),
            },
        );
        let json = serde_json::to_string(&approval).unwrap();
        let back: PendingApproval = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, approval.id);
        assert!(!back.is_proxy());
    }

    #[test]
    fn proxy_approval_is_flagged() {
        let approval = PendingApproval::new(
            "peer needs approval",
            ApprovalKind::Proxy {
                remote_task_id: "task-1".to_string(),
                remote_agent_name: "researcher".to_string(),
            },
        );
        assert!(approval.is_proxy());
    }
}
