#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Approval types for the Canopy agent orchestration runtime.
//!
//! A [`PendingApproval`] is the thing staged when a node needs a human (or
//! an automated policy standing in for one) to sign off on a destructive
//! tool call or a delegation to a peer that itself paused. It has two
//! shapes — [`ApprovalKind::Local`] and [`ApprovalKind::Proxy`] — modeled as
//! one tagged enum with a shared header rather than two separate entities,
//! since the approval resolver dispatches on the payload but every other
//! consumer (the conversation record, a caller listing pending approvals)
//! treats both shapes identically.
//!
//! ```
//! use canopy_approval::{ApprovalKind, PendingApproval};
//! use canopy_core::Value;
//! use std::collections::BTreeMap;
//!
//! let approval = PendingApproval::new(
//!     "delete the staging database",
//!     ApprovalKind::Local {
//!         tool_name: "delete_database".to_string(),
//!         tool_args: Value::Map(BTreeMap::new()),
//!     },
//! );
//! assert!(!approval.id.to_string().is_empty());
//! ```

mod decision;
mod request;

pub use decision::ApprovalDecision;
pub use request::{ApprovalId, ApprovalKind, PendingApproval};
