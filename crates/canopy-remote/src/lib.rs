#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! A JSON-RPC client for delegating work to remote peer agents.
//!
//! One [`RemoteAgentClient`] per configured peer. A [`task::Task`] tracks
//! the peer's progress on a delegated request, including the `input-required`
//! state that becomes a proxy approval and the `auth-required` state that
//! propagates upstream unmodified.

mod agent_card;
mod client;
mod error;
mod task;

pub use agent_card::AgentCard;
pub use client::RemoteAgentClient;
pub use error::{RemoteAgentError, RemoteAgentResult};
pub use task::{Artifact, ArtifactPart, Task, TaskState, TaskStatus, extract_task_text};
