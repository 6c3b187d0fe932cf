use serde::{Deserialize, Serialize};

/// A remote peer's execution state for one delegated request.
///
/// `submitted` and `completed`/`failed` are terminal-ish states the executor
/// treats as "done, read the artifact"; `input-required` and `auth-required`
/// are the two states that propagate back to the local caller as signals
/// rather than text (a proxy approval, or an unmodified `auth-required`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// The peer accepted the request and is working on it.
    Submitted,
    /// The peer paused and needs human approval before continuing.
    InputRequired,
    /// The peer needs the caller to (re-)authenticate.
    AuthRequired,
    /// The peer finished; `artifact` carries the result.
    Completed,
    /// The peer gave up.
    Failed,
}

/// `task.status` — the state plus an optional human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Current lifecycle state.
    pub state: TaskState,
    /// Optional human-readable status detail from the peer.
    #[serde(default)]
    pub message: Option<String>,
}

/// One part of a task artifact. Only text parts are read; other kinds are
/// preserved on the struct but ignored by [`extract_task_text`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactPart {
    /// Part kind, e.g. `"text"`.
    #[serde(rename = "type")]
    pub part_type: String,
    /// Text content, present when `part_type == "text"`.
    #[serde(default)]
    pub text: Option<String>,
}

/// A task's result payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Ordered content parts.
    #[serde(default)]
    pub parts: Vec<ArtifactPart>,
}

/// A unit of work delegated to a remote agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Peer-assigned task id, used for `continue-task`/`get-task`.
    pub id: String,
    /// Current status.
    pub status: TaskStatus,
    /// Result payload, present once the peer has produced output.
    #[serde(default)]
    pub artifact: Option<Artifact>,
}

/// The text the node executor stores under a node's `output-key`: the
/// concatenation of every text part of the artifact, or a fallback
/// `"Task <id>: <state>"` description when no artifact text exists.
#[must_use]
pub fn extract_task_text(task: &Task) -> String {
    let text = task
        .artifact
        .as_ref()
        .map(|artifact| {
            artifact
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        format!("Task {}: {:?}", task.id, task.status.state)
    } else {
        text
    }
}
