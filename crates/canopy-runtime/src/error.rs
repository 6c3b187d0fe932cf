/// Errors raised by the node executor, the approval resolver or the
/// conversation orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The tool broker failed to execute a call (not an `auth-required`
    /// signal, which is represented as [`crate::ExecOutcome::AuthRequired`]).
    #[error(transparent)]
    Tools(#[from] canopy_tools::ToolsError),

    /// A remote peer could not be reached or rejected a call.
    #[error(transparent)]
    Remote(#[from] canopy_remote::RemoteAgentError),

    /// The LLM adapter failed.
    #[error(transparent)]
    Llm(#[from] canopy_llm::LlmError),

    /// The conversation store failed or the conversation/approval was missing.
    #[error(transparent)]
    Conversation(#[from] canopy_conversation::ConversationError),

    /// A node referenced a peer name not present in the tree's peer registry.
    #[error("unknown peer: {0}")]
    UnknownPeer(String),

    /// A `remote-agent` leaf is missing its `remote-url`.
    #[error("remote-agent node '{0}' has no remote-url configured")]
    MissingRemoteUrl(String),

    /// Resolution was attempted against a pending approval that was not a
    /// proxy approval but was handled as one, or vice versa.
    #[error("approval '{0}' has an unexpected shape for this operation")]
    UnexpectedApprovalShape(String),

    /// A resume cursor with an empty path remainder reached a composite
    /// node. Only leaves are valid resume targets; this means the saved
    /// `paused-node-path` no longer matches the tree shape.
    #[error("resume path {path:?} targets composite node '{node}', which is not a valid pause point")]
    InvalidResumePath {
        /// The node that unexpectedly received an empty resume remainder.
        node: String,
        /// The path that led to it.
        path: Vec<usize>,
    },
}

/// Result alias for node executor / orchestrator operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
