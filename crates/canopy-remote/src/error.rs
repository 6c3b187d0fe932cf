/// Errors raised by a [`crate::RemoteAgentClient`].
#[derive(Debug, thiserror::Error)]
pub enum RemoteAgentError {
    /// The peer's JSON-RPC endpoint could not be reached or returned a
    /// transport-level failure.
    #[error("peer '{peer}' unreachable: {reason}")]
    Unreachable {
        /// Configured peer name.
        peer: String,
        /// Failure detail.
        reason: String,
    },

    /// The peer responded with a JSON-RPC error object.
    #[error("peer '{peer}' rejected the call: {reason}")]
    Rejected {
        /// Configured peer name.
        peer: String,
        /// Failure detail reported by the peer.
        reason: String,
    },

    /// The peer's agent card could not be fetched or parsed.
    #[error("failed to fetch agent card for '{peer}': {reason}")]
    AgentCardUnavailable {
        /// Configured peer name.
        peer: String,
        /// Failure detail.
        reason: String,
    },

    /// The peer's base URL is not a valid URL.
    #[error("invalid peer URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Why it failed to parse.
        reason: String,
    },
}

/// Result alias for remote-agent client operations.
pub type RemoteAgentResult<T> = Result<T, RemoteAgentError>;
