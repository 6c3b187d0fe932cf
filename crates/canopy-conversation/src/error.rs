/// Errors raised by a [`crate::ConversationStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    /// No conversation exists with the given id.
    #[error("conversation not found: {0}")]
    NotFound(String),

    /// No conversation has a pending approval with the given id.
    #[error("no pending approval with id: {0}")]
    ApprovalNotFound(String),

    /// A conversation with this id already exists (on a store that forbids
    /// overwriting via `save`; the in-memory store does not raise this).
    #[error("conversation already exists: {0}")]
    AlreadyExists(String),

    /// The store's backing medium failed (I/O, connection, serialization).
    #[error("conversation store error: {0}")]
    Backend(String),
}

/// Result alias for conversation store operations.
pub type ConversationResult<T> = Result<T, ConversationError>;
