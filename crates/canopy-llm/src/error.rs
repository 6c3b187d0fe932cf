/// Errors raised by an [`crate::LlmAdapter`].
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The vendor client could not be reached, or returned a transport failure.
    #[error("LLM transport error: {0}")]
    Transport(String),

    /// The vendor responded but with a shape this adapter could not parse.
    #[error("invalid response from LLM: {0}")]
    InvalidResponse(String),

    /// The requested model is not configured on this adapter.
    #[error("unknown model: {0}")]
    UnknownModel(String),
}

/// Result alias for LLM adapter operations.
pub type LlmResult<T> = Result<T, LlmError>;
