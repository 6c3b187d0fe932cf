/// Errors raised by a [`crate::ToolBackend`] or the [`crate::ToolBroker`].
#[derive(Debug, thiserror::Error)]
pub enum ToolsError {
    /// A backend failed to start after exhausting its retry budget.
    #[error("backend '{name}' failed to start: {reason}")]
    BackendStartFailed {
        /// Name of the backend that failed.
        name: String,
        /// Why it failed.
        reason: String,
    },

    /// Two backends registered a tool with the same name.
    ///
    /// Startup-fatal: the broker rolls back every backend started before the
    /// offender and returns this error rather than building a partial catalog.
    #[error("duplicate tool name '{tool}' registered by both '{first_backend}' and '{second_backend}'")]
    DuplicateToolName {
        /// The colliding tool name.
        tool: String,
        /// The backend that registered it first.
        first_backend: String,
        /// The backend that registered it again.
        second_backend: String,
    },

    /// No tool with this name exists in the merged catalog.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The owning backend failed to execute the call (not an `auth-required`
    /// signal — those are represented as [`crate::ToolCallOutcome::AuthRequired`]).
    #[error("backend '{backend}' failed to call tool '{tool}': {reason}")]
    CallFailed {
        /// Backend that owns the failing tool.
        backend: String,
        /// Tool that was called.
        tool: String,
        /// Failure detail.
        reason: String,
    },

    /// A backend failed to stop cleanly during rollback or shutdown.
    #[error("backend '{name}' failed to stop: {reason}")]
    BackendStopFailed {
        /// Name of the backend.
        name: String,
        /// Why it failed.
        reason: String,
    },
}

/// Result alias for tool broker operations.
pub type ToolsResult<T> = Result<T, ToolsError>;
