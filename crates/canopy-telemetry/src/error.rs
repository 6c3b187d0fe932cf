/// Errors raised while setting up logging.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// A global subscriber is already installed for this process.
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,

    /// The configured filter string failed to parse.
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    /// Could not create the configured log directory.
    #[error("I/O error setting up logging: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for telemetry setup.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
