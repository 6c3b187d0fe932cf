/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Could not read a configuration file.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document did not parse as valid TOML, or did not match the
    /// expected shape.
    #[error("invalid configuration in {path}: {message}")]
    Parse {
        /// Path that failed to parse.
        path: String,
        /// Description of the parse failure.
        message: String,
    },

    /// The node tree failed structural validation.
    #[error("invalid node tree: {0}")]
    InvalidTree(String),
}

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
