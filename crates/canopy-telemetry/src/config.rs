use std::path::PathBuf;

/// Output shape for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable, single line per event. Good default for a terminal.
    #[default]
    Compact,
    /// Multi-line, indented — useful when reading a single trace closely.
    Pretty,
    /// One JSON object per line, for shipping to a log aggregator.
    Json,
}

/// Logging configuration.
///
/// Mirrors the layering the rest of the runtime uses: sensible defaults,
/// overridable by the node-tree configuration file, overridable again by
/// environment variables (`RUST_LOG` is honored by [`super::setup_logging`]
/// through the filter string).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive string, e.g. `"info,canopy_tools=debug"`.
    pub filter: String,
    /// Output format.
    pub format: LogFormat,
    /// Directory to write daily-rolling log files to. `None` logs to stdout only.
    pub log_dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Compact,
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_info_compact_stdout() {
        let cfg = LogConfig::default();
        assert_eq!(cfg.filter, "info");
        assert_eq!(cfg.format, LogFormat::Compact);
        assert!(cfg.log_dir.is_none());
    }
}
