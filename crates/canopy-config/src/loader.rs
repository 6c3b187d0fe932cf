use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env::layer_from_env;
use crate::error::{ConfigError, ConfigResult};
use crate::merge::RuntimeConfigLayer;

/// Resolved runtime tunables: every field has a concrete value, built by
/// layering defaults, a system-wide file, a per-user file, a workspace-local
/// file, and environment variables, each layer overriding the last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// `tracing_subscriber::EnvFilter` directive string.
    pub log_filter: String,
    /// Deadline for remote-agent JSON-RPC calls.
    pub remote_call_timeout: Duration,
    /// How long the tool broker retries a backend that fails to start.
    pub backend_start_retry: Duration,
    /// Iteration cap for the simple-mode runner's tool loop.
    pub simple_mode_max_iterations: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            remote_call_timeout: Duration::from_secs(60),
            backend_start_retry: Duration::from_secs(10),
            simple_mode_max_iterations: 10,
        }
    }
}

impl RuntimeConfig {
    fn from_layer(layer: RuntimeConfigLayer) -> Self {
        let defaults = Self::default();
        Self {
            log_filter: layer.log_filter.unwrap_or(defaults.log_filter),
            remote_call_timeout: layer
                .remote_call_timeout_secs
                .map_or(defaults.remote_call_timeout, Duration::from_secs),
            backend_start_retry: layer
                .backend_start_retry_secs
                .map_or(defaults.backend_start_retry, Duration::from_secs),
            simple_mode_max_iterations: layer
                .simple_mode_max_iterations
                .unwrap_or(defaults.simple_mode_max_iterations),
        }
    }
}

/// Load the layered runtime configuration: an optional system file, an
/// optional per-user file (`directories::ProjectDirs`), an optional
/// workspace-local `./canopy.toml`, then environment overrides.
///
/// Missing files at any layer are treated as an empty layer, not an error;
/// only a present-but-malformed file fails the load.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if a present file does not parse.
pub fn load_runtime_config(workspace_root: impl AsRef<Path>) -> ConfigResult<RuntimeConfig> {
    let mut layer = RuntimeConfigLayer::default();

    if let Some(dirs) = directories::ProjectDirs::from("dev", "canopy", "canopy") {
        layer = layer.merge(read_layer_if_present(&dirs.config_dir().join("config.toml"))?);
    }

    let workspace_file = workspace_root.as_ref().join("canopy.toml");
    layer = layer.merge(read_layer_if_present(&workspace_file)?);
    layer = layer.merge(layer_from_env());

    Ok(RuntimeConfig::from_layer(layer))
}

/// Parse runtime configuration from a single in-memory TOML string, with no
/// file-system or environment layering. Useful for tests and for embedding
/// a fixed configuration in a binary.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if `content` is not valid TOML.
pub fn load_runtime_config_from_str(content: &str) -> ConfigResult<RuntimeConfig> {
    let layer: RuntimeConfigLayer = toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: "<inline>".to_string(),
        message: e.to_string(),
    })?;
    Ok(RuntimeConfig::from_layer(layer))
}

fn read_layer_if_present(path: &PathBuf) -> ConfigResult<RuntimeConfigLayer> {
    if !path.exists() {
        return Ok(RuntimeConfigLayer::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_files_present() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_runtime_config(dir.path()).unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn workspace_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("canopy.toml"),
            "log_filter = \"debug\"\nsimple_mode_max_iterations = 4\n",
        )
        .unwrap();
        let config = load_runtime_config(dir.path()).unwrap();
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.simple_mode_max_iterations, 4);
        assert_eq!(config.remote_call_timeout, Duration::from_secs(60));
    }

    #[test]
    fn inline_parsing_matches_file_parsing() {
        let config = load_runtime_config_from_str("log_filter = \"warn\"").unwrap();
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn malformed_workspace_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("canopy.toml"), "not valid [ toml").unwrap();
        assert!(load_runtime_config(dir.path()).is_err());
    }
}
