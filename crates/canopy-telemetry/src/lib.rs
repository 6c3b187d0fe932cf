#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Logging setup for the Canopy agent orchestration runtime.
//!
//! This crate has no dependency on any other `canopy-*` crate: every
//! component — the tool broker, the node executor, the CLI — depends on
//! `canopy-telemetry`, never the other way around.
//!
//! ```
//! use canopy_telemetry::{setup_logging, LogConfig};
//!
//! let _guard = setup_logging(&LogConfig::default()).expect("logging init");
//! tracing::info!("runtime starting");
//! ```

mod config;
mod context;
mod error;

pub use config::{LogConfig, LogFormat};
pub use context::RequestSpan;
pub use error::{TelemetryError, TelemetryResult};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global tracing subscriber built from `config`.
///
/// Returns a guard that must be kept alive for the lifetime of the process
/// when file logging is enabled — dropping it flushes the background writer
/// and stops it from accepting further lines.
///
/// # Errors
///
/// Returns [`TelemetryError::AlreadyInitialized`] if a global subscriber is
/// already installed, or [`TelemetryError::Io`] if the log directory cannot
/// be created.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| TelemetryError::InvalidFilter(e.to_string()))?;

    let (writer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "canopy.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (Some(non_blocking), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match (config.format, writer) {
        (LogFormat::Json, Some(w)) => registry
            .with(fmt::layer().json().with_writer(w))
            .try_init(),
        (LogFormat::Json, None) => registry.with(fmt::layer().json()).try_init(),
        (LogFormat::Pretty, Some(w)) => registry
            .with(fmt::layer().pretty().with_writer(w))
            .try_init(),
        (LogFormat::Pretty, None) => registry.with(fmt::layer().pretty()).try_init(),
        (LogFormat::Compact, Some(w)) => registry
            .with(fmt::layer().compact().with_writer(w))
            .try_init(),
        (LogFormat::Compact, None) => registry.with(fmt::layer().compact()).try_init(),
    };

    result.map_err(|_| TelemetryError::AlreadyInitialized)?;
    Ok(guard)
}
