#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! The composite tool broker for the Canopy agent orchestration runtime.
//!
//! A [`ToolBroker`] merges one or more [`ToolBackend`]s — MCP servers
//! reached over stdio or streamable-HTTP, or a [`NoOpBackend`] placeholder —
//! into a single flat tool catalog, and serializes dispatch through it.

mod backend;
mod broker;
mod error;
mod http;
mod noop;
mod outcome;
mod stdio;

pub use backend::{BackendStatus, ToolBackend};
pub use broker::ToolBroker;
pub use error::{ToolsError, ToolsResult};
pub use http::HttpBackend;
pub use noop::NoOpBackend;
pub use outcome::{ToolArgs, ToolCallOutcome, ToolCallResult, ToolContent};
pub use stdio::StdioBackend;
