#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Configuration loading for the Canopy agent orchestration runtime.
//!
//! Depends on nothing else in the workspace — every other crate consumes
//! the types here, never the reverse. Two kinds of document are loaded:
//!
//! - the **node-tree** document, which declares the tree the node executor
//!   runs (see [`NodeSpec`]);
//! - the **runtime** document, small operational tunables (tool backend
//!   definitions, timeouts, iteration caps) layered defaults → system →
//!   user → workspace → environment, matching the precedence chain
//!   load-bearing config crates in this codebase family use.

mod env;
mod error;
mod loader;
mod merge;
mod show;
mod tree;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{RuntimeConfig, load_runtime_config, load_runtime_config_from_str};
pub use show::render_effective_config;
pub use tree::{
    NodeKind, NodeSpec, PeerSpec, ToolBackendSpec, TreeDocument, load_node_tree,
    load_node_tree_from_str,
};
pub use validate::validate_tree;
