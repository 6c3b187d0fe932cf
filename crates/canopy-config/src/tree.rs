use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

/// The kind of a node in the execution tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// Runs children in order; propagates a pause from any child immediately.
    Sequential,
    /// Runs children concurrently; children may not pause for approval.
    Parallel,
    /// Runs children repeatedly until one exits the loop or the cap is hit.
    Loop,
    /// A leaf that calls the LLM adapter.
    Llm,
    /// A leaf that delegates to a peer runtime.
    RemoteAgent,
}

impl<'de> Deserialize<'de> for NodeKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_str_lenient(&raw))
    }
}

impl NodeKind {
    /// Parse a node kind, falling back to [`NodeKind::Llm`] for anything
    /// unrecognized rather than rejecting the document at load time.
    ///
    /// The fallback is intentional: it preserves the behavior of the system
    /// this runtime's tree format was distilled from, and is logged so the
    /// fallback is observable rather than silent.
    #[must_use]
    pub fn from_str_lenient(raw: &str) -> Self {
        match raw.to_ascii_lowercase().replace('_', "-").as_str() {
            "sequential" => NodeKind::Sequential,
            "parallel" => NodeKind::Parallel,
            "loop" => NodeKind::Loop,
            "llm" => NodeKind::Llm,
            "remote-agent" => NodeKind::RemoteAgent,
            other => {
                tracing::warn!(kind = other, "unrecognized node kind, defaulting to llm");
                NodeKind::Llm
            }
        }
    }

    /// Whether nodes of this kind are composite (have children) rather than leaves.
    #[must_use]
    pub fn is_composite(self) -> bool {
        matches!(self, NodeKind::Sequential | NodeKind::Parallel | NodeKind::Loop)
    }
}

fn default_max_iterations() -> u32 {
    10
}

/// One node of the declaratively configured execution tree.
///
/// Loaded once at startup and never mutated; the node executor treats this
/// as read-only configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeSpec {
    /// Node kind; see [`NodeKind`].
    pub kind: NodeKind,
    /// Stable identifier, used in log lines and as a delegation key.
    pub name: String,
    /// Ordered child nodes. Empty for leaves.
    #[serde(default)]
    pub children: Vec<NodeSpec>,
    /// `{key}`-templated prompt, resolved against session state. Leaves only.
    #[serde(default)]
    pub prompt_template: String,
    /// Session-state key this node's textual result is stored under.
    #[serde(default)]
    pub output_key: Option<String>,
    /// LLM model selector, for `llm` leaves.
    #[serde(default)]
    pub model: Option<String>,
    /// Whether this node is given a synthetic `exit-loop` tool.
    #[serde(default)]
    pub can_exit_loop: bool,
    /// Maximum iterations for a `loop` node.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Whether invoking this node (as a remote-agent leaf, or as a peer
    /// delegation target) requires approval unless the caller overrides it.
    #[serde(default)]
    pub destructive_intent: bool,
    /// Base URL of the peer runtime, for `remote-agent` leaves.
    #[serde(default)]
    pub remote_url: Option<String>,
    /// Human-readable description surfaced in approval prompts.
    #[serde(default)]
    pub description: Option<String>,
    /// Peers exposed to an `llm` node as synthetic `a2a_<name>` tools.
    #[serde(default)]
    pub peers: Vec<PeerSpec>,
}

/// A peer runtime exposed to an `llm` node as a synthetic delegation tool.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PeerSpec {
    /// Peer name; the synthetic tool is named `a2a_<name>`.
    pub name: String,
    /// Base URL of the peer runtime.
    pub remote_url: String,
    /// Whether delegating to this peer requires approval unless overridden.
    #[serde(default)]
    pub destructive_intent: bool,
    /// Human-readable description surfaced in approval prompts and tool catalogs.
    #[serde(default)]
    pub description: Option<String>,
}

/// Transport for a configured tool backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum ToolBackendSpec {
    /// Spawn a subprocess speaking MCP over stdio.
    Stdio {
        /// Backend name, used for catalog tagging and conflict reporting.
        name: String,
        /// Command to execute.
        command: String,
        /// Arguments to the command.
        #[serde(default)]
        args: Vec<String>,
        /// Environment variables for the subprocess.
        #[serde(default)]
        env: HashMap<String, String>,
    },
    /// Connect to a streamable-HTTP MCP endpoint.
    Http {
        /// Backend name, used for catalog tagging and conflict reporting.
        name: String,
        /// Endpoint URL.
        url: String,
    },
    /// Contribute no tools. Useful for trees with no broker configured.
    NoOp {
        /// Backend name.
        name: String,
    },
}

impl ToolBackendSpec {
    /// The configured name of this backend.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ToolBackendSpec::Stdio { name, .. }
            | ToolBackendSpec::Http { name, .. }
            | ToolBackendSpec::NoOp { name } => name,
        }
    }
}

/// Top-level node-tree document: the root node plus the tool backends it is
/// allowed to call through.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TreeDocument {
    /// Root of the execution tree.
    pub root: NodeSpec,
    /// Tool backends the broker should start.
    #[serde(default)]
    pub tool_backends: Vec<ToolBackendSpec>,
}

/// Load and parse a node-tree document from disk.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, or
/// [`ConfigError::Parse`] if it is not a valid document.
pub fn load_node_tree(path: impl AsRef<Path>) -> ConfigResult<TreeDocument> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_node_tree_from_str(&content, &path.display().to_string())
}

/// Parse a node-tree document from an in-memory TOML string.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if `content` is not valid TOML or does not
/// match the document shape.
pub fn load_node_tree_from_str(content: &str, source_label: &str) -> ConfigResult<TreeDocument> {
    toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: source_label.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_kind_falls_back_to_llm() {
        assert_eq!(NodeKind::from_str_lenient("bogus"), NodeKind::Llm);
        assert_eq!(NodeKind::from_str_lenient("Sequential"), NodeKind::Sequential);
        assert_eq!(NodeKind::from_str_lenient("remote_agent"), NodeKind::RemoteAgent);
    }

    #[test]
    fn parses_minimal_single_leaf_tree() {
        let toml = r#"
[root]
kind = "llm"
name = "assistant"
prompt_template = "Answer: {question}"
output_key = "answer"
"#;
        let doc = load_node_tree_from_str(toml, "test").unwrap();
        assert_eq!(doc.root.kind, NodeKind::Llm);
        assert_eq!(doc.root.name, "assistant");
        assert!(doc.tool_backends.is_empty());
    }

    #[test]
    fn parses_nested_sequential_tree_with_backends() {
        let toml = r#"
[root]
kind = "sequential"
name = "pipeline"

[[root.children]]
kind = "llm"
name = "analyze"
prompt_template = "Analyze {input}"
output_key = "analysis"

[[root.children]]
kind = "llm"
name = "act"
prompt_template = "Act on {analysis}"

[[tool_backends]]
transport = "stdio"
name = "fs"
command = "mcp-fs"
args = ["--root", "/tmp"]
"#;
        let doc = load_node_tree_from_str(toml, "test").unwrap();
        assert_eq!(doc.root.children.len(), 2);
        assert_eq!(doc.tool_backends.len(), 1);
        assert_eq!(doc.tool_backends[0].name(), "fs");
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = load_node_tree_from_str("not valid [ toml", "test").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
