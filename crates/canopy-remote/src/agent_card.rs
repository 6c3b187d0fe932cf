use serde::{Deserialize, Serialize};

/// The discovery document a peer publishes at `/.well-known/agent.json`.
///
/// Read by callers of the broker (e.g. a configuration tool listing what a
/// peer can do) rather than by the node executor itself, which only needs
/// the peer's base URL to call `send-message`/`continue-task`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCard {
    /// Peer-advertised display name.
    pub name: String,
    /// Human-readable summary of what the peer does.
    #[serde(default)]
    pub description: String,
    /// Peer's own advertised JSON-RPC endpoint, if different from the
    /// discovery URL's origin.
    #[serde(default)]
    pub url: Option<String>,
}
