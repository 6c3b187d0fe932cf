use std::collections::HashMap;
use std::sync::Arc;

use canopy_config::{NodeKind, NodeSpec};
use canopy_remote::RemoteAgentClient;

use crate::error::RuntimeResult;

/// The bits of a configured peer the executor and approval resolver need,
/// independent of whether the peer came from an `llm` node's `peers` list or
/// is a `remote-agent` leaf's own identity.
#[derive(Debug, Clone)]
pub struct PeerInfo {
    /// Synthetic-tool / proxy-approval key.
    pub name: String,
    /// Whether delegating to this peer requires approval unless overridden.
    pub destructive_intent: bool,
    /// Human-readable description surfaced in approval prompts and catalogs.
    pub description: Option<String>,
}

/// A flat, tree-wide `name -> client` map, built once at startup by walking
/// every node.
///
/// Keyed by peer name only, not `(owning-node, peer-name)`: if two nodes
/// configure a peer under the same name with different URLs, the first one
/// encountered in a pre-order walk wins and the rest are silently shadowed.
/// This is a known sharp edge, kept because the executor's synthetic-tool
/// lookup (`a2a_<peer>`) is specified as a flat map.
pub struct PeerRegistry {
    clients: HashMap<String, Arc<RemoteAgentClient>>,
    info: HashMap<String, PeerInfo>,
}

impl PeerRegistry {
    /// Walk `root` and every descendant, collecting each `llm` node's
    /// `peers` list and each `remote-agent` leaf's own identity.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RuntimeError::MissingRemoteUrl`] if a `remote-agent`
    /// leaf has no `remote_url`, or propagates a client construction error
    /// for a malformed peer URL.
    pub fn build(root: &NodeSpec) -> RuntimeResult<Self> {
        let mut clients = HashMap::new();
        let mut info = HashMap::new();
        collect(root, &mut clients, &mut info)?;
        Ok(Self { clients, info })
    }

    /// Look up a peer's client by name.
    #[must_use]
    pub fn client(&self, name: &str) -> Option<Arc<RemoteAgentClient>> {
        self.clients.get(name).cloned()
    }

    /// Look up a peer's static metadata by name.
    #[must_use]
    pub fn info(&self, name: &str) -> Option<&PeerInfo> {
        self.info.get(name)
    }
}

fn collect(
    node: &NodeSpec,
    clients: &mut HashMap<String, Arc<RemoteAgentClient>>,
    info: &mut HashMap<String, PeerInfo>,
) -> RuntimeResult<()> {
    for peer in &node.peers {
        insert_if_absent(
            clients,
            info,
            &peer.name,
            &peer.remote_url,
            peer.destructive_intent,
            peer.description.clone(),
        )?;
    }

    if node.kind == NodeKind::RemoteAgent {
        let remote_url = node
            .remote_url
            .clone()
            .ok_or_else(|| crate::error::RuntimeError::MissingRemoteUrl(node.name.clone()))?;
        insert_if_absent(
            clients,
            info,
            &node.name,
            &remote_url,
            node.destructive_intent,
            node.description.clone(),
        )?;
    }

    for child in &node.children {
        collect(child, clients, info)?;
    }

    Ok(())
}

fn insert_if_absent(
    clients: &mut HashMap<String, Arc<RemoteAgentClient>>,
    info: &mut HashMap<String, PeerInfo>,
    name: &str,
    remote_url: &str,
    destructive_intent: bool,
    description: Option<String>,
) -> RuntimeResult<()> {
    if clients.contains_key(name) {
        tracing::warn!(peer = name, "duplicate peer name, keeping first registration");
        return Ok(());
    }

    let client = RemoteAgentClient::new(name.to_string(), remote_url.to_string())?;
    clients.insert(name.to_string(), Arc::new(client));
    info.insert(
        name.to_string(),
        PeerInfo {
            name: name.to_string(),
            destructive_intent,
            description,
        },
    );
    Ok(())
}
