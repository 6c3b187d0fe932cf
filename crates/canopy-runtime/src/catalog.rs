use canopy_config::NodeSpec;
use canopy_core::ToolDescriptor;

use crate::engine::Engine;
use crate::synthetic_tools::{exit_loop_tool_descriptor, peer_tool_descriptor};

/// The tool catalog offered to one `llm` node: the broker's merged catalog,
/// plus a synthetic `a2a_<peer>` descriptor for each peer this node lists,
/// plus `exit-loop` when the node is allowed to break its enclosing loop.
#[must_use]
pub fn node_tool_catalog(engine: &Engine, node: &NodeSpec) -> Vec<ToolDescriptor> {
    let mut tools = engine.broker.list_tools();
    for peer in &node.peers {
        tools.push(peer_tool_descriptor(
            &peer.name,
            peer.description.as_deref(),
            peer.destructive_intent,
        ));
    }
    if node.can_exit_loop {
        tools.push(exit_loop_tool_descriptor());
    }
    tools
}
