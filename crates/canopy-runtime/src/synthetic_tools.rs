use canopy_core::ToolDescriptor;
use serde_json::json;

/// Name of the tool that lets a `can-exit-loop` leaf break its enclosing loop.
pub const EXIT_LOOP_TOOL: &str = "exit-loop";

/// Prefix every peer delegation tool is registered under.
pub const PEER_TOOL_PREFIX: &str = "a2a_";

/// Build the synthetic tool name for delegating to `peer_name`.
#[must_use]
pub fn peer_tool_name(peer_name: &str) -> String {
    format!("{PEER_TOOL_PREFIX}{peer_name}")
}

/// Recover the peer name from a synthetic `a2a_<peer>` tool name.
#[must_use]
pub fn peer_name_from_tool(tool_name: &str) -> Option<&str> {
    tool_name.strip_prefix(PEER_TOOL_PREFIX)
}

/// Descriptor for a peer's synthetic delegation tool, offered to an `llm`
/// node alongside the broker catalog.
#[must_use]
pub fn peer_tool_descriptor(peer_name: &str, description: Option<&str>, destructive: bool) -> ToolDescriptor {
    let description = description
        .map(str::to_string)
        .unwrap_or_else(|| format!("Delegate to the '{peer_name}' peer agent"));
    ToolDescriptor {
        name: peer_tool_name(peer_name),
        description,
        input_schema: json!({
            "type": "object",
            "properties": {"message": {"type": "string"}},
            "required": ["message"],
        }),
        destructive_intent: destructive,
        server: "a2a".to_string(),
    }
}

/// Descriptor for the `exit-loop` tool, offered only to `can-exit-loop` leaves.
#[must_use]
pub fn exit_loop_tool_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: EXIT_LOOP_TOOL.to_string(),
        description: "Stop the enclosing loop and return its result".to_string(),
        input_schema: json!({"type": "object", "properties": {}}),
        destructive_intent: false,
        server: "core".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_tool_name_round_trips() {
        let name = peer_tool_name("researcher");
        assert_eq!(name, "a2a_researcher");
        assert_eq!(peer_name_from_tool(&name), Some("researcher"));
    }

    #[test]
    fn non_peer_tool_names_do_not_match() {
        assert_eq!(peer_name_from_tool("read_file"), None);
    }
}
