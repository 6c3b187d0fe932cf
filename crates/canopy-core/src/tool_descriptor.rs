use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Describes one tool available to an LLM node: its name, its JSON-Schema
/// input shape, and whether invoking it needs human approval unless the
/// enclosing composition overrides that.
///
/// Lives in `canopy-core` rather than the tool broker crate because both the
/// broker (which builds these) and the LLM adapter (which only reads them)
/// need the type, and neither should depend on the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name, unique within a broker's merged catalog.
    pub name: String,
    /// Human-readable description shown to the LLM.
    pub description: String,
    /// JSON-Schema-shaped input description (`{type, properties, required}`).
    pub input_schema: JsonValue,
    /// Whether this tool requires approval unless overridden.
    pub destructive_intent: bool,
    /// Name of the backend that contributed this tool.
    pub server: String,
}

impl ToolDescriptor {
    /// Build a descriptor for a non-destructive tool with an empty schema.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({"type": "object", "properties": {}}),
            destructive_intent: false,
            server: server.into(),
        }
    }

    /// Mark this descriptor as destructive.
    #[must_use]
    pub fn destructive(mut self) -> Self {
        self.destructive_intent = true;
        self
    }

    /// Attach an input schema.
    #[must_use]
    pub fn with_schema(mut self, schema: JsonValue) -> Self {
        self.input_schema = schema;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_destructive_flag() {
        let tool = ToolDescriptor::new("rm", "delete a file", "fs").destructive();
        assert!(tool.destructive_intent);
        assert_eq!(tool.server, "fs");
    }
}
