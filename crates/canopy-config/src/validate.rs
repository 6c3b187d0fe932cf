use crate::error::{ConfigError, ConfigResult};
use crate::tree::{NodeKind, NodeSpec};

/// Validate structural invariants of a loaded node tree.
///
/// Checks that composite nodes carry no prompt template and that leaves
/// carry no children — the node executor assumes both and a violation here
/// would otherwise surface as a confusing runtime behavior instead of a
/// clear startup error.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidTree`] naming the first offending node.
pub fn validate_tree(root: &NodeSpec) -> ConfigResult<()> {
    validate_node(root)
}

fn validate_node(node: &NodeSpec) -> ConfigResult<()> {
    if node.kind.is_composite() {
        if !node.prompt_template.is_empty() {
            return Err(ConfigError::InvalidTree(format!(
                "node '{}' is a {:?} node but carries a prompt_template",
                node.name, node.kind
            )));
        }
    } else if !node.children.is_empty() {
        return Err(ConfigError::InvalidTree(format!(
            "node '{}' is a {:?} leaf but has children",
            node.name, node.kind
        )));
    }

    if node.kind == NodeKind::Loop && node.max_iterations == 0 {
        return Err(ConfigError::InvalidTree(format!(
            "loop node '{}' has max_iterations = 0",
            node.name
        )));
    }

    for child in &node.children {
        validate_node(child)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::load_node_tree_from_str;

    #[test]
    fn accepts_well_formed_tree() {
        let toml = r#"
[root]
kind = "sequential"
name = "pipeline"

[[root.children]]
kind = "llm"
name = "a"
prompt_template = "go"
"#;
        let doc = load_node_tree_from_str(toml, "t").unwrap();
        validate_tree(&doc.root).unwrap();
    }

    #[test]
    fn rejects_prompt_template_on_composite() {
        let toml = r#"
[root]
kind = "sequential"
name = "pipeline"
prompt_template = "should not be here"
"#;
        let doc = load_node_tree_from_str(toml, "t").unwrap();
        assert!(validate_tree(&doc.root).is_err());
    }

    #[test]
    fn rejects_children_on_leaf() {
        let toml = r#"
[root]
kind = "llm"
name = "leaf"

[[root.children]]
kind = "llm"
name = "orphan"
"#;
        let doc = load_node_tree_from_str(toml, "t").unwrap();
        assert!(validate_tree(&doc.root).is_err());
    }

    #[test]
    fn rejects_zero_max_iterations_loop() {
        let toml = r#"
[root]
kind = "loop"
name = "loopy"
max_iterations = 0

[[root.children]]
kind = "llm"
name = "a"
prompt_template = "go"
"#;
        let doc = load_node_tree_from_str(toml, "t").unwrap();
        assert!(validate_tree(&doc.root).is_err());
    }
}
