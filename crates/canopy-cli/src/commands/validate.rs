//! `canopy validate` — load a node-tree document and check its structural
//! invariants without starting any backend or peer.

use anyhow::Result;
use canopy_config::{load_node_tree, validate_tree};

pub(crate) fn run(tree_path: &str) -> Result<()> {
    let doc = load_node_tree(tree_path)?;
    validate_tree(&doc.root)?;
    println!("{tree_path}: valid node tree ({} tool backend(s))", doc.tool_backends.len());
    Ok(())
}
