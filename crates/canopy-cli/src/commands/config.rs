//! `canopy config show` — render the layered runtime configuration that
//! would apply from the current working directory.

use anyhow::Result;
use canopy_config::{load_runtime_config, render_effective_config};

pub(crate) fn show() -> Result<()> {
    let workspace_root = std::env::current_dir()?;
    let config = load_runtime_config(&workspace_root)?;
    println!("{}", render_effective_config(&config));
    Ok(())
}
