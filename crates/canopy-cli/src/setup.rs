//! Wires a loaded node-tree document into a running [`canopy_runtime::Engine`].

use std::sync::Arc;

use anyhow::{Context, Result};
use canopy_config::{ToolBackendSpec, TreeDocument};
use canopy_conversation::InMemoryConversationStore;
use canopy_llm::MockLlmAdapter;
use canopy_runtime::{Engine, LlmFactory, PeerRegistry};
use canopy_tools::{HttpBackend, NoOpBackend, StdioBackend, ToolBackend, ToolBroker};

/// Start every configured tool backend, build the peer registry, and return
/// a ready [`Engine`] for `canopy run`/`canopy validate` to drive.
///
/// The LLM factory defaults to [`MockLlmAdapter`] — this binary has no
/// vendor credentials wired in; a real deployment supplies its own
/// `LlmFactory` by embedding this crate's `setup::build_engine` logic with a
/// different factory rather than configuring one through the tree document,
/// since model credentials are deployment secrets, not tree state.
///
/// # Errors
///
/// Propagates a backend start failure or an unknown/malformed peer in the
/// tree.
pub async fn build_engine(doc: TreeDocument) -> Result<Engine> {
    let backends = start_backends(&doc.tool_backends).await?;
    let broker = ToolBroker::start(backends)
        .await
        .context("starting tool backends")?;

    let peers = PeerRegistry::build(&doc.root).context("building peer registry from node tree")?;

    let llm_factory: LlmFactory = Arc::new(|model: &str| {
        Arc::new(MockLlmAdapter::new(model.to_string())) as Arc<dyn canopy_llm::LlmAdapter>
    });

    let store = Arc::new(InMemoryConversationStore::default());

    Ok(Engine::new(
        Arc::new(broker),
        Arc::new(peers),
        llm_factory,
        store,
        doc.root,
    ))
}

async fn start_backends(specs: &[ToolBackendSpec]) -> Result<Vec<Arc<dyn ToolBackend>>> {
    if specs.is_empty() {
        return Ok(vec![Arc::new(NoOpBackend::new("none"))]);
    }

    let mut backends: Vec<Arc<dyn ToolBackend>> = Vec::with_capacity(specs.len());
    for spec in specs {
        let backend: Arc<dyn ToolBackend> = match spec {
            ToolBackendSpec::Stdio { name, command, args, env } => {
                Arc::new(StdioBackend::new(name.clone(), command.clone(), args.clone(), env.clone()))
            }
            ToolBackendSpec::Http { name, url } => Arc::new(HttpBackend::new(name.clone(), url.clone())),
            ToolBackendSpec::NoOp { name } => Arc::new(NoOpBackend::new(name.clone())),
        };
        backends.push(backend);
    }
    Ok(backends)
}
