use std::sync::Arc;

use canopy_approval::PendingApproval;
use canopy_config::{NodeKind, NodeSpec};
use canopy_conversation::{Conversation, ConversationStore, Message, MessageRole, PipelineState};
use canopy_llm::{LlmAdapter, LlmClientCache};
use canopy_tools::ToolBroker;

use crate::conversation_handle::SharedConversation;
use crate::error::RuntimeResult;
use crate::peers::PeerRegistry;

/// Constructs an [`LlmAdapter`] for a given model name, e.g. backed by a
/// vendor client factory or, for tests and the default CLI configuration,
/// [`canopy_llm::MockLlmAdapter::new`].
pub type LlmFactory = Arc<dyn Fn(&str) -> Arc<dyn LlmAdapter> + Send + Sync>;

/// Everything the node executor, the simple-mode runner and the approval
/// resolver share for the lifetime of one running tree.
///
/// Built once at startup and handed around by shared reference; every field
/// that needs interior mutability already provides its own synchronization
/// (the broker's call mutex, the LLM cache's mutex, the store's own
/// concurrency contract).
pub struct Engine {
    /// Merged tool backend catalog.
    pub broker: Arc<ToolBroker>,
    /// Flat peer-name registry built by walking the tree once at startup.
    pub peers: Arc<PeerRegistry>,
    /// Per-model adapter cache.
    pub llm_cache: LlmClientCache,
    /// Builds a fresh adapter for a model the cache hasn't seen yet.
    pub llm_factory: LlmFactory,
    /// Conversation persistence.
    pub store: Arc<dyn ConversationStore>,
    /// Root of the configured node tree.
    pub root: NodeSpec,
    /// Whether `root` is a bare `llm` leaf — the backwards-compatible
    /// single-node configuration that runs through the simple-mode runner
    /// instead of the node executor.
    pub simple_mode: bool,
    /// Model name used by the simple-mode runner and by approval resolution
    /// when no pipeline state names a more specific one.
    pub default_model: String,
}

impl Engine {
    /// Build an engine from its already-started collaborators.
    #[must_use]
    pub fn new(
        broker: Arc<ToolBroker>,
        peers: Arc<PeerRegistry>,
        llm_factory: LlmFactory,
        store: Arc<dyn ConversationStore>,
        root: NodeSpec,
    ) -> Self {
        let simple_mode = root.kind == NodeKind::Llm && root.children.is_empty();
        let default_model = root
            .model
            .clone()
            .unwrap_or_else(|| "default".to_string());
        Self {
            broker,
            peers,
            llm_cache: LlmClientCache::new(),
            llm_factory,
            store,
            root,
            simple_mode,
            default_model,
        }
    }

    /// The cached adapter for `model`, constructing one via `llm_factory` on
    /// first use.
    pub async fn adapter_for(&self, model: &str) -> Arc<dyn LlmAdapter> {
        let factory = Arc::clone(&self.llm_factory);
        let model_owned = model.to_string();
        self.llm_cache
            .get_or_create(model, move || factory(&model_owned))
            .await
    }

    /// Stage `approval` on `conversation`, append the human-readable
    /// approval message, and persist the result — the single place this
    /// three-step sequence happens, shared by the node executor, the
    /// simple-mode runner and the approval resolver's re-pause path.
    ///
    /// # Errors
    ///
    /// Propagates a [`crate::RuntimeError::Conversation`] if the store fails.
    pub async fn stage_approval(
        &self,
        conversation: &SharedConversation,
        approval: PendingApproval,
        pipeline_state: Option<PipelineState>,
    ) -> RuntimeResult<()> {
        let snapshot = stage_on(conversation, approval, pipeline_state).await;
        self.store.save(&snapshot).await?;
        Ok(())
    }
}

async fn stage_on(
    conversation: &SharedConversation,
    approval: PendingApproval,
    pipeline_state: Option<PipelineState>,
) -> Conversation {
    let mut guard = conversation.lock().await;
    let description = approval.description.clone();
    let id = approval.id;
    guard.stage_approval(approval, pipeline_state);
    guard.push(Message::text(
        MessageRole::Assistant,
        format!("{description} ({id})"),
    ));
    guard.clone()
}
