#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Node-tree executor and pause/resume orchestration for the Canopy agent
//! orchestration runtime.
//!
//! This crate turns a configured [`canopy_config::NodeSpec`] tree into a
//! running [`Orchestrator`]: one call per user turn walks (or re-enters) the
//! tree, staging a [`canopy_approval::PendingApproval`] whenever a
//! destructive operation needs a human's sign-off and resuming exactly where
//! it left off once that approval is resolved. A bare `llm` leaf with no
//! children skips the tree walk entirely and runs the backwards-compatible
//! bounded tool loop described in the simple-mode runner.

mod approval_resolver;
mod catalog;
mod conversation_handle;
mod engine;
mod error;
mod executor;
mod outcome;
mod peers;
mod resume;
mod simple_mode;
mod synthetic_tools;

use canopy_conversation::{Conversation, ConversationError};
use canopy_core::RequestContext;
use canopy_session::SessionState;
use uuid::Uuid;

pub use catalog::node_tool_catalog;
pub use conversation_handle::{SharedConversation, share, unshare};
pub use engine::{Engine, LlmFactory};
pub use error::{RuntimeError, RuntimeResult};
pub use outcome::ExecOutcome;
pub use peers::{PeerInfo, PeerRegistry};
pub use resume::ResumeCursor;
pub use synthetic_tools::{
    EXIT_LOOP_TOOL, PEER_TOOL_PREFIX, exit_loop_tool_descriptor, peer_name_from_tool, peer_tool_descriptor,
    peer_tool_name,
};

/// What a caller-facing turn produced: always a rendered response, plus
/// whatever detail is needed to act on a pause.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Text to show the user for this turn.
    pub response: String,
    /// Whether a [`canopy_approval::PendingApproval`] is now staged on the
    /// conversation and nothing further will happen until it resolves.
    pub waiting_approval: bool,
    /// The staged approval's summary, present exactly when `waiting_approval`
    /// is `true`.
    pub approval: Option<ApprovalSummary>,
}

/// Caller-facing projection of a staged [`canopy_approval::PendingApproval`].
#[derive(Debug, Clone)]
pub struct ApprovalSummary {
    /// The id to pass back to [`Orchestrator::resolve_approval`].
    pub uuid: String,
    /// Human-readable description of what is being approved.
    pub description: String,
    /// The tool (or `a2a_<peer>` delegation) this approval gates.
    pub tool_name: Option<String>,
}

impl TurnOutcome {
    fn from_execution(conversation: &Conversation, outcome: ExecOutcome) -> Self {
        match outcome {
            ExecOutcome::Text(text) => Self {
                response: text,
                waiting_approval: false,
                approval: None,
            },
            ExecOutcome::WaitingApproval => {
                let approval = conversation.pending_approval.as_ref();
                let response = approval
                    .map(|pending| pending.description.clone())
                    .unwrap_or_else(|| "Waiting for approval.".to_string());
                Self {
                    response,
                    waiting_approval: true,
                    approval: approval.map(approval_summary),
                }
            }
            ExecOutcome::ExitLoop => Self {
                response: String::new(),
                waiting_approval: false,
                approval: None,
            },
            ExecOutcome::AuthRequired { server, .. } => Self {
                response: format!("authentication required to access {server}"),
                waiting_approval: false,
                approval: None,
            },
        }
    }
}

fn approval_summary(approval: &canopy_approval::PendingApproval) -> ApprovalSummary {
    let tool_name = match &approval.kind {
        canopy_approval::ApprovalKind::Local { tool_name, .. } => Some(tool_name.clone()),
        canopy_approval::ApprovalKind::Proxy { remote_agent_name, .. } => {
            Some(peer_tool_name(remote_agent_name))
        }
    };
    ApprovalSummary {
        uuid: approval.id.as_uuid().to_string(),
        description: approval.description.clone(),
        tool_name,
    }
}

/// Runs one configured node tree: the caller-facing surface over
/// [`executor::execute`], [`simple_mode::run_simple_mode`] and
/// [`approval_resolver::resolve`].
pub struct Orchestrator {
    engine: Engine,
}

impl Orchestrator {
    /// Wrap an already-built [`Engine`].
    #[must_use]
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Start a fresh, empty, active conversation ready for
    /// [`Orchestrator::process_message`].
    #[must_use]
    pub fn start_conversation(&self, session_id: Option<String>) -> Conversation {
        Conversation::new(format!("conv-{}", Uuid::new_v4()), session_id)
    }

    /// Run one user turn against `conversation`: either the node tree or,
    /// for a bare `llm` root, the backwards-compatible simple-mode loop.
    ///
    /// # Errors
    ///
    /// Propagates configuration errors (unknown peer, malformed resume
    /// path) and conversation-store failures. Tool, peer and LLM transport
    /// failures are folded into the returned [`TurnOutcome::response`]
    /// rather than propagated.
    pub async fn process_message(
        &self,
        ctx: &RequestContext,
        conversation: Conversation,
        user_message: &str,
    ) -> RuntimeResult<(Conversation, TurnOutcome)> {
        let mut conversation = conversation;
        if conversation.messages.is_empty() {
            conversation.push(canopy_conversation::Message::text(
                canopy_conversation::MessageRole::System,
                self.engine.root.prompt_template.clone(),
            ));
        }
        conversation.push(canopy_conversation::Message::text(
            canopy_conversation::MessageRole::User,
            user_message,
        ));

        let shared = conversation_handle::share(conversation);
        let outcome = if self.engine.simple_mode {
            simple_mode::run_simple_mode(&self.engine, ctx, &self.engine.default_model, &shared).await?
        } else {
            let state = SessionState::new();
            executor::execute(
                &self.engine,
                ctx,
                &self.engine.root,
                &state,
                user_message,
                &shared,
                None,
                Vec::new(),
                false,
            )
            .await?
        };
        let conversation = conversation_handle::unshare(shared);
        self.engine.store.save(&conversation).await?;

        let turn = TurnOutcome::from_execution(&conversation, outcome);
        Ok((conversation, turn))
    }

    /// Resolve the pending approval identified by `uuid` and resume the
    /// paused turn.
    ///
    /// # Errors
    ///
    /// See [`approval_resolver::resolve`].
    pub async fn resolve_approval(
        &self,
        ctx: &RequestContext,
        uuid: &str,
        approved: bool,
    ) -> RuntimeResult<(Conversation, TurnOutcome)> {
        let (conversation, outcome) = approval_resolver::resolve(&self.engine, ctx, uuid, approved).await?;
        let turn = TurnOutcome::from_execution(&conversation, outcome);
        Ok((conversation, turn))
    }

    /// List every persisted conversation's id — a read-through the backing
    /// store already supports, and a caller needs it to build any kind of
    /// conversation listing UI.
    ///
    /// # Errors
    ///
    /// Propagates a store failure.
    pub async fn list_conversations(&self) -> Result<Vec<String>, ConversationError> {
        Ok(self
            .engine
            .store
            .list()
            .await?
            .into_iter()
            .map(|conversation| conversation.id)
            .collect())
    }

    /// Load one persisted conversation by id.
    ///
    /// # Errors
    ///
    /// Propagates [`ConversationError::NotFound`] or a store failure.
    pub async fn get_conversation(&self, id: &str) -> Result<Conversation, ConversationError> {
        self.engine.store.load(id).await
    }
}
