use canopy_approval::PendingApproval;
use canopy_core::{Timestamp, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The role a message in a conversation's log was authored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// The system prompt / instructions, if any.
    System,
    /// Text typed by the human, including synthesized `[APPROVAL]: ...` entries.
    User,
    /// Text or tool-call produced by the LLM.
    Assistant,
    /// The result of executing a tool call.
    Tool,
}

/// A tool invocation attached to an assistant message, or a tool result
/// attached to a tool message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Name of the invoked tool.
    pub tool_name: String,
    /// Arguments it was invoked with.
    pub arguments: Value,
    /// The tool's textual result, once available.
    pub result_text: Option<String>,
    /// Whether `result_text` represents an error.
    pub is_error: bool,
}

/// One entry in a conversation's append-only message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who authored this entry.
    pub role: MessageRole,
    /// The textual content.
    pub content: String,
    /// An attached tool call/result, if this message carries one.
    pub tool_call: Option<ToolCallRecord>,
    /// When this entry was appended.
    pub at: Timestamp,
}

impl Message {
    /// Build a plain text message with no attached tool call.
    #[must_use]
    pub fn text(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call: None,
            at: Timestamp::now(),
        }
    }

    /// Build a message carrying a tool call or its result.
    #[must_use]
    pub fn with_tool_call(
        role: MessageRole,
        content: impl Into<String>,
        tool_call: ToolCallRecord,
    ) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call: Some(tool_call),
            at: Timestamp::now(),
        }
    }
}

/// Lifecycle status of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    /// Running normally; no approval is pending.
    Active,
    /// Suspended on a pending approval.
    WaitingApproval,
    /// The current turn has finished and no further input is expected
    /// (reserved for trees that signal terminal completion; most
    /// conversations simply return to `Active` between turns).
    Completed,
}

/// The snapshot saved when execution pauses inside an orchestrated tree.
///
/// Absent when a pause happens in the simple-mode runner, which has no tree
/// position to save — it resumes from the message log alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    /// Child-index path from the tree root to the paused node.
    pub paused_node_path: Vec<usize>,
    /// The paused node's configured output key, if any.
    pub paused_node_output_key: Option<String>,
    /// Full session-state snapshot taken at the moment of pause.
    pub session_state_snapshot: HashMap<String, String>,
    /// The user message that originated this turn.
    pub user_message: String,
}

/// The persistent record of one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Opaque conversation id.
    pub id: String,
    /// Optional correlator propagated to tool calls.
    pub session_id: Option<String>,
    /// Current lifecycle status.
    pub status: ConversationStatus,
    /// Append-only message log.
    pub messages: Vec<Message>,
    /// The single pending approval, if `status` is `WaitingApproval`.
    pub pending_approval: Option<PendingApproval>,
    /// Saved tree position, if paused inside an orchestrated tree.
    pub pipeline_state: Option<PipelineState>,
}

impl Conversation {
    /// Start a fresh, empty, active conversation.
    #[must_use]
    pub fn new(id: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            id: id.into(),
            session_id,
            status: ConversationStatus::Active,
            messages: Vec::new(),
            pending_approval: None,
            pipeline_state: None,
        }
    }

    /// Append a message to the log.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Stage an approval, moving this conversation to `WaitingApproval`.
    ///
    /// # Panics
    ///
    /// Panics if an approval is already pending — callers must clear the
    /// existing one via [`Conversation::resolve_pending_approval`] first;
    /// this is an invariant violation in the executor, not a recoverable
    /// caller error.
    pub fn stage_approval(
        &mut self,
        approval: PendingApproval,
        pipeline_state: Option<PipelineState>,
    ) {
        assert!(
            self.pending_approval.is_none(),
            "conversation {} already has a pending approval",
            self.id
        );
        self.pending_approval = Some(approval);
        self.pipeline_state = pipeline_state;
        self.status = ConversationStatus::WaitingApproval;
    }

    /// Clear the pending approval and pipeline state, returning to `Active`.
    ///
    /// Returns the cleared approval and pipeline state so the caller (the
    /// approval resolver) can act on them.
    pub fn resolve_pending_approval(
        &mut self,
    ) -> Option<(PendingApproval, Option<PipelineState>)> {
        let approval = self.pending_approval.take()?;
        let pipeline_state = self.pipeline_state.take();
        self.status = ConversationStatus::Active;
        Some((approval, pipeline_state))
    }
}
