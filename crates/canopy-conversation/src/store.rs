use crate::error::ConversationResult;
use crate::types::Conversation;
use async_trait::async_trait;

/// Storage contract the node executor and approval resolver depend on.
///
/// A real deployment backs this with a database (on-disk layout is an
/// external concern); [`crate::InMemoryConversationStore`] is the reference
/// implementation that makes this crate, and everything built on it,
/// independently testable.
///
/// Implementations must make `save` atomic at the per-conversation
/// granularity: a crash or concurrent call must never leave a conversation
/// half-written.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Persist `conversation`, creating or overwriting it.
    async fn save(&self, conversation: &Conversation) -> ConversationResult<()>;

    /// Load a conversation by id.
    async fn load(&self, id: &str) -> ConversationResult<Conversation>;

    /// List every known conversation.
    async fn list(&self) -> ConversationResult<Vec<Conversation>>;

    /// Find the conversation currently holding a pending approval with the
    /// given UUID string.
    async fn find_by_approval_uuid(&self, uuid: &str) -> ConversationResult<Conversation>;

    /// Remove a conversation. Implementations should treat deleting a
    /// missing conversation as a no-op rather than an error.
    async fn delete(&self, id: &str) -> ConversationResult<()>;
}
