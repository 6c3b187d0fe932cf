use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{ConversationError, ConversationResult};
use crate::store::ConversationStore;
use crate::types::Conversation;

/// An in-memory [`ConversationStore`], guarded by a single `RwLock`.
///
/// This is the reference implementation named in the store contract: it
/// makes the executor and approval resolver runnable and testable without a
/// real database. It is not durable — contents are lost when the process
/// exits.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<String, Conversation>>,
}

impl InMemoryConversationStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn save(&self, conversation: &Conversation) -> ConversationResult<()> {
        self.conversations
            .write()
            .await
            .insert(conversation.id.clone(), conversation.clone());
        Ok(())
    }

    async fn load(&self, id: &str) -> ConversationResult<Conversation> {
        self.conversations
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ConversationError::NotFound(id.to_string()))
    }

    async fn list(&self) -> ConversationResult<Vec<Conversation>> {
        Ok(self.conversations.read().await.values().cloned().collect())
    }

    async fn find_by_approval_uuid(&self, uuid: &str) -> ConversationResult<Conversation> {
        self.conversations
            .read()
            .await
            .values()
            .find(|c| {
                c.pending_approval
                    .as_ref()
                    .is_some_and(|a| a.id.as_uuid().to_string() == uuid)
            })
            .cloned()
            .ok_or_else(|| ConversationError::ApprovalNotFound(uuid.to_string()))
    }

    async fn delete(&self, id: &str) -> ConversationResult<()> {
        self.conversations.write().await.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Conversation, ConversationStatus};
    use canopy_approval::{ApprovalKind, PendingApproval};
    use canopy_core::Value;

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let store = InMemoryConversationStore::new();
        let conv = Conversation::new("c1", None);
        store.save(&conv).await.unwrap();
        let loaded = store.load("c1").await.unwrap();
        assert_eq!(loaded.id, "c1");
    }

    #[tokio::test]
    async fn load_missing_errors() {
        let store = InMemoryConversationStore::new();
        assert!(store.load("nope").await.is_err());
    }

    #[tokio::test]
    async fn list_reflects_every_saved_conversation() {
        let store = InMemoryConversationStore::new();
        store.save(&Conversation::new("a", None)).await.unwrap();
        store.save(&Conversation::new("b", None)).await.unwrap();
        let mut ids: Vec<_> = store.list().await.unwrap().into_iter().map(|c| c.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn find_by_approval_uuid_locates_the_right_conversation() {
        let store = InMemoryConversationStore::new();
        let mut conv = Conversation::new("c1", None);
        let approval = PendingApproval::new(
            "do it",
            ApprovalKind::Local {
                tool_name: "t".to_string(),
                tool_args: Value::Null,
            },
        );
        let uuid = approval.id.as_uuid().to_string();
        conv.stage_approval(approval, None);
        store.save(&conv).await.unwrap();
        store.save(&Conversation::new("other", None)).await.unwrap();

        let found = store.find_by_approval_uuid(&uuid).await.unwrap();
        assert_eq!(found.id, "c1");
        assert_eq!(found.status, ConversationStatus::WaitingApproval);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemoryConversationStore::new();
        store.save(&Conversation::new("c1", None)).await.unwrap();
        store.delete("c1").await.unwrap();
        store.delete("c1").await.unwrap();
        assert!(store.load("c1").await.is_err());
    }
}
