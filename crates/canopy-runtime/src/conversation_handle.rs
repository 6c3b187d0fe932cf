use std::sync::Arc;

use canopy_conversation::Conversation;
use tokio::sync::Mutex;

/// A conversation shared across a `parallel` fan-out.
///
/// The node executor threads one of these through an entire recursive
/// `execute` call rather than a plain `&mut Conversation`: parallel children
/// run concurrently and each may append a message (a tool result, a staged
/// approval's description), so the conversation needs the same
/// mutex-serializes-access treatment the tool broker gives `call_tool`.
/// Mutations are expected to be brief (an append, a field write), never held
/// across an awaited network call.
pub type SharedConversation = Arc<Mutex<Conversation>>;

/// Wrap an owned [`Conversation`] for one turn's execution.
#[must_use]
pub fn share(conversation: Conversation) -> SharedConversation {
    Arc::new(Mutex::new(conversation))
}

/// Recover the owned [`Conversation`] once a turn's execution has finished.
///
/// # Panics
///
/// Panics if other clones of the `Arc` are still outstanding. The executor
/// never clones the `Arc` itself (only the `Conversation` it guards, to hand
/// a snapshot to the store), so this always succeeds once `execute` has
/// returned.
#[must_use]
pub fn unshare(shared: SharedConversation) -> Conversation {
    Arc::try_unwrap(shared)
        .unwrap_or_else(|_| panic!("conversation handle had outstanding references at turn end"))
        .into_inner()
}
