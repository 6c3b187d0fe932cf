#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! The conversation record and its store contract.
//!
//! A [`Conversation`] is owned externally (a real deployment persists it to
//! disk or a database — out of scope here) but mutated entirely by the node
//! executor and the approval resolver. This crate defines the record shape,
//! the [`ConversationStore`] trait those components depend on, and ships an
//! in-memory reference implementation so the rest of the workspace is
//! independently testable without a real store.

mod error;
mod memory;
mod store;
mod types;

pub use error::{ConversationError, ConversationResult};
pub use memory::InMemoryConversationStore;
pub use store::ConversationStore;
pub use types::{Conversation, ConversationStatus, Message, MessageRole, PipelineState, ToolCallRecord};
