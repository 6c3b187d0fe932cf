#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! LLM adapter abstraction for the Canopy agent orchestration runtime.
//!
//! A uniform `generate(system, history, tools) -> {text?, tool-call?}`
//! contract over one or more vendor clients. Streaming is deliberately not
//! part of this contract — the core returns one atomic response per call.

mod adapter;
mod cache;
mod error;
mod mock;
mod response;

pub use adapter::LlmAdapter;
pub use cache::LlmClientCache;
pub use error::{LlmError, LlmResult};
pub use mock::MockLlmAdapter;
pub use response::{ChatRole, HistoryMessage, LlmResponse, LlmToolCall};
