#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Core types shared by every crate in the Canopy agent orchestration runtime.
//!
//! Nothing in this crate talks to a network, a filesystem, or an LLM vendor —
//! it is the common vocabulary (dynamic tool values, timestamps, request
//! context) that the tool broker, the node executor and the conversation
//! store all build on.

mod context;
mod timestamp;
mod tool_descriptor;
mod value;

pub use context::RequestContext;
pub use timestamp::Timestamp;
pub use tool_descriptor::ToolDescriptor;
pub use value::Value;
