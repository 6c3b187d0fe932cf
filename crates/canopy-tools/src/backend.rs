use async_trait::async_trait;
use canopy_core::{RequestContext, ToolDescriptor};

use crate::error::ToolsResult;
use crate::outcome::{ToolArgs, ToolCallOutcome};

/// A snapshot of one backend's health, for the broker's `status()` operation.
///
/// Not part of the hot-path `list-tools`/`call-tool` surface; mirrors
/// `astrid-mcp`'s server-status introspection type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStatus {
    /// Configured name of the backend.
    pub name: String,
    /// Whether the backend is currently started.
    pub alive: bool,
    /// How many tools it contributed to the merged catalog.
    pub tool_count: usize,
}

/// The contract a tool backend must implement to be wrapped by a [`crate::ToolBroker`].
///
/// A broker itself satisfies this contract (`start`/`stop`/`list_tools`/
/// `call_tool`), which is what lets brokers wrap other brokers recursively —
/// useful for composing a tree of sub-brokers scoped to different subsets of
/// a node tree.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Stable name for this backend; used to tag contributed tools and to
    /// identify the backend in startup-fatal duplicate-name errors.
    fn name(&self) -> &str;

    /// Bring the backend up (spawn a subprocess, open an HTTP connection,
    /// perform a handshake). Called once at broker startup.
    async fn start(&self) -> ToolsResult<()>;

    /// Tear the backend down. Called on broker shutdown, and on rollback
    /// when a later backend in the same startup fails.
    async fn stop(&self) -> ToolsResult<()>;

    /// The tools this backend currently offers.
    async fn list_tools(&self) -> ToolsResult<Vec<ToolDescriptor>>;

    /// Invoke one of this backend's tools.
    async fn call_tool(
        &self,
        ctx: &RequestContext,
        name: &str,
        args: ToolArgs,
    ) -> ToolsResult<ToolCallOutcome>;
}
