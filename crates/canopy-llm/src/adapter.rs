use async_trait::async_trait;
use canopy_core::{RequestContext, ToolDescriptor};

use crate::error::LlmResult;
use crate::response::{HistoryMessage, LlmResponse};

/// Uniform contract over an LLM vendor client.
///
/// One call is one atomic turn: no partial/streaming results are exposed,
/// since the orchestration runtime always awaits a full response before
/// deciding what to do next.
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    /// Which model name this adapter answers for — used as the cache key in
    /// [`crate::LlmClientCache`].
    fn model(&self) -> &str;

    /// Produce one response given a system prompt, history and the tool
    /// catalog available to the calling node.
    async fn generate(
        &self,
        ctx: &RequestContext,
        system: &str,
        history: &[HistoryMessage],
        tools: &[ToolDescriptor],
    ) -> LlmResult<LlmResponse>;
}
