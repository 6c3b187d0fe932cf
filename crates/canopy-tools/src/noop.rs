use async_trait::async_trait;
use canopy_core::{RequestContext, ToolDescriptor};

use crate::backend::ToolBackend;
use crate::error::{ToolsError, ToolsResult};
use crate::outcome::{ToolArgs, ToolCallOutcome};

/// A backend that contributes no tools.
///
/// For node-tree configurations that omit tool backends entirely — the
/// broker still needs at least the option of "no tools" rather than special
/// casing an empty backend list everywhere.
pub struct NoOpBackend {
    name: String,
}

impl NoOpBackend {
    /// Build a no-op backend under `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl ToolBackend for NoOpBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> ToolsResult<()> {
        Ok(())
    }

    async fn stop(&self) -> ToolsResult<()> {
        Ok(())
    }

    async fn list_tools(&self) -> ToolsResult<Vec<ToolDescriptor>> {
        Ok(Vec::new())
    }

    async fn call_tool(
        &self,
        _ctx: &RequestContext,
        name: &str,
        _args: ToolArgs,
    ) -> ToolsResult<ToolCallOutcome> {
        Err(ToolsError::UnknownTool(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn contributes_no_tools() {
        let backend = NoOpBackend::new("empty");
        backend.start().await.unwrap();
        assert!(backend.list_tools().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn calling_any_tool_fails() {
        let backend = NoOpBackend::new("empty");
        let ctx = RequestContext::new();
        let result = backend.call_tool(&ctx, "anything", ToolArgs::Null).await;
        assert!(matches!(result, Err(ToolsError::UnknownTool(_))));
    }
}
