use std::collections::VecDeque;

use async_trait::async_trait;
use canopy_core::{RequestContext, ToolDescriptor};
use tokio::sync::Mutex;

use crate::adapter::LlmAdapter;
use crate::error::LlmResult;
use crate::response::{HistoryMessage, LlmResponse};

/// A scriptable [`LlmAdapter`] for tests: responses are queued up front and
/// handed out in order; once the queue is empty it echoes the last user
/// message back as plain text rather than erroring, so tests that run a
/// node a few extra times don't need to over-provision the script.
pub struct MockLlmAdapter {
    model: String,
    scripted: Mutex<VecDeque<LlmResponse>>,
}

impl MockLlmAdapter {
    /// An adapter with no scripted responses (falls straight to the echo fallback).
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            scripted: Mutex::new(VecDeque::new()),
        }
    }

    /// An adapter that returns `responses` in order, then falls back to echoing.
    #[must_use]
    pub fn with_responses(model: impl Into<String>, responses: Vec<LlmResponse>) -> Self {
        Self {
            model: model.into(),
            scripted: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl LlmAdapter for MockLlmAdapter {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        _ctx: &RequestContext,
        _system: &str,
        history: &[HistoryMessage],
        _tools: &[ToolDescriptor],
    ) -> LlmResult<LlmResponse> {
        let mut scripted = self.scripted.lock().await;
        if let Some(next) = scripted.pop_front() {
            return Ok(next);
        }
        let last_user = history
            .iter()
            .rev()
            .find(|m| matches!(m.role, crate::response::ChatRole::User))
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(LlmResponse::text(last_user.len(), format!("echo: {last_user}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_scripted_responses_in_order_then_falls_back() {
        let adapter = MockLlmAdapter::with_responses(
            "mock",
            vec![LlmResponse::text(0, "first"), LlmResponse::text(0, "second")],
        );
        let ctx = RequestContext::new();

        let r1 = adapter.generate(&ctx, "", &[], &[]).await.unwrap();
        assert_eq!(r1.text.as_deref(), Some("first"));

        let r2 = adapter.generate(&ctx, "", &[], &[]).await.unwrap();
        assert_eq!(r2.text.as_deref(), Some("second"));

        let history = vec![HistoryMessage::user("hi")];
        let r3 = adapter.generate(&ctx, "", &history, &[]).await.unwrap();
        assert_eq!(r3.text.as_deref(), Some("echo: hi"));
    }
}
