use tokio_util::sync::CancellationToken;

/// Per-call context threaded through every network-touching operation:
/// the tool broker, the remote-agent client and the LLM adapter.
///
/// Carries the caller's auth token and session id (forwarded to outbound
/// calls per the remote-agent profile) and a cancellation token so cancelling
/// the top-level caller propagates into every in-flight call transitively.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Bearer token to forward to tool backends and remote peers, if any.
    pub bearer_token: Option<String>,
    /// Session id correlator forwarded as `X-Session-ID`.
    pub session_id: Option<String>,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Build a context with no auth material and a fresh cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a bearer token.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Attach a session id.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// The cancellation token backing this context.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Derive a child context that shares this context's auth material but
    /// is cancelled independently as well as when the parent is cancelled.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            bearer_token: self.bearer_token.clone(),
            session_id: self.session_id.clone(),
            cancellation: self.cancellation.child_token(),
        }
    }

    /// Cancel this context and every child derived from it.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Whether this context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelling_parent_cancels_child() {
        let parent = RequestContext::new();
        let child = parent.child();
        assert!(!child.is_cancelled());
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn builder_sets_auth_material() {
        let ctx = RequestContext::new()
            .with_bearer_token("abc")
            .with_session_id("sess-1");
        assert_eq!(ctx.bearer_token.as_deref(), Some("abc"));
        assert_eq!(ctx.session_id.as_deref(), Some("sess-1"));
    }
}
