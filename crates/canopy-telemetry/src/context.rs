use tracing::Span;
use uuid::Uuid;

/// A tracing span scoped to one caller turn, carrying a request id that
/// shows up on every log line emitted while it is entered.
///
/// Construct one at the top of `process-message`/`resolve-approval` and hold
/// the guard for the duration of the call:
///
/// ```
/// use canopy_telemetry::RequestSpan;
///
/// let span = RequestSpan::new("process-message");
/// let _guard = span.enter();
/// tracing::info!("handling turn");
/// ```
pub struct RequestSpan {
    span: Span,
    request_id: Uuid,
}

impl RequestSpan {
    /// Start a new span for `operation`, generating a fresh request id.
    #[must_use]
    pub fn new(operation: &'static str) -> Self {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("request", operation, request_id = %request_id);
        Self { span, request_id }
    }

    /// The request id assigned to this span.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Enter the span; the returned guard exits it on drop.
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_span_gets_a_distinct_request_id() {
        let a = RequestSpan::new("op");
        let b = RequestSpan::new("op");
        assert_ne!(a.request_id(), b.request_id());
    }
}
