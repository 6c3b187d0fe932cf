use canopy_core::Value;
use serde::{Deserialize, Serialize};

/// One block of content returned by a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolContent {
    /// Content kind, e.g. `"text"`.
    pub content_type: String,
    /// The content itself.
    pub text: String,
}

impl ToolContent {
    /// Build a text content block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: "text".to_string(),
            text: text.into(),
        }
    }
}

/// The result of a successful (or tool-level-erroring) call, before the
/// broker layers auth-required detection on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Content blocks returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether this result represents a tool-level failure.
    pub is_error: bool,
}

impl ToolCallResult {
    /// A successful single-block text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::text(text)],
            is_error: false,
        }
    }

    /// An error result carrying a single text block describing the failure.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::text(text)],
            is_error: true,
        }
    }

    /// The text of the first content block, if any — what the node executor
    /// stores under a node's `output_key`.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|c| c.text.as_str())
    }
}

/// Arguments a caller passes to [`crate::ToolBackend::call_tool`] / [`crate::ToolBroker::call_tool`].
pub type ToolArgs = Value;

/// What came back from invoking a tool through the broker.
///
/// Distinguishes `auth-required` from an ordinary failure so the node
/// executor can propagate it as a dedicated signal rather than folding it
/// into a generic error message.
#[derive(Debug, Clone)]
pub enum ToolCallOutcome {
    /// The backend ran the tool (possibly returning a tool-level error).
    Result(ToolCallResult),
    /// The backend reported that the caller needs to (re-)authenticate.
    AuthRequired {
        /// Backend that raised the signal.
        server: String,
        /// Tool that was being called.
        tool: String,
    },
}
