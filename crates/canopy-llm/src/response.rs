use canopy_core::Value;
use serde::{Deserialize, Serialize};

/// Who authored one entry of the history passed to [`crate::LlmAdapter::generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    /// The human or a synthesized stand-in (e.g. a tool result fed back as context).
    User,
    /// The model's own prior turn.
    Model,
}

/// One entry of conversation history handed to the adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// Author of this turn.
    pub role: ChatRole,
    /// Turn content.
    pub content: String,
}

impl HistoryMessage {
    /// Build a user-role history entry.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Build a model-role history entry.
    #[must_use]
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: content.into(),
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmToolCall {
    /// Name of the requested tool.
    pub name: String,
    /// Arguments the model supplied.
    pub arguments: Value,
}

/// The result of one [`crate::LlmAdapter::generate`] call.
///
/// At most one of `text` and `tool_call` drives control flow: if both are
/// present, `tool_call` wins and `text` is retained only as the model's
/// stated rationale for the call, to be journaled alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Plain-text reply, if any.
    pub text: Option<String>,
    /// Requested tool call, if any.
    pub tool_call: Option<LlmToolCall>,
    /// Approximate input token count (character-count heuristic).
    pub input_tokens: u32,
    /// Approximate output token count (character-count heuristic).
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Build a text-only response with a token estimate derived from
    /// `prompt_chars` and the reply's own length.
    #[must_use]
    pub fn text(prompt_chars: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let output_tokens = estimate_tokens(&text);
        Self {
            text: Some(text),
            tool_call: None,
            input_tokens: estimate_tokens_from_chars(prompt_chars),
            output_tokens,
        }
    }

    /// Build a tool-call response, optionally carrying the model's stated
    /// rationale as `text`.
    #[must_use]
    pub fn tool_call(prompt_chars: usize, call: LlmToolCall, rationale: Option<String>) -> Self {
        let output_tokens = rationale.as_deref().map(estimate_tokens).unwrap_or(0);
        Self {
            text: rationale,
            tool_call: Some(call),
            input_tokens: estimate_tokens_from_chars(prompt_chars),
            output_tokens,
        }
    }

    /// Whether this response should be treated as a tool call for control
    /// flow — the rule named in the type's own doc comment.
    #[must_use]
    pub fn is_tool_call(&self) -> bool {
        self.tool_call.is_some()
    }
}

/// Four characters per token is the same rough heuristic vendor client
/// libraries in this family fall back to when no vendor-reported count is
/// available.
fn estimate_tokens(text: &str) -> u32 {
    estimate_tokens_from_chars(text.chars().count())
}

fn estimate_tokens_from_chars(chars: usize) -> u32 {
    u32::try_from(chars.div_ceil(4)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_call_response_is_tool_call() {
        let response = LlmResponse::tool_call(
            10,
            LlmToolCall {
                name: "do_thing".to_string(),
                arguments: Value::Null,
            },
            Some("I will do the thing".to_string()),
        );
        assert!(response.is_tool_call());
        assert_eq!(response.text.as_deref(), Some("I will do the thing"));
    }

    #[test]
    fn text_response_is_not_tool_call() {
        let response = LlmResponse::text(10, "hello");
        assert!(!response.is_tool_call());
    }

    #[test]
    fn token_estimate_scales_with_length() {
        let short = LlmResponse::text(4, "hi");
        let long = LlmResponse::text(4, "a much longer reply than the short one");
        assert!(long.output_tokens > short.output_tokens);
    }
}
