use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use canopy_core::{RequestContext, ToolDescriptor};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::backend::ToolBackend;
use crate::error::{ToolsError, ToolsResult};
use crate::outcome::{ToolArgs, ToolCallOutcome, ToolCallResult, ToolContent};

/// A tool backend reached over a streamable-HTTP MCP endpoint.
///
/// Speaks the same JSON-RPC method names as the stdio transport
/// (`tools/list`, `tools/call`) over plain request/response HTTP POSTs —
/// this runtime does not need the SSE streaming half of the streamable-HTTP
/// transport, since a tool call is always awaited to completion rather than
/// streamed back in partial results.
pub struct HttpBackend {
    name: String,
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct RpcTool {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "inputSchema", default = "default_schema")]
    input_schema: serde_json::Value,
    #[serde(default)]
    destructive_hint: Option<bool>,
}

fn default_schema() -> serde_json::Value {
    json!({"type": "object", "properties": {}})
}

#[derive(Deserialize)]
struct RpcToolList {
    tools: Vec<RpcTool>,
}

#[derive(Deserialize)]
struct RpcCallResult {
    content: Vec<RpcContent>,
    #[serde(default, rename = "isError")]
    is_error: bool,
}

#[derive(Deserialize)]
struct RpcContent {
    #[serde(default)]
    text: String,
}

impl HttpBackend {
    /// Configure a streamable-HTTP backend at `url`.
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn rpc_call<T: for<'de> Deserialize<'de>>(
        &self,
        ctx: &RequestContext,
        method: &str,
        params: serde_json::Value,
    ) -> ToolsResult<Result<T, &'static str>> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_request_id(),
            "method": method,
            "params": params,
        });

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(token) = &ctx.bearer_token {
            request = request.bearer_auth(token);
        }
        if let Some(session_id) = &ctx.session_id {
            request = request.header("X-Session-ID", session_id);
        }

        let response = request.send().await.map_err(|e| ToolsError::CallFailed {
            backend: self.name.clone(),
            tool: method.to_string(),
            reason: e.to_string(),
        })?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(Err("auth-required"));
        }

        let envelope: RpcEnvelope<T> =
            response.json().await.map_err(|e| ToolsError::CallFailed {
                backend: self.name.clone(),
                tool: method.to_string(),
                reason: e.to_string(),
            })?;

        if let Some(error) = envelope.error {
            return Err(ToolsError::CallFailed {
                backend: self.name.clone(),
                tool: method.to_string(),
                reason: format!("rpc error {}: {}", error.code, error.message),
            });
        }

        envelope.result.map(Ok).ok_or_else(|| ToolsError::CallFailed {
            backend: self.name.clone(),
            tool: method.to_string(),
            reason: "empty RPC result".to_string(),
        })
    }
}

#[async_trait]
impl ToolBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> ToolsResult<()> {
        // Stateless transport: nothing to establish ahead of the first call.
        Ok(())
    }

    async fn stop(&self) -> ToolsResult<()> {
        Ok(())
    }

    async fn list_tools(&self) -> ToolsResult<Vec<ToolDescriptor>> {
        let ctx = RequestContext::new();
        let list = self
            .rpc_call::<RpcToolList>(&ctx, "tools/list", json!({}))
            .await?;
        let Ok(list) = list else {
            return Err(ToolsError::CallFailed {
                backend: self.name.clone(),
                tool: "tools/list".to_string(),
                reason: "authentication required while listing tools".to_string(),
            });
        };

        Ok(list
            .tools
            .into_iter()
            .map(|t| ToolDescriptor {
                name: t.name,
                description: t.description,
                input_schema: t.input_schema,
                destructive_intent: t.destructive_hint.unwrap_or(false),
                server: self.name.clone(),
            })
            .collect())
    }

    async fn call_tool(
        &self,
        ctx: &RequestContext,
        name: &str,
        args: ToolArgs,
    ) -> ToolsResult<ToolCallOutcome> {
        let params = json!({"name": name, "arguments": args.to_json()});
        let result = self
            .rpc_call::<RpcCallResult>(ctx, "tools/call", params)
            .await?;

        let Ok(result) = result else {
            return Ok(ToolCallOutcome::AuthRequired {
                server: self.name.clone(),
                tool: name.to_string(),
            });
        };

        Ok(ToolCallOutcome::Result(ToolCallResult {
            content: result.content.into_iter().map(|c| ToolContent::text(c.text)).collect(),
            is_error: result.is_error,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_request_id_increments() {
        let backend = HttpBackend::new("http", "http://localhost:9999");
        assert_eq!(backend.next_request_id(), 1);
        assert_eq!(backend.next_request_id(), 2);
    }
}
