use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use canopy_core::{RequestContext, ToolDescriptor};
use rmcp::ServiceExt;
use rmcp::model::{
    CallToolRequestParams, ClientCapabilities, ClientInfo, Implementation, RawContent,
};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::TokioChildProcess;
use tokio::sync::RwLock;

use crate::backend::ToolBackend;
use crate::error::{ToolsError, ToolsResult};
use crate::outcome::{ToolArgs, ToolCallOutcome, ToolCallResult, ToolContent};

/// Minimal `rmcp::ClientHandler`: the broker never receives server-initiated
/// sampling/roots/elicitation requests (tool backends in this runtime are
/// plain tool servers), so every method but `get_info` uses the trait's
/// default implementation.
struct BrokerClientHandler;

impl rmcp::ClientHandler for BrokerClientHandler {
    fn get_info(&self) -> ClientInfo {
        ClientInfo {
            meta: None,
            protocol_version: Default::default(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: "canopy".to_string(),
                title: Some("Canopy agent orchestration runtime".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
        }
    }
}

/// A tool backend that speaks MCP over stdio to a spawned subprocess.
pub struct StdioBackend {
    name: String,
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    service: RwLock<Option<RunningService<RoleClient, BrokerClientHandler>>>,
}

impl StdioBackend {
    /// Configure (but do not yet spawn) a stdio backend.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        args: Vec<String>,
        env: HashMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args,
            env,
            service: RwLock::new(None),
        }
    }

    fn annotations_destructive(tool: &rmcp::model::Tool) -> bool {
        tool.annotations
            .as_ref()
            .and_then(|a| a.destructive_hint)
            .unwrap_or(false)
    }
}

#[async_trait]
impl ToolBackend for StdioBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> ToolsResult<()> {
        let mut cmd = tokio::process::Command::new(&self.command);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        let transport = TokioChildProcess::new(cmd).map_err(|e| ToolsError::BackendStartFailed {
            name: self.name.clone(),
            reason: e.to_string(),
        })?;

        let service = BrokerClientHandler.serve(transport).await.map_err(|e| {
            ToolsError::BackendStartFailed {
                name: self.name.clone(),
                reason: e.to_string(),
            }
        })?;

        *self.service.write().await = Some(service);
        Ok(())
    }

    async fn stop(&self) -> ToolsResult<()> {
        if let Some(service) = self.service.write().await.take() {
            service
                .cancel()
                .await
                .map_err(|e| ToolsError::BackendStopFailed {
                    name: self.name.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }

    async fn list_tools(&self) -> ToolsResult<Vec<ToolDescriptor>> {
        let guard = self.service.read().await;
        let service = guard.as_ref().ok_or_else(|| ToolsError::BackendStartFailed {
            name: self.name.clone(),
            reason: "backend not started".to_string(),
        })?;

        let tools = service
            .list_all_tools()
            .await
            .map_err(|e| ToolsError::CallFailed {
                backend: self.name.clone(),
                tool: "<list>".to_string(),
                reason: e.to_string(),
            })?;

        Ok(tools
            .iter()
            .map(|t| {
                let schema = serde_json::to_value(&*t.input_schema)
                    .unwrap_or_else(|_| serde_json::json!({"type": "object"}));
                ToolDescriptor {
                    name: t.name.to_string(),
                    description: t.description.as_deref().unwrap_or_default().to_string(),
                    input_schema: schema,
                    destructive_intent: Self::annotations_destructive(t),
                    server: self.name.clone(),
                }
            })
            .collect())
    }

    async fn call_tool(
        &self,
        _ctx: &RequestContext,
        name: &str,
        args: ToolArgs,
    ) -> ToolsResult<ToolCallOutcome> {
        let guard = self.service.read().await;
        let service = guard.as_ref().ok_or_else(|| ToolsError::BackendStartFailed {
            name: self.name.clone(),
            reason: "backend not started".to_string(),
        })?;

        let arguments = match args.to_json() {
            serde_json::Value::Object(map) => Some(map),
            serde_json::Value::Null => None,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other);
                Some(map)
            }
        };

        let params = CallToolRequestParams {
            meta: None,
            name: Cow::Owned(name.to_string()),
            arguments,
            task: None,
        };

        let result = service
            .call_tool(params)
            .await
            .map_err(|e| ToolsError::CallFailed {
                backend: self.name.clone(),
                tool: name.to_string(),
                reason: e.to_string(),
            })?;

        let is_error = result.is_error.unwrap_or(false);
        let content = result
            .content
            .iter()
            .map(|c| match &**c {
                RawContent::Text(text) => ToolContent::text(text.text.clone()),
                other => ToolContent::text(format!("{other:?}")),
            })
            .collect();

        Ok(ToolCallOutcome::Result(ToolCallResult { content, is_error }))
    }
}
