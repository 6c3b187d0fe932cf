use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use canopy_core::RequestContext;
use serde::Deserialize;
use serde_json::json;

use crate::agent_card::AgentCard;
use crate::error::{RemoteAgentError, RemoteAgentResult};
use crate::task::Task;

const PER_CALL_DEADLINE: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct RpcEnvelope {
    result: Option<Task>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// A JSON-RPC client bound to one configured remote-agent peer.
///
/// Maintains a monotonically increasing request id and forwards the
/// caller's bearer token and session id (from [`RequestContext`]) on every
/// call — the client itself carries no fixed credentials, so different
/// turns of the same conversation can act under different auth material.
pub struct RemoteAgentClient {
    peer_name: String,
    base_url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl RemoteAgentClient {
    /// Build a client for `peer_name` at `base_url` (the peer's JSON-RPC
    /// endpoint, not the agent-card discovery URL).
    ///
    /// # Errors
    ///
    /// Returns [`RemoteAgentError::InvalidUrl`] if `base_url` does not parse.
    pub fn new(peer_name: impl Into<String>, base_url: impl Into<String>) -> RemoteAgentResult<Self> {
        let base_url = base_url.into();
        url::Url::parse(&base_url).map_err(|e| RemoteAgentError::InvalidUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            peer_name: peer_name.into(),
            base_url,
            http: reqwest::Client::builder()
                .timeout(PER_CALL_DEADLINE)
                .build()
                .unwrap_or_default(),
            next_id: AtomicU64::new(1),
        })
    }

    /// The configured peer name, used to tag proxy approvals.
    #[must_use]
    pub fn peer_name(&self) -> &str {
        &self.peer_name
    }

    /// Submit a new task with a single user text message.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteAgentError::Unreachable`] on a transport failure or
    /// [`RemoteAgentError::Rejected`] if the peer returns a JSON-RPC error.
    pub async fn send_message(&self, ctx: &RequestContext, text: &str) -> RemoteAgentResult<Task> {
        let params = json!({
            "message": {
                "role": "user",
                "parts": [{"type": "text", "text": text}],
            },
        });
        self.call(ctx, "message/send", params).await
    }

    /// Forward a decision (or any follow-up text) to a task the peer has
    /// already paused on.
    ///
    /// # Errors
    ///
    /// Same as [`RemoteAgentClient::send_message`].
    pub async fn continue_task(
        &self,
        ctx: &RequestContext,
        task_id: &str,
        text: &str,
    ) -> RemoteAgentResult<Task> {
        let params = json!({
            "taskId": task_id,
            "message": {
                "role": "user",
                "parts": [{"type": "text", "text": text}],
            },
        });
        self.call(ctx, "message/send", params).await
    }

    /// Poll a task's current state.
    ///
    /// # Errors
    ///
    /// Same as [`RemoteAgentClient::send_message`].
    pub async fn get_task(&self, ctx: &RequestContext, task_id: &str) -> RemoteAgentResult<Task> {
        self.call(ctx, "tasks/get", json!({"id": task_id})).await
    }

    /// Fetch the peer's `/.well-known/agent.json` discovery document.
    ///
    /// Used by callers of the broker (configuration tooling, diagnostics),
    /// not by the node executor itself.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteAgentError::AgentCardUnavailable`] if the document
    /// cannot be fetched or parsed.
    pub async fn fetch_agent_card(&self, ctx: &RequestContext) -> RemoteAgentResult<AgentCard> {
        let origin = url::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.join("/.well-known/agent.json").ok())
            .map(|u| u.to_string())
            .unwrap_or_else(|| format!("{}/.well-known/agent.json", self.base_url.trim_end_matches('/')));

        let mut request = self.http.get(&origin);
        if let Some(token) = &ctx.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| RemoteAgentError::AgentCardUnavailable {
            peer: self.peer_name.clone(),
            reason: e.to_string(),
        })?;

        response
            .json::<AgentCard>()
            .await
            .map_err(|e| RemoteAgentError::AgentCardUnavailable {
                peer: self.peer_name.clone(),
                reason: e.to_string(),
            })
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn call(
        &self,
        ctx: &RequestContext,
        method: &str,
        params: serde_json::Value,
    ) -> RemoteAgentResult<Task> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_request_id(),
            "method": method,
            "params": params,
        });

        let mut request = self.http.post(&self.base_url).json(&body);
        if let Some(token) = &ctx.bearer_token {
            request = request.bearer_auth(token);
        }
        if let Some(session_id) = &ctx.session_id {
            request = request.header("X-Session-ID", session_id);
        }

        let response = request.send().await.map_err(|e| RemoteAgentError::Unreachable {
            peer: self.peer_name.clone(),
            reason: e.to_string(),
        })?;

        let envelope: RpcEnvelope = response.json().await.map_err(|e| RemoteAgentError::Unreachable {
            peer: self.peer_name.clone(),
            reason: e.to_string(),
        })?;

        if let Some(error) = envelope.error {
            return Err(RemoteAgentError::Rejected {
                peer: self.peer_name.clone(),
                reason: format!("rpc error {}: {}", error.code, error.message),
            });
        }

        envelope.result.ok_or_else(|| RemoteAgentError::Rejected {
            peer: self.peer_name.clone(),
            reason: "empty RPC result".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_an_unparsable_base_url() {
        let err = RemoteAgentClient::new("bad", "not a url").unwrap_err();
        assert!(matches!(err, RemoteAgentError::InvalidUrl { .. }));
    }

    #[test]
    fn request_ids_are_monotonic() {
        let client = RemoteAgentClient::new("peer", "http://localhost:9999").unwrap();
        assert_eq!(client.next_request_id(), 1);
        assert_eq!(client.next_request_id(), 2);
    }
}
