//! End-to-end coverage of the node executor, the simple-mode runner and the
//! approval resolver, built entirely against the crate's public surface:
//! [`Engine`], [`Orchestrator`], a scriptable [`MockLlmAdapter`] and a
//! hand-rolled [`ToolBackend`] double. The remote-agent scenario stands up a
//! minimal in-process HTTP/1.1 responder rather than a real peer runtime,
//! since [`canopy_remote::RemoteAgentClient`] talks directly to a URL with
//! no trait seam to fake otherwise.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use canopy_config::{NodeKind, NodeSpec};
use canopy_conversation::InMemoryConversationStore;
use canopy_core::{RequestContext, ToolDescriptor, Value};
use canopy_llm::{LlmAdapter, LlmResponse, LlmToolCall, MockLlmAdapter};
use canopy_runtime::{Engine, LlmFactory, Orchestrator, PeerRegistry};
use canopy_tools::{NoOpBackend, ToolArgs, ToolBackend, ToolBroker, ToolCallOutcome, ToolCallResult, ToolsResult};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// --- tree-building helpers -------------------------------------------------

fn llm_leaf(name: &str, model: &str, prompt_template: &str, output_key: Option<&str>) -> NodeSpec {
    NodeSpec {
        kind: NodeKind::Llm,
        name: name.to_string(),
        children: Vec::new(),
        prompt_template: prompt_template.to_string(),
        output_key: output_key.map(str::to_string),
        model: Some(model.to_string()),
        can_exit_loop: false,
        max_iterations: 10,
        destructive_intent: false,
        remote_url: None,
        description: None,
        peers: Vec::new(),
    }
}

fn remote_agent_leaf(name: &str, remote_url: &str, output_key: Option<&str>) -> NodeSpec {
    NodeSpec {
        kind: NodeKind::RemoteAgent,
        name: name.to_string(),
        children: Vec::new(),
        prompt_template: String::new(),
        output_key: output_key.map(str::to_string),
        model: None,
        can_exit_loop: false,
        max_iterations: 10,
        destructive_intent: false,
        remote_url: Some(remote_url.to_string()),
        description: None,
        peers: Vec::new(),
    }
}

fn sequential(name: &str, children: Vec<NodeSpec>) -> NodeSpec {
    NodeSpec {
        kind: NodeKind::Sequential,
        name: name.to_string(),
        children,
        prompt_template: String::new(),
        output_key: None,
        model: None,
        can_exit_loop: false,
        max_iterations: 10,
        destructive_intent: false,
        remote_url: None,
        description: None,
        peers: Vec::new(),
    }
}

fn parallel(name: &str, children: Vec<NodeSpec>) -> NodeSpec {
    NodeSpec {
        kind: NodeKind::Parallel,
        ..sequential(name, children)
    }
}

// --- a scriptable tool backend ----------------------------------------------

struct ScriptBackend {
    name: String,
    tools: Vec<ToolDescriptor>,
    auth_required: Vec<String>,
}

impl ScriptBackend {
    fn new(name: &str, tools: Vec<ToolDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            tools,
            auth_required: Vec::new(),
        }
    }

    fn with_auth_required(mut self, tool: &str) -> Self {
        self.auth_required.push(tool.to_string());
        self
    }
}

#[async_trait]
impl ToolBackend for ScriptBackend {
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
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, _ctx: &RequestContext, name: &str, args: ToolArgs) -> ToolsResult<ToolCallOutcome> {
        if self.auth_required.iter().any(|t| t == name) {
            return Ok(ToolCallOutcome::AuthRequired {
                server: self.name.clone(),
                tool: name.to_string(),
            });
        }
        Ok(ToolCallOutcome::Result(ToolCallResult::text(format!("{name} executed with {args}"))))
    }
}

// --- engine wiring ----------------------------------------------------------

fn make_llm_factory(scripts: Vec<(&str, Vec<LlmResponse>)>) -> LlmFactory {
    let scripts: HashMap<String, Vec<LlmResponse>> = scripts.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    let scripts = StdMutex::new(scripts);
    Arc::new(move |model: &str| {
        let responses = scripts.lock().unwrap().remove(model).unwrap_or_default();
        Arc::new(MockLlmAdapter::with_responses(model.to_string(), responses)) as Arc<dyn LlmAdapter>
    })
}

async fn build_engine(root: NodeSpec, backend: Arc<dyn ToolBackend>, llm: LlmFactory) -> Engine {
    let broker = Arc::new(ToolBroker::start(vec![backend]).await.unwrap());
    let peers = Arc::new(PeerRegistry::build(&root).unwrap());
    let store = Arc::new(InMemoryConversationStore::new());
    Engine::new(broker, peers, llm, store, root)
}

// --- a minimal in-process JSON-RPC peer --------------------------------------

/// Starts a background task that accepts connections one at a time and hands
/// back the next response from `responses`, in order, regardless of what the
/// request actually contains — good enough to drive a single client through
/// a scripted sequence of task states.
async fn spawn_rpc_peer(responses: Vec<serde_json::Value>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let responses = Arc::new(tokio::sync::Mutex::new(responses.into_iter()));

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let responses = Arc::clone(&responses);
            tokio::spawn(async move {
                let body = read_http_request_body(&mut stream).await;
                let request: serde_json::Value = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
                let id = request.get("id").cloned().unwrap_or(serde_json::Value::Null);

                let result = responses.lock().await.next();
                let envelope = match result {
                    Some(result) => serde_json::json!({"jsonrpc": "2.0", "id": id, "result": result}),
                    None => serde_json::json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": {"code": -32000, "message": "no more scripted responses"},
                    }),
                };
                let payload = envelope.to_string();
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    payload.len(),
                    payload,
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    format!("http://{addr}/")
}

async fn read_http_request_body(stream: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let Some(header_end) = find_double_crlf(&buf) else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]);
        let content_length = headers
            .lines()
            .find_map(|line| {
                let lower = line.to_ascii_lowercase();
                lower
                    .strip_prefix("content-length:")
                    .and_then(|value| value.trim().parse::<usize>().ok())
            })
            .unwrap_or(0);
        let body_start = header_end + 4;
        if buf.len() >= body_start + content_length {
            return String::from_utf8_lossy(&buf[body_start..body_start + content_length]).to_string();
        }
    }
    String::new()
}

fn find_double_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

fn task_json(id: &str, state: &str, text: Option<&str>) -> serde_json::Value {
    let artifact = text.map(|text| serde_json::json!({"parts": [{"type": "text", "text": text}]}));
    serde_json::json!({"id": id, "status": {"state": state}, "artifact": artifact})
}

// --- scenario 1: simple mode, non-destructive path --------------------------

#[tokio::test]
async fn simple_mode_non_destructive_turn_returns_text() {
    let root = llm_leaf("assistant", "m1", "", None);
    let backend: Arc<dyn ToolBackend> = Arc::new(NoOpBackend::new("tools"));
    let llm = make_llm_factory(vec![("m1", vec![LlmResponse::text(0, "pong")])]);
    let engine = build_engine(root, backend, llm).await;
    let orchestrator = Orchestrator::new(engine);
    let ctx = RequestContext::new();

    let conversation = orchestrator.start_conversation(None);
    let (conversation, turn) = orchestrator.process_message(&ctx, conversation, "ping").await.unwrap();

    assert_eq!(turn.response, "pong");
    assert!(!turn.waiting_approval);
    assert_eq!(conversation.messages.len(), 3);
    assert_eq!(conversation.messages[0].role, canopy_conversation::MessageRole::System);
    assert_eq!(conversation.messages[1].role, canopy_conversation::MessageRole::User);
    assert_eq!(conversation.messages[1].content, "ping");
    assert_eq!(conversation.messages[2].role, canopy_conversation::MessageRole::Assistant);
    assert_eq!(conversation.messages[2].content, "pong");
}

// --- scenario 2: simple mode, destructive tool approved ----------------------

#[tokio::test]
async fn simple_mode_destructive_tool_pauses_then_resumes_on_approval() {
    let root = llm_leaf("assistant", "m2", "", None);
    let tool = ToolDescriptor::new("add", "add a value", "tools").destructive();
    let backend: Arc<dyn ToolBackend> = Arc::new(ScriptBackend::new("tools", vec![tool]));
    let llm = make_llm_factory(vec![(
        "m2",
        vec![
            LlmResponse::tool_call(
                0,
                LlmToolCall {
                    name: "add".to_string(),
                    arguments: Value::Null,
                },
                Some("I should add that".to_string()),
            ),
            LlmResponse::text(0, "done adding"),
        ],
    )]);
    let engine = build_engine(root, backend, llm).await;
    let orchestrator = Orchestrator::new(engine);
    let ctx = RequestContext::new();

    let conversation = orchestrator.start_conversation(None);
    let (conversation, turn) = orchestrator
        .process_message(&ctx, conversation, "please add")
        .await
        .unwrap();

    assert!(turn.waiting_approval);
    let approval = turn.approval.expect("approval summary");
    assert_eq!(approval.tool_name.as_deref(), Some("add"));
    assert_eq!(conversation.pending_approval.as_ref().unwrap().id.as_uuid().to_string(), approval.uuid);

    let (conversation, turn) = orchestrator.resolve_approval(&ctx, &approval.uuid, true).await.unwrap();

    assert!(!turn.waiting_approval);
    assert_eq!(turn.response, "done adding");
    assert_eq!(conversation.status, canopy_conversation::ConversationStatus::Active);
}

// --- scenario 3: sequential pipeline pauses mid-tree, resumes past it --------

#[tokio::test]
async fn sequential_pipeline_resumes_past_the_paused_node() {
    let analyze = llm_leaf("analyze", "a", "", Some("analysis"));
    let destructive_tool = ToolDescriptor::new("delete_file", "delete a file", "tools").destructive();
    let act = llm_leaf("act", "b", "analysis was {analysis}", None);
    let root = sequential("pipeline", vec![analyze, act]);

    let backend: Arc<dyn ToolBackend> = Arc::new(ScriptBackend::new("tools", vec![destructive_tool]));
    let llm = make_llm_factory(vec![
        ("a", vec![LlmResponse::text(0, "insight")]),
        (
            "b",
            vec![LlmResponse::tool_call(
                0,
                LlmToolCall {
                    name: "delete_file".to_string(),
                    arguments: Value::Null,
                },
                None,
            )],
        ),
    ]);
    let engine = build_engine(root, backend, llm).await;
    let orchestrator = Orchestrator::new(engine);
    let ctx = RequestContext::new();

    let conversation = orchestrator.start_conversation(None);
    let (conversation, turn) = orchestrator.process_message(&ctx, conversation, "go").await.unwrap();

    assert!(turn.waiting_approval);
    let pipeline_state = conversation.pipeline_state.clone().expect("pipeline state saved on pause");
    assert_eq!(pipeline_state.session_state_snapshot.get("analysis"), Some(&"insight".to_string()));
    assert_eq!(pipeline_state.paused_node_path, vec![1]);

    let approval = turn.approval.unwrap();
    let (conversation, turn) = orchestrator.resolve_approval(&ctx, &approval.uuid, true).await.unwrap();

    assert!(!turn.waiting_approval);
    assert!(turn.response.contains("delete_file executed"));
    assert!(conversation.pipeline_state.is_none());
}

// --- scenario 4: parallel fan-out, no approval needed ------------------------

#[tokio::test]
async fn parallel_fan_out_joins_every_childs_text() {
    let x = llm_leaf("x", "x", "", Some("a"));
    let delete_tool = ToolDescriptor::new("delete_file", "delete a file", "tools").destructive();
    let y = llm_leaf("y", "y", "", Some("b"));
    let root = parallel("fan-out", vec![x, y]);

    let backend: Arc<dyn ToolBackend> = Arc::new(ScriptBackend::new("tools", vec![delete_tool]));
    let llm = make_llm_factory(vec![
        ("x", vec![LlmResponse::text(0, "x-text")]),
        (
            "y",
            vec![LlmResponse::tool_call(
                0,
                LlmToolCall {
                    name: "delete_file".to_string(),
                    arguments: Value::Null,
                },
                None,
            )],
        ),
    ]);
    let engine = build_engine(root, backend, llm).await;
    let orchestrator = Orchestrator::new(engine);
    let ctx = RequestContext::new();

    let conversation = orchestrator.start_conversation(None);
    let (conversation, turn) = orchestrator.process_message(&ctx, conversation, "go").await.unwrap();

    assert!(!turn.waiting_approval);
    assert!(turn.response.contains("x-text"));
    assert!(turn.response.contains("delete_file executed"));
    assert_eq!(conversation.status, canopy_conversation::ConversationStatus::Active);
}

// --- scenario 5: proxy approval chain through a remote peer ------------------

#[tokio::test]
async fn proxy_approval_chain_resumes_past_a_remote_agent_leaf() {
    let peer_url = spawn_rpc_peer(vec![
        task_json("t1", "input-required", None),
        task_json("t1", "input-required", None),
        task_json("t1", "completed", Some("done")),
    ])
    .await;

    let remote = remote_agent_leaf("r", &peer_url, Some("r_out"));
    let follow_up = llm_leaf("l", "l", "context: {r_out}", Some("l_out"));
    let root = sequential("pipeline", vec![remote, follow_up]);

    let backend: Arc<dyn ToolBackend> = Arc::new(NoOpBackend::new("tools"));
    let llm = make_llm_factory(vec![("l", vec![LlmResponse::text(0, "final answer")])]);
    let engine = build_engine(root, backend, llm).await;
    let orchestrator = Orchestrator::new(engine);
    let ctx = RequestContext::new();

    let conversation = orchestrator.start_conversation(None);
    let (_conversation, turn) = orchestrator.process_message(&ctx, conversation, "work").await.unwrap();
    assert!(turn.waiting_approval);
    let first_uuid = turn.approval.unwrap().uuid;

    let (_conversation, turn) = orchestrator.resolve_approval(&ctx, &first_uuid, true).await.unwrap();
    assert!(turn.waiting_approval);
    let second_uuid = turn.approval.unwrap().uuid;
    assert_ne!(first_uuid, second_uuid);

    let (_conversation, turn) = orchestrator.resolve_approval(&ctx, &second_uuid, true).await.unwrap();
    assert!(!turn.waiting_approval);
    assert_eq!(turn.response, "final answer");
}

// --- scenario 6: auth-required bubbles through nested composites ------------

#[tokio::test]
async fn auth_required_bubbles_up_through_nested_sequential_nodes() {
    let leaf = llm_leaf("lister", "s6", "", None);
    let inner = sequential("inner", vec![leaf]);
    let root = sequential("outer", vec![inner]);

    let list_tool = ToolDescriptor::new("list_items", "list items", "tools");
    let backend: Arc<dyn ToolBackend> =
        Arc::new(ScriptBackend::new("tools", vec![list_tool]).with_auth_required("list_items"));
    let llm = make_llm_factory(vec![(
        "s6",
        vec![LlmResponse::tool_call(
            0,
            LlmToolCall {
                name: "list_items".to_string(),
                arguments: Value::Null,
            },
            None,
        )],
    )]);
    let engine = build_engine(root, backend, llm).await;
    let orchestrator = Orchestrator::new(engine);
    let ctx = RequestContext::new();

    let conversation = orchestrator.start_conversation(None);
    let (conversation, turn) = orchestrator
        .process_message(&ctx, conversation, "list please")
        .await
        .unwrap();

    assert!(!turn.waiting_approval);
    assert_eq!(turn.response, "authentication required to access tools");
    assert!(conversation.pipeline_state.is_none());
    assert_eq!(conversation.status, canopy_conversation::ConversationStatus::Active);
}

// --- rejecting an approval clears it; resolving twice is an error ----------

#[tokio::test]
async fn rejecting_an_approval_cannot_be_resolved_a_second_time() {
    let root = llm_leaf("assistant", "m7", "", None);
    let tool = ToolDescriptor::new("add", "add a value", "tools").destructive();
    let backend: Arc<dyn ToolBackend> = Arc::new(ScriptBackend::new("tools", vec![tool]));
    let llm = make_llm_factory(vec![(
        "m7",
        vec![LlmResponse::tool_call(
            0,
            LlmToolCall {
                name: "add".to_string(),
                arguments: Value::Null,
            },
            None,
        )],
    )]);
    let engine = build_engine(root, backend, llm).await;
    let orchestrator = Orchestrator::new(engine);
    let ctx = RequestContext::new();

    let conversation = orchestrator.start_conversation(None);
    let (_conversation, turn) = orchestrator
        .process_message(&ctx, conversation, "please add")
        .await
        .unwrap();
    let uuid = turn.approval.unwrap().uuid;

    let (conversation, turn) = orchestrator.resolve_approval(&ctx, &uuid, false).await.unwrap();
    assert_eq!(turn.response, "Operation cancelled.");
    assert_eq!(conversation.status, canopy_conversation::ConversationStatus::Active);

    let err = orchestrator.resolve_approval(&ctx, &uuid, false).await.unwrap_err();
    assert!(matches!(
        err,
        canopy_runtime::RuntimeError::Conversation(canopy_conversation::ConversationError::ApprovalNotFound(_))
    ));
}
