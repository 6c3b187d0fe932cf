use std::future::Future;
use std::pin::Pin;

use canopy_approval::{ApprovalKind, PendingApproval};
use canopy_config::{NodeKind, NodeSpec};
use canopy_conversation::{Message, MessageRole, PipelineState, ToolCallRecord};
use canopy_core::{RequestContext, Value};
use canopy_llm::HistoryMessage;
use canopy_remote::{Task, TaskState, extract_task_text};
use canopy_session::SessionState;
use canopy_tools::ToolCallOutcome;
use futures::future::try_join_all;

use crate::catalog::node_tool_catalog;
use crate::conversation_handle::SharedConversation;
use crate::engine::Engine;
use crate::error::{RuntimeError, RuntimeResult};
use crate::outcome::ExecOutcome;
use crate::resume::ResumeCursor;
use crate::synthetic_tools::{EXIT_LOOP_TOOL, peer_name_from_tool, peer_tool_name};

/// Run `node`, fast-forwarding through `resume` if present.
///
/// `path` is the sequence of child indices from the tree root to `node`; it
/// is what a pause persists and what a later resume replays. `allow_destructive`
/// forces every destructive tool or peer call under this node to execute
/// without staging an approval — set by `parallel` and `loop` on their
/// children, never by a caller directly.
///
/// Returns a manually boxed future because this function calls itself
/// through the composite branches; an `async fn` calling itself recursively
/// has no finite size.
///
/// # Errors
///
/// Propagates configuration errors (unknown peer, malformed resume path) and
/// conversation-store failures. Tool, peer and LLM transport failures are
/// not propagated here — they are recorded on the conversation and returned
/// as a text outcome, per the error handling design.
pub fn execute<'a>(
    engine: &'a Engine,
    ctx: &'a RequestContext,
    node: &'a NodeSpec,
    state: &'a SessionState,
    user_message: &'a str,
    conversation: &'a SharedConversation,
    resume: Option<ResumeCursor>,
    path: Vec<usize>,
    allow_destructive: bool,
) -> Pin<Box<dyn Future<Output = RuntimeResult<ExecOutcome>> + Send + 'a>> {
    Box::pin(async move {
        match node.kind {
            NodeKind::Sequential => {
                execute_sequential(
                    engine,
                    ctx,
                    node,
                    state,
                    user_message,
                    conversation,
                    resume,
                    path,
                    allow_destructive,
                )
                .await
            }
            NodeKind::Parallel => {
                execute_parallel(engine, ctx, node, state, user_message, conversation, path).await
            }
            NodeKind::Loop => {
                execute_loop(engine, ctx, node, state, user_message, conversation, path).await
            }
            NodeKind::Llm => {
                execute_llm_leaf(
                    engine,
                    ctx,
                    node,
                    state,
                    user_message,
                    conversation,
                    resume,
                    path,
                    allow_destructive,
                )
                .await
            }
            NodeKind::RemoteAgent => {
                execute_remote_agent_leaf(
                    engine,
                    ctx,
                    node,
                    state,
                    user_message,
                    conversation,
                    resume,
                    path,
                    allow_destructive,
                )
                .await
            }
        }
    })
}

#[allow(clippy::too_many_arguments)]
async fn execute_sequential<'a>(
    engine: &'a Engine,
    ctx: &'a RequestContext,
    node: &'a NodeSpec,
    state: &'a SessionState,
    user_message: &'a str,
    conversation: &'a SharedConversation,
    resume: Option<ResumeCursor>,
    path: Vec<usize>,
    allow_destructive: bool,
) -> RuntimeResult<ExecOutcome> {
    let mut start_index = 0;
    let mut first_child_resume = None;

    if let Some(cursor) = resume {
        if cursor.is_target() {
            return Err(RuntimeError::InvalidResumePath {
                node: node.name.clone(),
                path,
            });
        }
        let (head, tail) = cursor.descend();
        start_index = head;
        first_child_resume = Some(tail);
    }

    let mut last = ExecOutcome::Text(String::new());
    for (index, child) in node.children.iter().enumerate().skip(start_index) {
        let mut child_path = path.clone();
        child_path.push(index);
        let child_resume = if index == start_index {
            first_child_resume.take()
        } else {
            None
        };

        let outcome = execute(
            engine,
            ctx,
            child,
            state,
            user_message,
            conversation,
            child_resume,
            child_path,
            allow_destructive,
        )
        .await?;

        if outcome.propagates_immediately() {
            return Ok(outcome);
        }
        last = outcome;
    }
    Ok(last)
}

async fn execute_parallel<'a>(
    engine: &'a Engine,
    ctx: &'a RequestContext,
    node: &'a NodeSpec,
    state: &'a SessionState,
    user_message: &'a str,
    conversation: &'a SharedConversation,
    path: Vec<usize>,
) -> RuntimeResult<ExecOutcome> {
    let futures = node.children.iter().enumerate().map(|(index, child)| {
        let mut child_path = path.clone();
        child_path.push(index);
        execute(
            engine,
            ctx,
            child,
            state,
            user_message,
            conversation,
            None,
            child_path,
            true,
        )
    });

    let results = try_join_all(futures).await?;
    let joined = results
        .into_iter()
        .map(ExecOutcome::into_text_or_empty)
        .collect::<Vec<_>>()
        .join("\n");
    Ok(ExecOutcome::Text(joined))
}

async fn execute_loop<'a>(
    engine: &'a Engine,
    ctx: &'a RequestContext,
    node: &'a NodeSpec,
    state: &'a SessionState,
    user_message: &'a str,
    conversation: &'a SharedConversation,
    path: Vec<usize>,
) -> RuntimeResult<ExecOutcome> {
    let mut last = ExecOutcome::Text(String::new());
    'iterations: for _ in 0..node.max_iterations.max(1) {
        for (index, child) in node.children.iter().enumerate() {
            let mut child_path = path.clone();
            child_path.push(index);
            let outcome = execute(
                engine,
                ctx,
                child,
                state,
                user_message,
                conversation,
                None,
                child_path,
                true,
            )
            .await?;

            if matches!(outcome, ExecOutcome::ExitLoop) {
                break 'iterations;
            }
            last = outcome;
        }
    }
    Ok(last)
}

async fn pipeline_state_for(
    node: &NodeSpec,
    path: &[usize],
    state: &SessionState,
    user_message: &str,
) -> PipelineState {
    PipelineState {
        paused_node_path: path.to_vec(),
        paused_node_output_key: node.output_key.clone(),
        session_state_snapshot: state.snapshot().await,
        user_message: user_message.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
async fn execute_llm_leaf<'a>(
    engine: &'a Engine,
    ctx: &'a RequestContext,
    node: &'a NodeSpec,
    state: &'a SessionState,
    user_message: &'a str,
    conversation: &'a SharedConversation,
    resume: Option<ResumeCursor>,
    path: Vec<usize>,
    allow_destructive: bool,
) -> RuntimeResult<ExecOutcome> {
    if let Some(cursor) = resume {
        return resume_leaf(node, state, conversation, cursor, path).await;
    }

    let prompt = state.resolve_template(&node.prompt_template).await;
    let tools = node_tool_catalog(engine, node);
    let model = node.model.as_deref().unwrap_or(&engine.default_model);
    let adapter = engine.adapter_for(model).await;
    let history = vec![HistoryMessage::user(user_message.to_string())];

    let response = match adapter.generate(ctx, &prompt, &history, &tools).await {
        Ok(response) => response,
        Err(err) => return Ok(record_transport_failure(conversation, node, &err.to_string()).await),
    };

    if let Some(call) = response.tool_call {
        // A tool call wins for control flow, but any rationale text the model
        // stated alongside it is still journaled as the assistant's message.
        let announcement = response.text.clone().unwrap_or_else(|| format!("calling {}", call.name));
        conversation.lock().await.push(Message::with_tool_call(
            MessageRole::Assistant,
            announcement,
            ToolCallRecord {
                tool_name: call.name.clone(),
                arguments: call.arguments.clone(),
                result_text: None,
                is_error: false,
            },
        ));

        if call.name == EXIT_LOOP_TOOL {
            return Ok(ExecOutcome::ExitLoop);
        }

        if let Some(peer_name) = peer_name_from_tool(&call.name) {
            let message = peer_message_argument(&call.arguments, user_message);
            let destructive = engine
                .peers
                .info(peer_name)
                .map(|info| info.destructive_intent)
                .unwrap_or(false);
            return delegate_to_peer(
                engine,
                ctx,
                node,
                state,
                user_message,
                conversation,
                &path,
                peer_name,
                &message,
                destructive,
                allow_destructive,
            )
            .await;
        }

        let destructive = engine
            .broker
            .get_tool(&call.name)
            .map(|descriptor| descriptor.destructive_intent)
            .unwrap_or(false);
        return dispatch_broker_tool(
            engine,
            ctx,
            node,
            state,
            user_message,
            conversation,
            &path,
            &call.name,
            call.arguments,
            destructive,
            allow_destructive,
        )
        .await;
    }

    let text = response.text.unwrap_or_default();
    if let Some(key) = &node.output_key {
        state.set(key.clone(), text.clone()).await;
    }
    conversation
        .lock()
        .await
        .push(Message::text(MessageRole::Assistant, text.clone()));
    Ok(ExecOutcome::Text(text))
}

#[allow(clippy::too_many_arguments)]
async fn execute_remote_agent_leaf<'a>(
    engine: &'a Engine,
    ctx: &'a RequestContext,
    node: &'a NodeSpec,
    state: &'a SessionState,
    user_message: &'a str,
    conversation: &'a SharedConversation,
    resume: Option<ResumeCursor>,
    path: Vec<usize>,
    allow_destructive: bool,
) -> RuntimeResult<ExecOutcome> {
    if let Some(cursor) = resume {
        return resume_leaf(node, state, conversation, cursor, path).await;
    }

    let message = if node.prompt_template.is_empty() {
        user_message.to_string()
    } else {
        state.resolve_template(&node.prompt_template).await
    };

    delegate_to_peer(
        engine,
        ctx,
        node,
        state,
        user_message,
        conversation,
        &path,
        &node.name,
        &message,
        node.destructive_intent,
        allow_destructive,
    )
    .await
}

/// Step 1 of the LLM-leaf / remote-agent-leaf dispatch: this node is exactly
/// the paused target named by a `ResumeCursor` with an empty remainder.
async fn resume_leaf(
    node: &NodeSpec,
    state: &SessionState,
    conversation: &SharedConversation,
    cursor: ResumeCursor,
    path: Vec<usize>,
) -> RuntimeResult<ExecOutcome> {
    if !cursor.is_target() {
        return Err(RuntimeError::InvalidResumePath {
            node: node.name.clone(),
            path,
        });
    }
    if let Some(key) = &node.output_key {
        state.set(key.clone(), cursor.tool_result.clone()).await;
    }
    conversation.lock().await.push(Message::text(
        MessageRole::Assistant,
        format!("[{}] Operation completed: {}", node.name, cursor.tool_result),
    ));
    Ok(ExecOutcome::Text(cursor.tool_result))
}

fn peer_message_argument(arguments: &Value, fallback: &str) -> String {
    arguments
        .as_map()
        .and_then(|map| map.get("message"))
        .and_then(Value::as_str)
        .unwrap_or(fallback)
        .to_string()
}

/// Shared by an `llm` node's `a2a_<peer>` tool-call branch and the
/// `remote-agent` leaf: gate on destructive intent, then either stage an
/// approval or call the peer and dispatch its task state.
#[allow(clippy::too_many_arguments)]
async fn delegate_to_peer<'a>(
    engine: &'a Engine,
    ctx: &'a RequestContext,
    node: &'a NodeSpec,
    state: &'a SessionState,
    user_message: &'a str,
    conversation: &'a SharedConversation,
    path: &[usize],
    peer_name: &str,
    message: &str,
    destructive_intent: bool,
    allow_destructive: bool,
) -> RuntimeResult<ExecOutcome> {
    if destructive_intent && !allow_destructive {
        let approval = PendingApproval::new(
            format!("[{}] delegate to peer '{peer_name}': {message}", node.name),
            ApprovalKind::Local {
                tool_name: peer_tool_name(peer_name),
                tool_args: Value::from(message),
            },
        );
        let pipeline_state = pipeline_state_for(node, path, state, user_message).await;
        engine
            .stage_approval(conversation, approval, Some(pipeline_state))
            .await?;
        return Ok(ExecOutcome::WaitingApproval);
    }

    let client = engine
        .peers
        .client(peer_name)
        .ok_or_else(|| RuntimeError::UnknownPeer(peer_name.to_string()))?;

    match client.send_message(ctx, message).await {
        Ok(task) => {
            handle_peer_task_result(
                engine,
                node,
                state,
                user_message,
                conversation,
                path,
                peer_name,
                task,
            )
            .await
        }
        Err(err) => Ok(record_transport_failure(conversation, node, &err.to_string()).await),
    }
}

/// Shared by the initial `send-message` delegation and the approval
/// resolver's `continue-task` follow-up: branch once on a peer's returned
/// task state.
async fn handle_peer_task_result(
    engine: &Engine,
    node: &NodeSpec,
    state: &SessionState,
    user_message: &str,
    conversation: &SharedConversation,
    path: &[usize],
    peer_name: &str,
    task: Task,
) -> RuntimeResult<ExecOutcome> {
    match task.status.state {
        TaskState::InputRequired => {
            let description = format!(
                "[{}] peer '{peer_name}' requires approval{}",
                node.name,
                task.status
                    .message
                    .as_deref()
                    .map(|detail| format!(": {detail}"))
                    .unwrap_or_default(),
            );
            let approval = PendingApproval::new(
                description,
                ApprovalKind::Proxy {
                    remote_task_id: task.id.clone(),
                    remote_agent_name: peer_name.to_string(),
                },
            );
            let pipeline_state = pipeline_state_for(node, path, state, user_message).await;
            engine
                .stage_approval(conversation, approval, Some(pipeline_state))
                .await?;
            Ok(ExecOutcome::WaitingApproval)
        }
        TaskState::AuthRequired => Ok(ExecOutcome::AuthRequired {
            server: peer_name.to_string(),
            tool: peer_tool_name(peer_name),
        }),
        TaskState::Submitted | TaskState::Completed | TaskState::Failed => {
            let text = extract_task_text(&task);
            if let Some(key) = &node.output_key {
                state.set(key.clone(), text.clone()).await;
            }
            conversation.lock().await.push(Message::text(
                MessageRole::Assistant,
                format!("[{}] {text}", node.name),
            ));
            Ok(ExecOutcome::Text(text))
        }
    }
}

/// LLM-leaf step 8: dispatch a broker tool call, gating on destructive
/// intent exactly as [`delegate_to_peer`] does for peers.
#[allow(clippy::too_many_arguments)]
async fn dispatch_broker_tool<'a>(
    engine: &'a Engine,
    ctx: &'a RequestContext,
    node: &'a NodeSpec,
    state: &'a SessionState,
    user_message: &'a str,
    conversation: &'a SharedConversation,
    path: &[usize],
    tool_name: &str,
    tool_args: Value,
    destructive_intent: bool,
    allow_destructive: bool,
) -> RuntimeResult<ExecOutcome> {
    if destructive_intent && !allow_destructive {
        let approval = PendingApproval::new(
            format!("[{}] call destructive tool '{tool_name}'", node.name),
            ApprovalKind::Local {
                tool_name: tool_name.to_string(),
                tool_args,
            },
        );
        let pipeline_state = pipeline_state_for(node, path, state, user_message).await;
        engine
            .stage_approval(conversation, approval, Some(pipeline_state))
            .await?;
        return Ok(ExecOutcome::WaitingApproval);
    }

    match engine.broker.call_tool(ctx, tool_name, tool_args.clone()).await {
        Ok(ToolCallOutcome::AuthRequired { server, tool }) => Ok(ExecOutcome::AuthRequired { server, tool }),
        Ok(ToolCallOutcome::Result(result)) => {
            let text = result.first_text().unwrap_or_default().to_string();
            if !result.is_error {
                if let Some(key) = &node.output_key {
                    state.set(key.clone(), text.clone()).await;
                }
            }
            conversation.lock().await.push(Message::with_tool_call(
                if result.is_error {
                    MessageRole::Tool
                } else {
                    MessageRole::Assistant
                },
                if result.is_error {
                    text.clone()
                } else {
                    format!("[{}] {text}", node.name)
                },
                ToolCallRecord {
                    tool_name: tool_name.to_string(),
                    arguments: tool_args,
                    result_text: Some(text.clone()),
                    is_error: result.is_error,
                },
            ));
            Ok(ExecOutcome::Text(text))
        }
        Err(err) => Ok(record_transport_failure(conversation, node, &err.to_string()).await),
    }
}

async fn record_transport_failure(
    conversation: &SharedConversation,
    node: &NodeSpec,
    reason: &str,
) -> ExecOutcome {
    let text = format!("[{}] {reason}", node.name);
    conversation
        .lock()
        .await
        .push(Message::text(MessageRole::Assistant, text.clone()));
    ExecOutcome::Text(text)
}
