use canopy_approval::{ApprovalKind, PendingApproval};
use canopy_conversation::{Conversation, Message, MessageRole, ToolCallRecord};
use canopy_core::{RequestContext, Value};
use canopy_remote::{TaskState, extract_task_text};
use canopy_session::SessionState;
use canopy_tools::ToolCallOutcome;

use crate::conversation_handle;
use crate::engine::Engine;
use crate::error::{RuntimeError, RuntimeResult};
use crate::executor;
use crate::outcome::ExecOutcome;
use crate::resume::ResumeCursor;
use crate::simple_mode;
use crate::synthetic_tools::peer_name_from_tool;

/// Resolve the pending approval with the given `uuid`.
///
/// # Errors
///
/// Returns [`RuntimeError::Conversation`] if no conversation holds this
/// UUID, [`RuntimeError::UnexpectedApprovalShape`] if the conversation
/// reports `waiting-approval` with nothing staged, and propagates
/// configuration and store failures encountered while resuming.
pub async fn resolve(
    engine: &Engine,
    ctx: &RequestContext,
    uuid: &str,
    approved: bool,
) -> RuntimeResult<(Conversation, ExecOutcome)> {
    let mut conversation = engine.store.find_by_approval_uuid(uuid).await?;
    let (approval, pipeline_state) = conversation
        .resolve_pending_approval()
        .ok_or_else(|| RuntimeError::UnexpectedApprovalShape(uuid.to_string()))?;

    if !approved {
        conversation.push(Message::text(MessageRole::User, "[APPROVAL]: Rejected"));
        conversation.push(Message::text(MessageRole::Assistant, "Operation cancelled."));
        if let ApprovalKind::Proxy {
            remote_task_id,
            remote_agent_name,
        } = &approval.kind
        {
            if let Some(client) = engine.peers.client(remote_agent_name) {
                let _ = client.continue_task(ctx, remote_task_id, "rejected").await;
            }
        }
        engine.store.save(&conversation).await?;
        return Ok((conversation, ExecOutcome::Text("Operation cancelled.".to_string())));
    }

    conversation.push(Message::text(MessageRole::User, "[APPROVAL]: Approved"));

    let tool_result = match &approval.kind {
        ApprovalKind::Proxy {
            remote_task_id,
            remote_agent_name,
        } => {
            let client = engine
                .peers
                .client(remote_agent_name)
                .ok_or_else(|| RuntimeError::UnknownPeer(remote_agent_name.clone()))?;
            let task = client.continue_task(ctx, remote_task_id, "approved").await?;

            match task.status.state {
                TaskState::InputRequired => {
                    let new_approval = PendingApproval::new(
                        format!("peer '{remote_agent_name}' requires further approval"),
                        ApprovalKind::Proxy {
                            remote_task_id: task.id.clone(),
                            remote_agent_name: remote_agent_name.clone(),
                        },
                    );
                    conversation.stage_approval(new_approval.clone(), pipeline_state);
                    conversation.push(Message::text(
                        MessageRole::Assistant,
                        format!("{} ({})", new_approval.description, new_approval.id),
                    ));
                    engine.store.save(&conversation).await?;
                    return Ok((conversation, ExecOutcome::WaitingApproval));
                }
                TaskState::AuthRequired => {
                    engine.store.save(&conversation).await?;
                    return Ok((
                        conversation,
                        ExecOutcome::AuthRequired {
                            server: remote_agent_name.clone(),
                            tool: crate::synthetic_tools::peer_tool_name(remote_agent_name),
                        },
                    ));
                }
                TaskState::Submitted | TaskState::Completed | TaskState::Failed => {
                    let text = extract_task_text(&task);
                    conversation.push(Message::with_tool_call(
                        MessageRole::Tool,
                        text.clone(),
                        ToolCallRecord {
                            tool_name: crate::synthetic_tools::peer_tool_name(remote_agent_name),
                            arguments: Value::Null,
                            result_text: Some(text.clone()),
                            is_error: false,
                        },
                    ));
                    text
                }
            }
        }
        ApprovalKind::Local { tool_name, tool_args } => {
            match resolve_local_tool(engine, ctx, &mut conversation, tool_name, tool_args).await? {
                LocalToolOutcome::Text(text) => text,
                LocalToolOutcome::Paused(outcome) => {
                    engine.store.save(&conversation).await?;
                    return Ok((conversation, outcome));
                }
            }
        }
    };

    match pipeline_state {
        None => {
            let shared = conversation_handle::share(conversation);
            let outcome = simple_mode::run_simple_mode(engine, ctx, &engine.default_model, &shared).await?;
            let conversation = conversation_handle::unshare(shared);
            engine.store.save(&conversation).await?;
            Ok((conversation, outcome))
        }
        Some(saved) => {
            let state = SessionState::from_snapshot(saved.session_state_snapshot.clone());
            let cursor = ResumeCursor {
                path_remainder: saved.paused_node_path.clone(),
                tool_result,
                output_key: saved.paused_node_output_key.clone(),
            };
            let shared = conversation_handle::share(conversation);
            let outcome = executor::execute(
                engine,
                ctx,
                &engine.root,
                &state,
                &saved.user_message,
                &shared,
                Some(cursor),
                Vec::new(),
                false,
            )
            .await?;
            let conversation = conversation_handle::unshare(shared);
            engine.store.save(&conversation).await?;
            Ok((conversation, outcome))
        }
    }
}

/// Outcome of resolving an [`ApprovalKind::Local`] approval: either a plain
/// text tool result to fold back into the resume path, or a fresh pause that
/// short-circuits `resolve` exactly like the `Proxy` branch's own re-pause
/// case.
enum LocalToolOutcome {
    Text(String),
    Paused(ExecOutcome),
}

/// Resolve an [`ApprovalKind::Local`] approval: a synthetic `a2a_<peer>`
/// tool is forwarded through the peer's `send-message`, anything else
/// through the broker.
async fn resolve_local_tool(
    engine: &Engine,
    ctx: &RequestContext,
    conversation: &mut Conversation,
    tool_name: &str,
    tool_args: &Value,
) -> RuntimeResult<LocalToolOutcome> {
    if let Some(peer_name) = peer_name_from_tool(tool_name) {
        let message = tool_args
            .as_map()
            .and_then(|map| map.get("message"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let client = engine
            .peers
            .client(peer_name)
            .ok_or_else(|| RuntimeError::UnknownPeer(peer_name.to_string()))?;

        return match client.send_message(ctx, &message).await {
            Ok(task) => match task.status.state {
                TaskState::InputRequired => {
                    // A peer that pauses again on first contact has no prior
                    // pipeline-state to re-attach; stage it bare, matching
                    // the simple-mode proxy-approval shape, and hand control
                    // back to the caller instead of treating it as an error.
                    let new_approval = PendingApproval::new(
                        format!("peer '{peer_name}' requires approval"),
                        ApprovalKind::Proxy {
                            remote_task_id: task.id.clone(),
                            remote_agent_name: peer_name.to_string(),
                        },
                    );
                    conversation.push(Message::text(
                        MessageRole::Assistant,
                        format!("{} ({})", new_approval.description, new_approval.id),
                    ));
                    conversation.stage_approval(new_approval, None);
                    Ok(LocalToolOutcome::Paused(ExecOutcome::WaitingApproval))
                }
                TaskState::AuthRequired => Ok(LocalToolOutcome::Paused(ExecOutcome::AuthRequired {
                    server: peer_name.to_string(),
                    tool: tool_name.to_string(),
                })),
                TaskState::Submitted | TaskState::Completed | TaskState::Failed => {
                    let text = extract_task_text(&task);
                    conversation.push(Message::with_tool_call(
                        MessageRole::Tool,
                        text.clone(),
                        ToolCallRecord {
                            tool_name: tool_name.to_string(),
                            arguments: tool_args.clone(),
                            result_text: Some(text.clone()),
                            is_error: false,
                        },
                    ));
                    Ok(LocalToolOutcome::Text(text))
                }
            },
            Err(err) => {
                let text = err.to_string();
                conversation.push(Message::with_tool_call(
                    MessageRole::Tool,
                    text.clone(),
                    ToolCallRecord {
                        tool_name: tool_name.to_string(),
                        arguments: tool_args.clone(),
                        result_text: Some(text.clone()),
                        is_error: true,
                    },
                ));
                Ok(LocalToolOutcome::Text(text))
            }
        };
    }

    match engine.broker.call_tool(ctx, tool_name, tool_args.clone()).await {
        Ok(ToolCallOutcome::AuthRequired { server, tool }) => {
            Ok(LocalToolOutcome::Paused(ExecOutcome::AuthRequired { server, tool }))
        }
        Ok(ToolCallOutcome::Result(result)) => {
            let text = result.first_text().unwrap_or_default().to_string();
            conversation.push(Message::with_tool_call(
                MessageRole::Tool,
                text.clone(),
                ToolCallRecord {
                    tool_name: tool_name.to_string(),
                    arguments: tool_args.clone(),
                    result_text: Some(text.clone()),
                    is_error: result.is_error,
                },
            ));
            Ok(LocalToolOutcome::Text(text))
        }
        Err(err) => {
            let text = err.to_string();
            conversation.push(Message::with_tool_call(
                MessageRole::Tool,
                text.clone(),
                ToolCallRecord {
                    tool_name: tool_name.to_string(),
                    arguments: tool_args.clone(),
                    result_text: Some(text.clone()),
                    is_error: true,
                },
            ));
            Ok(LocalToolOutcome::Text(text))
        }
    }
}
