use canopy_approval::{ApprovalKind, PendingApproval};
use canopy_conversation::{Conversation, Message, MessageRole, ToolCallRecord};
use canopy_core::{RequestContext, Value};
use canopy_llm::HistoryMessage;
use canopy_remote::{TaskState, extract_task_text};
use canopy_tools::ToolCallOutcome;

use crate::conversation_handle::SharedConversation;
use crate::engine::Engine;
use crate::error::{RuntimeError, RuntimeResult};
use crate::outcome::ExecOutcome;
use crate::synthetic_tools::peer_name_from_tool;

/// Backwards-compatible single-leaf mode: a bounded multi-turn tool loop run
/// directly against the conversation's message log, with no node tree and no
/// pipeline state to save on pause.
const MAX_ITERATIONS: u32 = 10;

/// Run the simple-mode loop against `conversation`'s current message log.
///
/// Re-entered by the approval resolver after a simple-mode pause resolves,
/// so this reads the log fresh on every call rather than taking a history
/// snapshot up front.
///
/// # Errors
///
/// Propagates configuration errors (unknown peer) and conversation-store
/// failures raised while staging an approval.
pub async fn run_simple_mode(
    engine: &Engine,
    ctx: &RequestContext,
    model: &str,
    conversation: &SharedConversation,
) -> RuntimeResult<ExecOutcome> {
    let adapter = engine.adapter_for(model).await;

    for _ in 0..MAX_ITERATIONS {
        let (history, tools) = {
            let guard = conversation.lock().await;
            (conversation_to_history(&guard), engine.broker.list_tools())
        };

        let response = match adapter.generate(ctx, "", &history, &tools).await {
            Ok(response) => response,
            Err(err) => return Ok(finish_with_text(conversation, err.to_string()).await),
        };

        let Some(call) = response.tool_call else {
            return Ok(finish_with_text(conversation, response.text.unwrap_or_default()).await);
        };

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

        if let Some(peer_name) = peer_name_from_tool(&call.name) {
            let message = call
                .arguments
                .as_map()
                .and_then(|map| map.get("message"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let destructive = engine
                .peers
                .info(peer_name)
                .map(|info| info.destructive_intent)
                .unwrap_or(false);

            if destructive {
                let approval = PendingApproval::new(
                    format!("delegate to peer '{peer_name}': {message}"),
                    ApprovalKind::Local {
                        tool_name: call.name.clone(),
                        tool_args: call.arguments,
                    },
                );
                engine.stage_approval(conversation, approval, None).await?;
                return Ok(ExecOutcome::WaitingApproval);
            }

            let client = engine
                .peers
                .client(peer_name)
                .ok_or_else(|| RuntimeError::UnknownPeer(peer_name.to_string()))?;

            match client.send_message(ctx, &message).await {
                Ok(task) => match task.status.state {
                    TaskState::InputRequired => {
                        let approval = PendingApproval::new(
                            format!("peer '{peer_name}' requires approval"),
                            ApprovalKind::Proxy {
                                remote_task_id: task.id.clone(),
                                remote_agent_name: peer_name.to_string(),
                            },
                        );
                        engine.stage_approval(conversation, approval, None).await?;
                        return Ok(ExecOutcome::WaitingApproval);
                    }
                    TaskState::AuthRequired => {
                        return Ok(ExecOutcome::AuthRequired {
                            server: peer_name.to_string(),
                            tool: call.name.clone(),
                        });
                    }
                    TaskState::Submitted | TaskState::Completed | TaskState::Failed => {
                        let text = extract_task_text(&task);
                        record_tool_result(conversation, &call.name, call.arguments, text, false).await;
                    }
                },
                Err(err) => {
                    record_tool_result(conversation, &call.name, call.arguments, err.to_string(), true).await;
                }
            }
            continue;
        }

        let destructive = engine
            .broker
            .get_tool(&call.name)
            .map(|descriptor| descriptor.destructive_intent)
            .unwrap_or(false);

        if destructive {
            let approval = PendingApproval::new(
                format!("call destructive tool '{}'", call.name),
                ApprovalKind::Local {
                    tool_name: call.name.clone(),
                    tool_args: call.arguments,
                },
            );
            engine.stage_approval(conversation, approval, None).await?;
            return Ok(ExecOutcome::WaitingApproval);
        }

        match engine.broker.call_tool(ctx, &call.name, call.arguments.clone()).await {
            Ok(ToolCallOutcome::AuthRequired { server, tool }) => {
                return Ok(ExecOutcome::AuthRequired { server, tool });
            }
            Ok(ToolCallOutcome::Result(result)) => {
                let text = result.first_text().unwrap_or_default().to_string();
                record_tool_result(conversation, &call.name, call.arguments, text, result.is_error).await;
            }
            Err(err) => {
                record_tool_result(conversation, &call.name, call.arguments, err.to_string(), true).await;
            }
        }
    }

    Ok(finish_with_text(conversation, "maximum tool iterations reached".to_string()).await)
}

async fn finish_with_text(conversation: &SharedConversation, text: String) -> ExecOutcome {
    conversation
        .lock()
        .await
        .push(Message::text(MessageRole::Assistant, text.clone()));
    ExecOutcome::Text(text)
}

async fn record_tool_result(
    conversation: &SharedConversation,
    tool_name: &str,
    arguments: Value,
    text: String,
    is_error: bool,
) {
    conversation.lock().await.push(Message::with_tool_call(
        MessageRole::Tool,
        text.clone(),
        ToolCallRecord {
            tool_name: tool_name.to_string(),
            arguments,
            result_text: Some(text),
            is_error,
        },
    ));
}

/// Convert a conversation's message log into adapter history: drop the
/// system entry and assistant-only tool-call records (the model announcing
/// its own call, which would otherwise teach it to mimic that format), map
/// tool results to synthetic user turns, then coalesce consecutive
/// same-role entries so the result strictly alternates.
fn conversation_to_history(conversation: &Conversation) -> Vec<HistoryMessage> {
    let mut history = Vec::with_capacity(conversation.messages.len());
    for message in &conversation.messages {
        match message.role {
            MessageRole::System => continue,
            MessageRole::Assistant => {
                if message.tool_call.is_some() {
                    continue;
                }
                history.push(HistoryMessage::model(message.content.clone()));
            }
            MessageRole::User => history.push(HistoryMessage::user(message.content.clone())),
            MessageRole::Tool => {
                let text = message
                    .tool_call
                    .as_ref()
                    .and_then(|record| record.result_text.clone())
                    .unwrap_or_else(|| message.content.clone());
                history.push(HistoryMessage::user(text));
            }
        }
    }
    coalesce_same_role(history)
}

fn coalesce_same_role(history: Vec<HistoryMessage>) -> Vec<HistoryMessage> {
    let mut coalesced: Vec<HistoryMessage> = Vec::with_capacity(history.len());
    for message in history {
        match coalesced.last_mut() {
            Some(last) if last.role == message.role => {
                last.content.push('\n');
                last.content.push_str(&message.content);
            }
            _ => coalesced.push(message),
        }
    }
    coalesced
}
