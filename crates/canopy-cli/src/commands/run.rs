//! `canopy run` — an interactive REPL driving one conversation against a
//! configured node tree.
//!
//! A thin terminal client over [`canopy_runtime::Orchestrator`]: read a
//! line, hand it to `process-message`, print the response, and if the turn
//! paused for approval, prompt for a yes/no decision and resolve it before
//! reading the next line.

use std::io::{self, Write};

use anyhow::Result;
use canopy_config::{load_node_tree, validate_tree};
use canopy_core::RequestContext;
use canopy_runtime::Orchestrator;

use crate::setup::build_engine;

pub(crate) async fn run(tree_path: &str) -> Result<()> {
    let doc = load_node_tree(tree_path)?;
    validate_tree(&doc.root)?;

    let engine = build_engine(doc).await?;
    let orchestrator = Orchestrator::new(engine);
    let ctx = RequestContext::new();

    let mut conversation = orchestrator.start_conversation(None);
    println!("canopy: conversation {} ready. Type 'exit' to quit.", conversation.id);

    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let (updated, turn) = orchestrator.process_message(&ctx, conversation, line).await?;
        conversation = updated;
        println!("{}", turn.response);

        if turn.waiting_approval {
            conversation = prompt_and_resolve(&orchestrator, &ctx, conversation, turn).await?;
        }
    }

    Ok(())
}

async fn prompt_and_resolve(
    orchestrator: &Orchestrator,
    ctx: &RequestContext,
    mut conversation: canopy_conversation::Conversation,
    turn: canopy_runtime::TurnOutcome,
) -> Result<canopy_conversation::Conversation> {
    let Some(approval) = turn.approval else {
        return Ok(conversation);
    };

    loop {
        print!("approve '{}'? [y/n] ", approval.description);
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(conversation);
        }
        let approved = match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => continue,
        };

        let (updated, resolved) = orchestrator.resolve_approval(ctx, &approval.uuid, approved).await?;
        conversation = updated;
        println!("{}", resolved.response);
        if !resolved.waiting_approval {
            return Ok(conversation);
        }
        if let Some(next_approval) = resolved.approval {
            return Box::pin(prompt_and_resolve(
                orchestrator,
                ctx,
                conversation,
                canopy_runtime::TurnOutcome {
                    response: resolved.response,
                    waiting_approval: true,
                    approval: Some(next_approval),
                },
            ))
            .await;
        }
        return Ok(conversation);
    }
}
