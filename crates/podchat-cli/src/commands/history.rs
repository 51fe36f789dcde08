use super::Context;
use anyhow::{Context as _, Result};
use podchat_core::history::{AppendOutcome, Message};
use podchat_interaction::{DpopSession, SolidChatHistory};

async fn open(context: &Context) -> Result<SolidChatHistory<DpopSession>> {
    let account = context.account_store().require()?;
    SolidChatHistory::connect(&account, &context.config)
        .await
        .with_context(|| format!("Could not connect to pod {}", account.pod_base_url))
}

pub async fn list(context: &Context) -> Result<()> {
    let mut history = open(context).await?;
    let messages = history.list().await;
    if messages.is_empty() {
        println!("(no messages)");
    }
    for message in messages {
        println!("[{}] {}", message.role, message.content);
    }
    Ok(())
}

pub async fn append(context: &Context, from_ai: bool, content: String) -> Result<()> {
    let mut history = open(context).await?;
    // Read first so the patch extends the current tail.
    history.list().await;

    let message = if from_ai {
        Message::ai(content)
    } else {
        Message::human(content)
    };
    match history.append(message).await {
        AppendOutcome::Committed => {
            println!("Appended ({} messages)", history.messages_cached().len());
            Ok(())
        }
        AppendOutcome::Rejected { status } => {
            anyhow::bail!("The pod rejected the append with status {status}; try again")
        }
        AppendOutcome::Failed { reason } => anyhow::bail!("Append failed: {reason}"),
    }
}

pub async fn clear(context: &Context) -> Result<()> {
    let mut history = open(context).await?;
    history.clear().await;
    println!("Cleared {}", history.document_url());
    Ok(())
}
