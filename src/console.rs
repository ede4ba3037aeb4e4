use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::agent::llm::LLMProvider;
use crate::config::ChatConfig;
use crate::conversation::ConversationHandler;

/// Read-eval-print loop. Returns when the user types an exit phrase or
/// input reaches EOF; a model failure that outlives its retries is returned
/// as an error.
pub async fn run<P, R, W>(
    handler: &mut ConversationHandler<P>,
    chat: &ChatConfig,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    P: LLMProvider,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    writeln!(
        out,
        "Conversation started. Type one of [{}] to stop.",
        chat.exit_phrases.join(", ")
    )?;

    loop {
        write!(out, "You: ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            debug!("Input closed");
            break;
        };
        if chat.is_exit_phrase(&line) {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = handler.process_input(line).await?;
        writeln!(out, "Bot: {}", reply)?;
    }

    writeln!(out, "Conversation ended")?;
    info!(
        "Conversation ended after {} messages",
        handler.session().messages().len()
    );
    Ok(())
}
