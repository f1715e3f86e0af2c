#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::clipboard::ClipboardService;
use super::join_sources;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::GeneratedCode;
use crate::domain::models::GenerationTicket;
use crate::domain::models::SharedBackend;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /python (/py) - Generate Python code from now on.
- /lua - Generate Lua code from now on.
- /lang (/l) [python,lua] - Shows the target language, or switches to the one given.
- /copy (/c) [CODE_BLOCK_NUMBER?] - Copies generated code to your clipboard.
- /save (/s) [CODE_BLOCK_NUMBER?] [PATH?] - Writes generated code to a file. Defaults to code.py or code.lua in the current directory.
- /token (/t) [TOKEN] - Saves your OpenAI API token for future sessions.
- /cancel (/x) - Abandons the generation in progress.
- /quit /exit (/q) - Exit CodeAI.
- /help (/h) - Provides this help menu.

CODE BLOCKS:
Every generated snippet is numbered with a (NUMBER) so it can be referenced later. The CODE_BLOCK_NUMBER can be set as follows:
- `1` - Selects the first code block
- `1,3,5` - Selects code blocks 1, 3, and 5.
- `2..5`- Selects an inclusive range of code blocks between 2 and 5.
- None - Selects the last generated code block.
        "#;

    return text.trim().to_string();
}

fn generate(
    backend: SharedBackend,
    ticket: GenerationTicket,
    tx: mpsc::UnboundedSender<Event>,
) -> JoinHandle<()> {
    return tokio::spawn(async move {
        tracing::debug!(id = %ticket.id, "Generation started");
        let res = backend.generate(ticket.request, &ticket.credential).await;
        if let Err(err) = tx.send(Event::GenerationFinished(ticket.id, res)) {
            tracing::error!(id = %ticket.id, error = ?err, "Failed to report generation result");
        }
    });
}

fn copy_code(blocks: Vec<GeneratedCode>, tx: &mpsc::UnboundedSender<Event>) -> Result<()> {
    if let Err(err) = ClipboardService::set(join_sources(&blocks)) {
        tx.send(Event::NoticeError(err.to_string()))?;
        return Ok(());
    }

    let msg = if blocks.len() == 1 {
        "Copied code to clipboard.".to_string()
    } else {
        format!("Copied {} code blocks to clipboard.", blocks.len())
    };
    tx.send(Event::Notice(msg))?;

    return Ok(());
}

pub struct ActionsService {}

impl ActionsService {
    /// Runs generations in the background. At most one is in flight at a
    /// time, and `Action::Cancel` aborts it.
    pub async fn start(
        backend: SharedBackend,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        // Lazy default.
        let mut worker: JoinHandle<()> = tokio::spawn(async {});

        while let Some(action) = rx.recv().await {
            match action {
                Action::Cancel() => {
                    tracing::debug!("Generation aborted");
                    worker.abort();
                }
                Action::CopyCode(blocks) => {
                    copy_code(blocks, &tx)?;
                }
                Action::Generate(ticket) => {
                    worker.abort();
                    worker = generate(backend.clone(), ticket, tx.clone());
                }
            }
        }

        worker.abort();
        return Ok(());
    }
}
