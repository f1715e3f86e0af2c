#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use tokio::fs;
use tokio::sync::mpsc;

use super::actions::help_text;
use super::join_sources;
use super::CodeBlocks;
use super::GenerationSession;
use super::Renderer;
use super::Submission;
use crate::domain::models::Action;
use crate::domain::models::Credential;
use crate::domain::models::Event;
use crate::domain::models::GeneratedCode;
use crate::domain::models::Language;
use crate::domain::models::SlashCommand;
use crate::infrastructure::credentials::CredentialStore;

/// Lines to print after handling input, and whether the chat should end.
#[derive(Default)]
pub struct Reply {
    pub lines: Vec<String>,
    pub should_break: bool,
}

impl Reply {
    fn line(line: String) -> Reply {
        return Reply {
            lines: vec![line],
            should_break: false,
        };
    }
}

pub struct AppState {
    pub session: GenerationSession,
    pub codeblocks: CodeBlocks,
    pub credentials: CredentialStore,
    pub explicit_credential: Credential,
    pub renderer: Renderer,
}

impl AppState {
    pub fn new(
        language: Language,
        credentials: CredentialStore,
        explicit_credential: Credential,
        renderer: Renderer,
    ) -> AppState {
        return AppState {
            session: GenerationSession::new(language),
            codeblocks: CodeBlocks::default(),
            credentials,
            explicit_credential,
            renderer,
        };
    }

    pub fn greeting(&self) -> String {
        let language = self.session.language().title();
        return self.renderer.notice(&format!(
            "Hey there! Describe a task and I'll write {language} code for it. Type /help for commands."
        ));
    }

    pub async fn handle_input(
        &mut self,
        text: &str,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<Reply> {
        if let Some(command) = SlashCommand::parse(text) {
            return self.handle_slash_command(command, tx).await;
        }

        self.session.set_pending_prompt(text);
        if self.session.pending_prompt().trim().is_empty() {
            return Ok(Reply::default());
        }
        if self.session.is_generating() {
            return Ok(Reply::line(self.renderer.notice(
                "Still generating. Wait for the result or use /cancel.",
            )));
        }

        // Read at submission time so tokens saved elsewhere are picked up.
        let credential = match self.credentials.resolve(&self.explicit_credential).await {
            Ok(credential) => credential,
            Err(err) => {
                tracing::error!(error = ?err, path = ?self.credentials.path(), "Failed to read credential");
                return Ok(Reply::line(self.renderer.error(&format!(
                    "Failed to read the API token from {}: {err}",
                    self.credentials.path().to_string_lossy()
                ))));
            }
        };

        match self.session.submit_pending(&credential) {
            Submission::Rejected => return Ok(Reply::default()),
            Submission::Answered => return Ok(Reply::line(self.render_last())),
            Submission::Dispatched(ticket) => {
                let language = ticket.request.language.title();
                tx.send(Action::Generate(ticket))?;
                return Ok(Reply::line(
                    self.renderer
                        .notice(&format!("Generating {language} code...")),
                ));
            }
        }
    }

    pub fn handle_event(&mut self, event: Event) -> Reply {
        match event {
            Event::GenerationFinished(id, res) => {
                if !self.session.complete(id, res) {
                    return Reply::default();
                }
                self.codeblocks
                    .replace_from_transcript(self.session.transcript());

                return Reply::line(self.render_last());
            }
            Event::Notice(text) => return Reply::line(self.renderer.notice(&text)),
            Event::NoticeError(text) => return Reply::line(self.renderer.error(&text)),
        }
    }

    fn render_last(&self) -> String {
        let entry = match self.session.transcript().last() {
            Some(entry) => entry,
            None => return "".to_string(),
        };

        let mut code_number = None;
        if entry.code().is_some() {
            code_number = Some(self.codeblocks.len());
        }

        return self.renderer.entry(entry, code_number);
    }

    fn switch_language(&mut self, language: Language) -> Reply {
        self.session.set_language(language);
        return Reply::line(
            self.renderer
                .notice(&format!("Now generating {} code.", language.title())),
        );
    }

    async fn handle_slash_command(
        &mut self,
        command: SlashCommand,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<Reply> {
        if command.is_quit() {
            return Ok(Reply {
                lines: vec![],
                should_break: true,
            });
        }

        if command.is_help() {
            return Ok(Reply::line(help_text()));
        }

        if command.is_python() {
            return Ok(self.switch_language(Language::Python));
        }

        if command.is_lua() {
            return Ok(self.switch_language(Language::Lua));
        }

        if command.is_language() {
            if command.args.is_empty() {
                return Ok(Reply::line(self.renderer.notice(&format!(
                    "Generating {} code.",
                    self.session.language().title()
                ))));
            }

            if let Some(language) = Language::parse(&command.args[0]) {
                return Ok(self.switch_language(language));
            }

            return Ok(Reply::line(self.renderer.error(&format!(
                "Unknown language {}. Choose python or lua.",
                command.args[0]
            ))));
        }

        if command.is_copy() {
            match self.codeblocks.select(&command.args) {
                Ok(blocks) => tx.send(Action::CopyCode(blocks))?,
                Err(err) => return Ok(Reply::line(self.selection_error(err))),
            }
            return Ok(Reply::default());
        }

        if command.is_save() {
            return self.save(&command.args).await;
        }

        if command.is_token() {
            if command.args.is_empty() {
                return Ok(Reply::line(self.renderer.error("Usage: /token YOUR_TOKEN")));
            }

            let path = self.credentials.path().to_string_lossy().to_string();
            if let Err(err) = self
                .credentials
                .save(&Credential::new(&command.args[0]))
                .await
            {
                tracing::error!(error = ?err, path = %path, "Failed to save credential");
                return Ok(Reply::line(
                    self.renderer
                        .error(&format!("Failed to save the API token to {path}: {err}")),
                ));
            }
            let mut lines = vec![self.renderer.notice(&format!("Saved API token to {path}."))];
            if !self.explicit_credential.is_empty() {
                lines.push(self.renderer.notice(
                    "A token passed with --openai-token is in use and takes precedence.",
                ));
            }

            return Ok(Reply {
                lines,
                should_break: false,
            });
        }

        if command.is_cancel() {
            if self.session.invalidate().is_none() {
                return Ok(Reply::line(self.renderer.notice("Nothing to cancel.")));
            }
            tx.send(Action::Cancel())?;

            return Ok(Reply::line(self.render_last()));
        }

        return Ok(Reply::default());
    }

    async fn save(&self, args: &[String]) -> Result<Reply> {
        // A path is anything that isn't a code block selector.
        let (selectors, paths): (Vec<String>, Vec<String>) =
            args.iter().cloned().partition(|arg| {
                return arg
                    .chars()
                    .all(|c| return c.is_ascii_digit() || c == ',' || c == '.')
                    && arg.chars().any(|c| return c.is_ascii_digit());
            });

        let blocks: Vec<GeneratedCode> = match self.codeblocks.select(&selectors) {
            Ok(blocks) => blocks,
            Err(err) => return Ok(Reply::line(self.selection_error(err))),
        };

        let file_path = match paths.first() {
            Some(file_path) => path::PathBuf::from(file_path),
            None => path::PathBuf::from(blocks[0].language.default_file_name()),
        };

        let mut payload = join_sources(&blocks);
        if !payload.ends_with('\n') {
            payload += "\n";
        }

        if let Err(err) = fs::write(&file_path, payload).await {
            tracing::error!(error = ?err, path = ?file_path, "Failed to save code");
            return Ok(Reply::line(self.renderer.error(&format!(
                "Failed to write {}: {err}",
                file_path.to_string_lossy()
            ))));
        }

        return Ok(Reply::line(self.renderer.notice(&format!(
            "Saved code to {}.",
            file_path.to_string_lossy()
        ))));
    }

    fn selection_error(&self, err: anyhow::Error) -> String {
        return self.renderer.error(&format!(
            "There was an error trying to parse your command:\n\n{err}"
        ));
    }
}
