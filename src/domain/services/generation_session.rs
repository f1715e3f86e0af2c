#[cfg(test)]
#[path = "generation_session_test.rs"]
mod tests;

use super::strip_code_fence;
use crate::domain::models::Backend;
use crate::domain::models::Credential;
use crate::domain::models::GenerationId;
use crate::domain::models::GenerationRequest;
use crate::domain::models::GenerationResult;
use crate::domain::models::GenerationTicket;
use crate::domain::models::Language;
use crate::domain::models::TranscriptEntry;

pub const CONFIRMATION_MESSAGE: &str = "Done! Here's your code:";
pub const MISSING_CREDENTIAL_MESSAGE: &str = "No OpenAI API token is configured. Save one with `/token YOUR_TOKEN` or `codeai credential set YOUR_TOKEN`, or pass it with --openai-token.";
pub const CANCELLED_MESSAGE: &str = "Generation cancelled.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    AwaitingResponse { id: GenerationId, language: Language },
}

pub enum Submission {
    /// Empty prompt, or a generation is already in flight. Nothing changed.
    Rejected,
    /// Accepted and already answered without a network call.
    Answered,
    /// Accepted. The ticket must be run and handed back through `complete`.
    Dispatched(GenerationTicket),
}

pub struct GenerationSession {
    transcript: Vec<TranscriptEntry>,
    pending_prompt: String,
    language: Language,
    state: GenerationState,
    last_id: GenerationId,
}

impl GenerationSession {
    pub fn new(language: Language) -> GenerationSession {
        return GenerationSession {
            transcript: vec![],
            pending_prompt: "".to_string(),
            language,
            state: GenerationState::Idle,
            last_id: GenerationId::new(0),
        };
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        return &self.transcript;
    }

    pub fn pending_prompt(&self) -> &str {
        return &self.pending_prompt;
    }

    pub fn set_pending_prompt(&mut self, text: &str) {
        self.pending_prompt = text.to_string();
    }

    pub fn language(&self) -> Language {
        return self.language;
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn state(&self) -> GenerationState {
        return self.state;
    }

    pub fn is_generating(&self) -> bool {
        return self.state() != GenerationState::Idle;
    }

    pub fn submit_pending(&mut self, credential: &Credential) -> Submission {
        let prompt = self.pending_prompt.to_string();
        return self.submit(&prompt, self.language, credential);
    }

    pub fn submit(
        &mut self,
        prompt: &str,
        language: Language,
        credential: &Credential,
    ) -> Submission {
        if prompt.trim().is_empty() || self.is_generating() {
            return Submission::Rejected;
        }

        self.transcript.push(TranscriptEntry::user(prompt));
        self.pending_prompt.clear();

        let id = self.last_id.next();
        self.last_id = id;
        self.state = GenerationState::AwaitingResponse { id, language };

        if credential.is_empty() {
            tracing::debug!(id = %id, "No credential configured, skipping generation");
            self.finish(TranscriptEntry::assistant(MISSING_CREDENTIAL_MESSAGE));
            return Submission::Answered;
        }

        tracing::debug!(id = %id, language = %language, "Dispatching generation");

        return Submission::Dispatched(GenerationTicket {
            id,
            request: GenerationRequest::new(prompt, language),
            credential: credential.clone(),
        });
    }

    /// Applies the outcome of a dispatched generation. Returns false when the
    /// id is stale and the result was dropped.
    pub fn complete(&mut self, id: GenerationId, result: GenerationResult) -> bool {
        let language = match self.state {
            GenerationState::AwaitingResponse {
                id: current,
                language,
            } if current == id => language,
            _ => {
                tracing::debug!(id = %id, "Dropping stale generation result");
                return false;
            }
        };

        let entry = match result {
            Ok(text) => TranscriptEntry::assistant_with_code(
                CONFIRMATION_MESSAGE,
                language,
                &strip_code_fence(&text),
            ),
            Err(err) => {
                tracing::error!(id = %id, error = %err, "Generation failed");
                TranscriptEntry::assistant_error(&err.user_message())
            }
        };

        self.finish(entry);
        return true;
    }

    /// Abandons the generation in flight so its result will be ignored.
    pub fn invalidate(&mut self) -> Option<GenerationId> {
        if let GenerationState::AwaitingResponse { id, .. } = self.state {
            self.finish(TranscriptEntry::assistant(CANCELLED_MESSAGE));
            return Some(id);
        }

        return None;
    }

    /// Submits and drives the generation to completion against `backend`.
    /// Returns the assistant reply, or None if the submission was rejected.
    pub async fn run(
        &mut self,
        backend: &(dyn Backend + Send + Sync),
        prompt: &str,
        language: Language,
        credential: &Credential,
    ) -> Option<&TranscriptEntry> {
        match self.submit(prompt, language, credential) {
            Submission::Rejected => return None,
            Submission::Answered => return self.transcript.last(),
            Submission::Dispatched(ticket) => {
                let result = backend.generate(ticket.request, &ticket.credential).await;
                self.complete(ticket.id, result);
                return self.transcript.last();
            }
        }
    }

    fn finish(&mut self, entry: TranscriptEntry) {
        self.transcript.push(entry);
        self.state = GenerationState::Idle;
    }
}
