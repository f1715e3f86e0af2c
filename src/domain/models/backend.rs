#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use super::Credential;
use super::Language;

const GENERIC_FAILURE: &str = "Code generation failed. Please try again.";
const GENERIC_CONNECTIVITY: &str =
    "Could not reach the code generation service. Check your connection and try again.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub language: Language,
}

impl GenerationRequest {
    pub fn new(prompt: &str, language: Language) -> GenerationRequest {
        return GenerationRequest {
            prompt: prompt.to_string(),
            language,
        };
    }

    /// Instructions sent ahead of the user's prompt. Asks for bare code in the
    /// target language.
    pub fn system_prompt(&self) -> String {
        let lang = self.language.to_string().to_uppercase();

        return format!(
            "You are an expert {lang} developer.\nGenerate clean, working, well-commented {lang} code based on user requests.\nOnly return the code, no explanations or markdown formatting.\nMake sure the code is syntactically correct and follows best practices."
        );
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("API responded with status {status}: {}", .message.as_deref().unwrap_or("no error message"))]
    Api { status: u16, message: Option<String> },

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("transport failure: {}", .0.as_deref().unwrap_or("no details"))]
    Transport(Option<String>),
}

impl GenerationError {
    /// Text shown to the user in the transcript.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::Api {
                message: Some(message),
                ..
            } => return format!("OpenAI API error: {message}"),
            GenerationError::Api { message: None, .. } => return GENERIC_FAILURE.to_string(),
            GenerationError::MalformedResponse(_) => return GENERIC_FAILURE.to_string(),
            GenerationError::Transport(Some(message)) => {
                return format!("Network error: {message}");
            }
            GenerationError::Transport(None) => return GENERIC_CONNECTIVITY.to_string(),
        }
    }
}

pub type GenerationResult = std::result::Result<String, GenerationError>;

#[async_trait]
pub trait Backend {
    /// Used at startup to verify the backend is configured and reachable.
    async fn health_check(&self) -> Result<()>;

    /// Issues exactly one completion request and returns the raw generated
    /// text. No retries are performed.
    async fn generate(
        &self,
        request: GenerationRequest,
        credential: &Credential,
    ) -> GenerationResult;
}

pub type SharedBackend = Arc<dyn Backend + Send + Sync>;
