#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::Credential;
use crate::domain::models::GenerationError;
use crate::domain::models::GenerationRequest;
use crate::domain::models::GenerationResult;

const OFFICIAL_URL: &str = "https://api.openai.com";
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 1500;

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct MessageRequest {
    role: String,
    content: String,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<MessageRequest>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionChoiceResponse {
    message: CompletionMessageResponse,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorDetailResponse {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    error: ErrorDetailResponse,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoiceResponse>,
    #[serde(default)]
    error: Option<ErrorDetailResponse>,
}

fn error_message(body: &str) -> Option<String> {
    return serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|res| return res.error.message)
        .filter(|message| return !message.trim().is_empty());
}

fn transport_error(err: reqwest::Error) -> GenerationError {
    tracing::error!(error = ?err, "OpenAI is not reachable");

    let message = err.to_string();
    if message.trim().is_empty() {
        return GenerationError::Transport(None);
    }

    return GenerationError::Transport(Some(message));
}

pub struct OpenAI {
    url: String,
    model: String,
    timeout: Duration,
    health_check_timeout: Duration,
}

impl OpenAI {
    pub fn new(
        url: &str,
        model: &str,
        timeout: Duration,
        health_check_timeout: Duration,
    ) -> OpenAI {
        return OpenAI {
            url: url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout,
            health_check_timeout,
        };
    }

    pub fn from_config() -> Result<OpenAI> {
        let timeout = Config::get(ConfigKey::RequestTimeout).parse::<u64>()?;
        let health_check_timeout =
            Config::get(ConfigKey::BackendHealthCheckTimeout).parse::<u64>()?;

        return Ok(OpenAI::new(
            &Config::get(ConfigKey::OpenAiURL),
            &Config::get(ConfigKey::Model),
            Duration::from_millis(timeout),
            Duration::from_millis(health_check_timeout),
        ));
    }

    fn completion_request(&self, request: &GenerationRequest) -> CompletionRequest {
        return CompletionRequest {
            model: self.model.to_string(),
            messages: vec![
                MessageRequest {
                    role: "system".to_string(),
                    content: request.system_prompt(),
                },
                MessageRequest {
                    role: "user".to_string(),
                    content: request.prompt.to_string(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
    }
}

#[async_trait]
impl Backend for OpenAI {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("OpenAI URL is not defined");
        }

        // The official API answers its index with a 404 or a 418, so there is
        // nothing useful to probe.
        if self.url == OFFICIAL_URL {
            return Ok(());
        }

        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(self.health_check_timeout)
            .send()
            .await;

        let status = match res {
            Ok(res) => res.status().as_u16(),
            Err(err) => {
                tracing::error!(error = ?err, "OpenAI is not reachable");
                bail!("OpenAI is not reachable");
            }
        };
        if status >= 500 {
            tracing::error!(status = status, "OpenAI health check failed");
            bail!("OpenAI health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn generate(
        &self,
        request: GenerationRequest,
        credential: &Credential,
    ) -> GenerationResult {
        let req = self.completion_request(&request);

        let res = reqwest::Client::new()
            .post(format!("{url}/v1/chat/completions", url = self.url))
            .header("Authorization", format!("Bearer {}", credential.expose()))
            .timeout(self.timeout)
            .json(&req)
            .send()
            .await
            .map_err(transport_error)?;

        let status = res.status();
        let body = res.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = error_message(&body);
            tracing::error!(
                status = status.as_u16(),
                message = ?message,
                "Failed to make completion request to OpenAI"
            );
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let ores: CompletionResponse = serde_json::from_str(&body).map_err(|err| {
            tracing::error!(error = ?err, "Completion response could not be parsed");
            return GenerationError::MalformedResponse(err.to_string());
        })?;
        tracing::debug!(body = ?ores, "Completion response");

        if let Some(err) = ores.error {
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message: err.message.filter(|message| return !message.trim().is_empty()),
            });
        }

        let text = ores
            .choices
            .into_iter()
            .next()
            .and_then(|choice| return choice.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::MalformedResponse(
                "completion contained no text".to_string(),
            ));
        }

        return Ok(text);
    }
}
