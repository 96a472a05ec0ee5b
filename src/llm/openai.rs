//! Chat completions client for OpenAI and API-compatible services.

use super::provider::{CompletionOptions, LlmError, LlmProvider};
use super::types::{Completion, Prompt};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

const KEY_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the bearer key for the completion API comes from.
#[derive(Debug, Clone)]
pub enum ApiKeySource {
    None,
    Static(String),
    /// Shell command printing the key, run before every request so rotated
    /// keys are picked up.
    Command(String),
}

impl ApiKeySource {
    async fn resolve(&self) -> Result<Option<String>, LlmError> {
        match self {
            ApiKeySource::None => Ok(None),
            ApiKeySource::Static(key) => Ok(Some(key.clone())),
            ApiKeySource::Command(command) => run_key_command(command).await.map(Some),
        }
    }
}

async fn run_key_command(command: &str) -> Result<String, LlmError> {
    debug!(command, "Running API key command");
    let output = tokio::time::timeout(
        KEY_COMMAND_TIMEOUT,
        Command::new("sh").arg("-c").arg(command).output(),
    )
    .await
    .map_err(|_| {
        LlmError::KeyCommand(format!(
            "timed out after {}s",
            KEY_COMMAND_TIMEOUT.as_secs()
        ))
    })?
    .map_err(|e| LlmError::KeyCommand(e.to_string()))?;

    if !output.status.success() {
        return Err(LlmError::KeyCommand(format!(
            "exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let key = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if key.is_empty() {
        return Err(LlmError::KeyCommand("printed no key".to_string()));
    }
    Ok(key)
}

pub struct OpenAIProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: ApiKeySource,
}

impl OpenAIProvider {
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: ApiKeySource,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, LlmError> {
        Ok(match self.api_key.resolve().await? {
            Some(key) => request.bearer_auth(key),
            None => request,
        })
    }
}

fn send_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Connection(e.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, LlmError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmError::RateLimited);
    }
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(LlmError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        prompt: &Prompt,
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        let body = ChatRequest::new(&self.model, prompt, options);
        debug!(
            model = %self.model,
            prompt_chars = prompt.text.chars().count(),
            "Requesting chat completion"
        );

        let request = self
            .authorized(self.client.post(self.url("chat/completions")))
            .await?;
        let response = request
            .json(&body)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(send_error)?;

        let reply: ChatResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Unreadable completion body: {}", e)))?;

        reply.into_completion()
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        let request = self
            .authorized(self.client.get(self.url("models")))
            .await?;
        let response = request
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
            .map_err(send_error)?;
        check_status(response).await.map(|_| ())
    }
}

// Wire format

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, prompt: &'a Prompt, options: &CompletionOptions) -> Self {
        Self {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.instructions,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.text,
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: options.json_response.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

impl ChatResponse {
    fn into_completion(self) -> Result<Completion, LlmError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("Completion has no choices".to_string()))?;

        let finish_reason = choice.finish_reason.as_deref();
        if finish_reason == Some("content_filter") {
            return Err(LlmError::ContentFiltered);
        }

        let text = choice
            .message
            .content
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("Completion is empty".to_string()))?;

        Ok(Completion {
            text,
            truncated: finish_reason == Some("length"),
            total_tokens: self.usage.map(|u| u.total_tokens),
        })
    }
}
