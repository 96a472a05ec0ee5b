use super::types::{Completion, Prompt};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Sampling and transport settings for one completion.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Ask the backend to constrain the reply to a JSON object.
    pub json_response: bool,
    pub timeout: Duration,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: Some(800),
            json_response: true,
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,

    #[error("Reply withheld by the backend content filter")]
    ContentFiltered,

    #[error("API key command failed: {0}")]
    KeyCommand(String),
}

/// A completion backend able to answer a [`Prompt`] in one round trip.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short backend name reported by `/health`.
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    async fn complete(
        &self,
        prompt: &Prompt,
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError>;

    /// Cheap reachability check, used once at startup.
    async fn health_check(&self) -> Result<(), LlmError>;
}
