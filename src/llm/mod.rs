//! Completion backend access.
//!
//! The analysis pipeline sends one [`Prompt`] per request through the
//! [`LlmProvider`] trait. [`OpenAIProvider`] covers OpenAI and every service
//! implementing its chat completions API.

mod openai;
mod provider;
mod types;

pub use openai::{ApiKeySource, OpenAIProvider};
pub use provider::{CompletionOptions, LlmError, LlmProvider};
pub use types::{Completion, Prompt};
