use super::ValidationError;
use crate::llm::LlmError;
use crate::recovery::RecoveryError;
use thiserror::Error;

/// Why an analysis run produced no result.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Completion request failed: {0}")]
    Completion(#[from] LlmError),

    #[error("{0}")]
    Format(#[from] RecoveryError),

    #[error("Model reply hit the token limit and was cut off: {0}")]
    Truncated(#[source] RecoveryError),

    #[error("{0}")]
    Incomplete(#[from] ValidationError),

    #[error("Failed to encode recommendations: {0}")]
    Recommendations(#[source] serde_json::Error),
}

impl AnalysisError {
    /// Label used for the outcome metric.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Completion(_) => "completion_error",
            AnalysisError::Format(_) => "format_error",
            AnalysisError::Truncated(_) => "truncated",
            AnalysisError::Incomplete(_) => "incomplete",
            AnalysisError::Recommendations(_) => "recommendations_error",
        }
    }

    /// The model reply that could not be recovered, if that is what failed.
    pub fn raw_reply(&self) -> Option<&str> {
        match self {
            AnalysisError::Format(err) | AnalysisError::Truncated(err) => Some(err.raw()),
            _ => None,
        }
    }
}
