//! Request and reply shapes for single-turn completions.

/// Standing instructions plus the text the model should answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub instructions: String,
    pub text: String,
}

impl Prompt {
    pub fn new(instructions: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            text: text.into(),
        }
    }
}

/// What the backend answered.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    /// Generation stopped at the token limit, so `text` is probably cut off
    /// in the middle of the JSON object.
    pub truncated: bool,
    /// Prompt plus completion tokens, when the backend reports them.
    pub total_tokens: Option<u32>,
}
