//! Error types for promptgen prompt generation.

use thiserror::Error;

/// Result type alias for prompt generation.
pub type Result<T> = std::result::Result<T, PromptError>;

/// Prompt generation error types.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Template contains syntax other than the placeholder, or malformed
    /// syntax.
    #[error("Template syntax error: {0}")]
    TemplateSyntax(String),

    /// Rendering failed for another reason.
    #[error("Template error: {0}")]
    Render(String),

    /// Every input source was tried and none produced text.
    #[error("No input available: {0}")]
    InputUnavailable(String),

    /// Clipboard input was requested but the clipboard cannot be read.
    #[error("Clipboard unavailable: {0}")]
    ClipboardUnavailable(String),
}

/// Failure reported by a clipboard or editor capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct CapabilityError(pub String);

impl CapabilityError {
    /// Create a capability error from any message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<std::io::Error> for CapabilityError {
    fn from(e: std::io::Error) -> Self {
        Self(e.to_string())
    }
}
