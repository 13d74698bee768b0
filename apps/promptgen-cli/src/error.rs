//! Error types for promptgen CLI.

use thiserror::Error;

/// Result type alias for promptgen CLI.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Debug, Error)]
pub enum CliError {
    /// Error from the template store.
    #[error(transparent)]
    Store(#[from] promptgen_core::StoreError),

    /// Error from prompt generation.
    #[error(transparent)]
    Prompt(#[from] promptgen_pm::PromptError),

    /// The editor could not produce template content.
    #[error("Editor failed")]
    Editor(#[source] promptgen_pm::CapabilityError),

    /// Error from IO operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
