//! promptgen prompt manager - prompt generation using Minijinja.
//!
//! This crate resolves the input for a generation (inline text, clipboard,
//! or an editor with clipboard fallback) and substitutes it into a stored
//! template through the Minijinja templating engine.

#![warn(rust_2024_compatibility, missing_docs, missing_debug_implementations)]

pub mod error;
pub mod input;
pub mod prompt;
pub mod template;

pub use error::{CapabilityError, PromptError, Result};
pub use input::{Clipboard, Editor, InputOrigin, InputRequest, InputSource, ResolvedInput};
pub use prompt::{GeneratedPrompt, PromptGenerator};
pub use template::{PLACEHOLDER, TemplateEngine};

/// Re-export common types for convenience.
pub mod prelude {
    pub use crate::{
        Clipboard, Editor, GeneratedPrompt, InputRequest, PromptError, PromptGenerator, Result,
        TemplateEngine,
    };
}
