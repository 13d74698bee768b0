//! Input resolution for prompt generation.
//!
//! The text substituted into a template comes from exactly one of: an inline
//! argument, the clipboard, or an interactive chain that opens an editor and
//! falls back to the clipboard. Clipboard and editor access go through the
//! [`Clipboard`] and [`Editor`] capabilities so callers decide how they are
//! implemented.

use std::fmt;

use tracing::{debug, instrument};

use crate::error::{CapabilityError, PromptError, Result};

/// Read/write access to the system clipboard.
pub trait Clipboard {
    /// Current clipboard text.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard cannot be read.
    fn read(&mut self) -> std::result::Result<String, CapabilityError>;

    /// Replace the clipboard text.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard cannot be written.
    fn write(&mut self, text: &str) -> std::result::Result<(), CapabilityError>;
}

/// Collects text by letting the user edit a scratch buffer.
pub trait Editor {
    /// Open an editor seeded with `seed` and return the final text.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor cannot be run or exits unsuccessfully.
    fn edit(&mut self, seed: &str) -> std::result::Result<String, CapabilityError>;
}

/// Where the caller asked input to come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputRequest {
    /// Text given on the command line, used verbatim.
    Inline(String),
    /// Read the clipboard.
    Clipboard,
    /// Open the editor, falling back to the clipboard.
    Interactive,
}

/// A single strategy in an input fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// The external editor.
    Editor,
    /// The clipboard.
    Clipboard,
}

impl InputSource {
    fn fetch<C, E>(self, clipboard: &mut C, editor: &mut E) -> std::result::Result<String, CapabilityError>
    where
        C: Clipboard + ?Sized,
        E: Editor + ?Sized,
    {
        match self {
            Self::Editor => editor.edit(""),
            Self::Clipboard => clipboard.read(),
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Editor => f.write_str("editor"),
            Self::Clipboard => f.write_str("clipboard"),
        }
    }
}

/// Strategies tried, in order, for [`InputRequest::Interactive`].
pub const INTERACTIVE_CHAIN: &[InputSource] = &[InputSource::Editor, InputSource::Clipboard];

/// Where resolved input actually came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOrigin {
    /// Inline argument.
    Inline,
    /// Clipboard, as requested.
    Clipboard,
    /// Editor.
    Editor,
    /// Clipboard, after an earlier strategy produced nothing.
    ClipboardFallback,
}

impl InputOrigin {
    /// Short description for status messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Inline => "inline argument",
            Self::Clipboard => "clipboard",
            Self::Editor => "editor",
            Self::ClipboardFallback => "clipboard as fallback",
        }
    }
}

/// Input text together with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    /// The text to substitute.
    pub text: String,
    /// Where it came from.
    pub origin: InputOrigin,
}

/// Resolve the input for one generation.
///
/// # Errors
///
/// Returns [`PromptError::ClipboardUnavailable`] if clipboard input was
/// requested and the clipboard cannot be read, or
/// [`PromptError::InputUnavailable`] if no interactive strategy produced
/// non-blank text.
#[instrument(skip_all)]
pub fn resolve_input<C, E>(
    request: &InputRequest,
    clipboard: &mut C,
    editor: &mut E,
) -> Result<ResolvedInput>
where
    C: Clipboard + ?Sized,
    E: Editor + ?Sized,
{
    match request {
        InputRequest::Inline(text) => Ok(ResolvedInput {
            text: text.clone(),
            origin: InputOrigin::Inline,
        }),
        InputRequest::Clipboard => clipboard
            .read()
            .map(|text| ResolvedInput {
                text,
                origin: InputOrigin::Clipboard,
            })
            .map_err(|e| PromptError::ClipboardUnavailable(e.to_string())),
        InputRequest::Interactive => resolve_chain(INTERACTIVE_CHAIN, clipboard, editor),
    }
}

/// Try each strategy until one yields non-blank text.
fn resolve_chain<C, E>(
    chain: &[InputSource],
    clipboard: &mut C,
    editor: &mut E,
) -> Result<ResolvedInput>
where
    C: Clipboard + ?Sized,
    E: Editor + ?Sized,
{
    let mut failures = Vec::with_capacity(chain.len());

    for (position, source) in chain.iter().copied().enumerate() {
        match source.fetch(clipboard, editor) {
            Ok(text) if !text.trim().is_empty() => {
                let origin = match (source, position) {
                    (InputSource::Editor, _) => InputOrigin::Editor,
                    (InputSource::Clipboard, 0) => InputOrigin::Clipboard,
                    (InputSource::Clipboard, _) => InputOrigin::ClipboardFallback,
                };
                debug!(%source, "Resolved input");
                return Ok(ResolvedInput { text, origin });
            }
            Ok(_) => {
                debug!(%source, "Input source returned no text");
                failures.push(format!("{source} returned no text"));
            }
            Err(e) => {
                debug!(%source, error = %e, "Input source failed");
                failures.push(format!("{source} failed: {e}"));
            }
        }
    }

    Err(PromptError::InputUnavailable(failures.join("; ")))
}
