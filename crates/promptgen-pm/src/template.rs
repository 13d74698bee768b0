//! Template engine implementation using Minijinja.
//!
//! Stored templates use a single placeholder, `<input>`. Before rendering,
//! the placeholder is rewritten into a Minijinja variable and the template is
//! parsed, so malformed syntax is reported instead of leaking into the
//! output. The input is bound as a value and is never itself expanded.
//!
//! Only `{{ ... }}` is live syntax. Block and comment tags are moved onto
//! private-use delimiters, so `{% ... %}`, `{# ... #}` and shell text such as
//! `${#arr[@]}` render verbatim.

use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior, context};
use promptgen_core::Template;

use crate::error::{PromptError, Result};

/// Placeholder token replaced by the resolved input.
pub const PLACEHOLDER: &str = "<input>";

/// Minijinja expression the placeholder is rewritten to.
const INPUT_EXPR: &str = "{{ input }}";

/// Block tag delimiters. U+E000 is a private-use code point.
const BLOCK_DELIMITERS: (&str, &str) = ("\u{E000}%", "%\u{E000}");

/// Comment delimiters.
const COMMENT_DELIMITERS: (&str, &str) = ("\u{E000}#", "#\u{E000}");

/// Template engine for rendering prompts.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    /// Minijinja environment.
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Render`] if the template syntax cannot be
    /// configured.
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_syntax(prompt_syntax().map_err(classify)?);
        env.set_keep_trailing_newline(true);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        Ok(Self { env })
    }

    /// Rewrite every placeholder into the Minijinja input expression.
    #[must_use]
    pub fn normalize(content: &str) -> String {
        content.replace(PLACEHOLDER, INPUT_EXPR)
    }

    /// Parse a template and register it under its name, replacing any
    /// previously loaded template of that name.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::TemplateSyntax`] if the content does not parse.
    pub fn load(&mut self, template: &Template) -> Result<()> {
        self.env
            .add_template_owned(template.name.clone(), Self::normalize(&template.content))
            .map_err(classify)
    }

    /// Render a loaded template with `input` substituted for the placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::TemplateSyntax`] if the template references
    /// anything other than the placeholder, or [`PromptError::Render`] if it
    /// was never loaded or fails to render.
    pub fn render(&self, name: &str, input: &str) -> Result<String> {
        self.env
            .get_template(name)
            .map_err(classify)?
            .render(context! { input => input })
            .map_err(classify)
    }

    /// Load a template and render it once with empty input, surfacing any
    /// problem that would make generation fail.
    ///
    /// # Errors
    ///
    /// Same as [`TemplateEngine::load`] and [`TemplateEngine::render`].
    pub fn check(&mut self, template: &Template) -> Result<()> {
        self.load(template)?;
        self.render(&template.name, "").map(|_| ())
    }
}

/// Syntax with `{{ }}` as the only delimiters prompt text can hit.
fn prompt_syntax() -> std::result::Result<SyntaxConfig, minijinja::Error> {
    SyntaxConfig::builder()
        .block_delimiters(BLOCK_DELIMITERS.0, BLOCK_DELIMITERS.1)
        .variable_delimiters("{{", "}}")
        .comment_delimiters(COMMENT_DELIMITERS.0, COMMENT_DELIMITERS.1)
        .build()
}

/// Sort Minijinja errors into syntax problems and other render failures.
fn classify(e: minijinja::Error) -> PromptError {
    match e.kind() {
        ErrorKind::SyntaxError
        | ErrorKind::UndefinedError
        | ErrorKind::UnknownFilter
        | ErrorKind::UnknownTest
        | ErrorKind::UnknownFunction => PromptError::TemplateSyntax(e.to_string()),
        _ => PromptError::Render(e.to_string()),
    }
}
