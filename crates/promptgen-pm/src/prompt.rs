//! Prompt generator tying input resolution to template rendering.

use promptgen_core::Template;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::input::{Clipboard, Editor, InputOrigin, InputRequest, resolve_input};
use crate::template::TemplateEngine;

/// A rendered prompt ready to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPrompt {
    /// Template name.
    pub name: String,
    /// Template version the prompt was rendered from.
    pub version: u32,
    /// Rendered text.
    pub text: String,
    /// Where the substituted input came from.
    pub origin: InputOrigin,
}

/// Generates prompts from stored templates.
#[derive(Debug)]
pub struct PromptGenerator {
    /// Template engine.
    engine: TemplateEngine,
}

impl PromptGenerator {
    /// Create a new prompt generator.
    ///
    /// # Errors
    ///
    /// Returns an error if the template engine cannot be configured.
    pub fn new() -> Result<Self> {
        Ok(Self {
            engine: TemplateEngine::new()?,
        })
    }

    /// Validate a template without resolving any input.
    ///
    /// # Errors
    ///
    /// Returns an error if the template would fail to render.
    pub fn check(&mut self, template: &Template) -> Result<()> {
        self.engine.check(template)
    }

    /// Render a template with known input.
    ///
    /// # Errors
    ///
    /// Returns an error if the template does not parse or render.
    pub fn render(&mut self, template: &Template, input: &str) -> Result<String> {
        self.engine.load(template)?;
        self.engine.render(&template.name, input)
    }

    /// Generate a prompt: parse the template, resolve input, substitute.
    ///
    /// The template is parsed before any input source is consulted, so a
    /// broken template fails before the user is asked to type anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is malformed or no input can be
    /// resolved.
    #[instrument(skip_all, fields(name = %template.name, version = template.version))]
    pub fn generate<C, E>(
        &mut self,
        template: &Template,
        request: &InputRequest,
        clipboard: &mut C,
        editor: &mut E,
    ) -> Result<GeneratedPrompt>
    where
        C: Clipboard + ?Sized,
        E: Editor + ?Sized,
    {
        self.engine.load(template)?;
        let input = resolve_input(request, clipboard, editor)?;
        let text = self.engine.render(&template.name, &input.text)?;

        debug!(origin = input.origin.describe(), "Generated prompt");
        Ok(GeneratedPrompt {
            name: template.name.clone(),
            version: template.version,
            text,
            origin: input.origin,
        })
    }
}
