//! Command handlers for promptgen CLI.

use std::io::{self, Read};

use clap::CommandFactory;
use promptgen_core::{HistoryEntry, Reconciliation, Saved, StoreError, validate_name};
use promptgen_pm::{Clipboard, Editor, InputOrigin, InputRequest, PromptGenerator};
use tracing::{debug, info, instrument};

use crate::cli::{
    Args, CompletionArgs, ContentArgs, GenerateArgs, HistoryArgs, NameArgs, RepairArgs, ViewArgs,
};
use crate::clipboard::SystemClipboard;
use crate::config::ConfigManager;
use crate::editor::ExternalEditor;
use crate::error::{CliError, Result as CliResult};
use crate::output::OutputFormatter;

/// Create a new template.
///
/// # Errors
///
/// Returns an error if the name is invalid or taken, or the content cannot
/// be read or stored.
#[instrument(skip_all, fields(name = %args.name))]
pub fn add(config: &ConfigManager, args: ContentArgs, out: &OutputFormatter) -> CliResult<()> {
    let manager = config.manager();

    // Fail before asking for content
    validate_name(&args.name)?;
    if manager.exists(&args.name) {
        return Err(StoreError::AlreadyExists(args.name).into());
    }

    let content = read_content(config, args.content, args.edit, "", out)?;
    let saved = manager.create(&args.name, &content)?;
    report_saved(&saved, out);
    out.success(&format!("Template '{}' saved with version 1.", args.name));
    Ok(())
}

/// Save a new version of an existing template.
///
/// # Errors
///
/// Returns an error if the template does not exist, or the content cannot be
/// read or stored.
#[instrument(skip_all, fields(name = %args.name))]
pub fn update(config: &ConfigManager, args: ContentArgs, out: &OutputFormatter) -> CliResult<()> {
    let manager = config.manager();
    let current = manager.get(&args.name)?;

    let content = read_content(config, args.content, args.edit, &current.content, out)?;
    let saved = manager.update(&args.name, &content)?;
    report_saved(&saved, out);
    out.success(&format!(
        "Template '{}' updated to version {}.",
        args.name, saved.template.version
    ));
    Ok(())
}

/// Delete a template and every version of it.
///
/// # Errors
///
/// Returns an error if the template does not exist.
#[instrument(skip_all, fields(name = %args.name))]
pub fn delete(config: &ConfigManager, args: NameArgs, out: &OutputFormatter) -> CliResult<()> {
    let report = config.manager().delete(&args.name)?;
    out.deletion(&args.name, &report);
    Ok(())
}

/// List every template.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn list(config: &ConfigManager, out: &OutputFormatter) -> CliResult<()> {
    let templates = config.manager().list_all()?;
    out.template_list(&templates);
    Ok(())
}

/// Show the latest content of a template.
///
/// # Errors
///
/// Returns an error if the template does not exist.
pub fn review(config: &ConfigManager, args: NameArgs, out: &OutputFormatter) -> CliResult<()> {
    let template = config.manager().get(&args.name)?;
    out.template(
        &format!(
            "Template '{}' (version {}) content:",
            template.name, template.version
        ),
        &template,
    );
    Ok(())
}

/// List the versions of a template.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn versions(config: &ConfigManager, args: NameArgs, out: &OutputFormatter) -> CliResult<()> {
    let versions = config.manager().list_versions(&args.name)?;
    out.version_list(&args.name, &versions);
    Ok(())
}

/// Show one version of a template.
///
/// # Errors
///
/// Returns an error if that version does not exist.
pub fn view(config: &ConfigManager, args: ViewArgs, out: &OutputFormatter) -> CliResult<()> {
    let template = config.manager().get_version(&args.name, args.version)?;
    out.template(
        &format!(
            "Template '{}' version {} content:",
            template.name, template.version
        ),
        &template,
    );
    Ok(())
}

/// Generate a prompt, print it, copy it and record it.
///
/// Clipboard and history failures after rendering are only warnings; the
/// prompt has already been printed.
///
/// # Errors
///
/// Returns an error if the template cannot be loaded or rendered, or no input
/// is available.
#[instrument(skip_all, fields(name = %args.name))]
pub fn generate(config: &ConfigManager, args: GenerateArgs, out: &OutputFormatter) -> CliResult<()> {
    let template = config.manager().get(&args.name)?;

    let request = match (args.input, args.clip) {
        (Some(text), _) => InputRequest::Inline(text),
        (None, true) => InputRequest::Clipboard,
        (None, false) => InputRequest::Interactive,
    };

    let mut clipboard = SystemClipboard::new();
    let mut editor = ExternalEditor::new(config.editor_command());
    let prompt = PromptGenerator::new()?.generate(&template, &request, &mut clipboard, &mut editor)?;

    if prompt.origin != InputOrigin::Inline {
        out.info(&format!("Using input from {}", prompt.origin.describe()));
    }
    out.prompt(prompt.version, &prompt.text);

    let settings = &config.config().generate;
    if settings.copy_to_clipboard && !args.no_copy {
        match clipboard.write(&prompt.text) {
            Ok(()) => out.success("Prompt copied to clipboard!"),
            Err(e) => out.warning(&format!("Failed to copy to clipboard: {e}")),
        }
    }

    if settings.record_history {
        let entry = HistoryEntry::now(&prompt.name, prompt.version);
        if let Err(e) = config.history().append(&entry) {
            out.warning(&format!("Failed to record history: {e}"));
        }
    }

    info!(version = prompt.version, "Generated prompt");
    Ok(())
}

/// Show generation history.
///
/// # Errors
///
/// Returns an error if the history log cannot be read.
pub fn history(config: &ConfigManager, args: HistoryArgs, out: &OutputFormatter) -> CliResult<()> {
    let entries = config.history().recent(args.name.as_deref(), args.limit)?;
    out.history(&entries);
    Ok(())
}

/// Rebuild stale latest pointers from the version records.
///
/// # Errors
///
/// Returns an error if a named template does not exist or a pointer cannot be
/// rewritten.
#[instrument(skip_all)]
pub fn repair(config: &ConfigManager, args: RepairArgs, out: &OutputFormatter) -> CliResult<()> {
    let manager = config.manager();
    let names = match args.name {
        Some(name) => vec![name],
        None => manager.names()?,
    };

    if names.is_empty() {
        out.info("No templates found.");
        return Ok(());
    }

    for name in names {
        match manager.reconcile(&name)? {
            Reconciliation::Consistent { version } => {
                out.info(&format!("Template '{name}' is consistent at version {version}."));
            }
            Reconciliation::Repaired { from: Some(from), to } => {
                out.success(&format!(
                    "Template '{name}' repaired: latest pointer moved from version {from} to {to}."
                ));
            }
            Reconciliation::Repaired { from: None, to } => {
                out.success(&format!(
                    "Template '{name}' repaired: latest pointer rebuilt at version {to}."
                ));
            }
        }
    }
    Ok(())
}

/// Print a shell completion script to stdout.
pub fn completion(args: CompletionArgs) {
    let mut command = Args::command();
    let bin = command.get_name().to_string();
    clap_complete::generate(args.shell, &mut command, bin, &mut io::stdout());
}

/// Template content from `--content`, the editor, or stdin.
fn read_content(
    config: &ConfigManager,
    content: Option<String>,
    edit: bool,
    seed: &str,
    out: &OutputFormatter,
) -> CliResult<String> {
    if let Some(content) = content {
        return Ok(content);
    }

    if edit {
        debug!("Reading template content from editor");
        return ExternalEditor::new(config.editor_command())
            .edit(seed)
            .map_err(CliError::Editor);
    }

    if atty::is(atty::Stream::Stdin) {
        out.info("Enter template content (end with EOF/Ctrl+D):");
    }
    let mut content = String::new();
    io::stdin().read_to_string(&mut content)?;
    Ok(content)
}

/// Warn about anything that went wrong after a version was stored.
fn report_saved(saved: &Saved, out: &OutputFormatter) {
    if let Some(e) = &saved.pointer_error {
        out.warning(&format!(
            "Version {} saved but the latest pointer could not be updated: {e}",
            saved.template.version
        ));
    }

    if let Err(e) = PromptGenerator::new().and_then(|mut g| g.check(&saved.template)) {
        out.warning(&format!("Template will not render as stored: {e}"));
    }
}
