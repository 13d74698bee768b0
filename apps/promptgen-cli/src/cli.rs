//! CLI argument parsing for promptgen.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// promptgen - versioned prompt templates
///
/// Stores named templates containing an `<input>` placeholder, keeps every
/// revision, and renders prompts from inline text, the clipboard, or an
/// editor.
#[derive(Parser, Debug)]
#[command(name = "promptgen", author, version, about)]
pub struct Args {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// promptgen home directory (defaults to ~/.promptgen).
    #[arg(long, global = true, env = "PROMPTGEN_HOME")]
    pub home: Option<PathBuf>,

    /// Verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new template.
    Add(ContentArgs),

    /// List templates with their latest version.
    List,

    /// Delete a template and all of its versions.
    Delete(NameArgs),

    /// Save a new version of an existing template.
    Update(ContentArgs),

    /// Generate a prompt from a template.
    Generate(GenerateArgs),

    /// Show the latest content of a template.
    Review(NameArgs),

    /// List the stored versions of a template.
    Versions(NameArgs),

    /// Show a specific version of a template.
    View(ViewArgs),

    /// Show prompt generation history.
    History(HistoryArgs),

    /// Point templates back at their newest stored version.
    Repair(RepairArgs),

    /// Print a shell completion script.
    Completion(CompletionArgs),
}

/// Arguments naming a single template.
#[derive(Debug, clap::Args)]
pub struct NameArgs {
    /// Template name.
    pub name: String,
}

/// Arguments for commands that write template content.
#[derive(Debug, clap::Args)]
pub struct ContentArgs {
    /// Template name.
    pub name: String,

    /// Template content. Read from stdin when neither this nor --edit is given.
    #[arg(short, long, conflicts_with = "edit")]
    pub content: Option<String>,

    /// Write the content in the configured editor.
    #[arg(short, long)]
    pub edit: bool,
}

/// Arguments for the generate subcommand.
#[derive(Debug, clap::Args)]
pub struct GenerateArgs {
    /// Template name.
    pub name: String,

    /// Input text. Without it the editor opens, falling back to the clipboard.
    #[arg(conflicts_with = "clip")]
    pub input: Option<String>,

    /// Use the clipboard contents as input.
    #[arg(long)]
    pub clip: bool,

    /// Do not copy the generated prompt to the clipboard.
    #[arg(long)]
    pub no_copy: bool,
}

/// Arguments for the view subcommand.
#[derive(Debug, clap::Args)]
pub struct ViewArgs {
    /// Template name.
    pub name: String,

    /// Version number.
    pub version: u32,
}

/// Arguments for the history subcommand.
#[derive(Debug, clap::Args)]
pub struct HistoryArgs {
    /// Only show generations of this template.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Only show the most recent N entries.
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for the repair subcommand.
#[derive(Debug, clap::Args)]
pub struct RepairArgs {
    /// Template to repair. Repairs every template when omitted.
    pub name: Option<String>,
}

/// Arguments for the completion subcommand.
#[derive(Debug, clap::Args)]
pub struct CompletionArgs {
    /// Target shell.
    #[arg(value_enum)]
    pub shell: Shell,
}
