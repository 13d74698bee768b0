//! promptgen CLI - Command line interface for promptgen.
//!
//! This crate provides a CLI for managing versioned prompt templates and
//! generating prompts from them.

use anyhow::Result;
use clap::Parser;
use promptgen_core::config::LoggingConfig;
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

mod cli;
mod clipboard;
mod config;
mod editor;
mod error;
mod output;
mod run;

use cli::{Args, Command};
use config::ConfigManager;
use output::OutputFormatter;

fn main() -> Result<()> {
    let args = Args::parse();

    // Completion scripts need neither configuration nor logging
    if let Command::Completion(completion_args) = args.command {
        run::completion(completion_args);
        return Ok(());
    }

    let config = ConfigManager::load(args.home.clone())?;
    init_tracing(args.verbose, &config.config().logging)?;

    debug!("promptgen starting with command: {:?}", args.command);
    debug!("Home directory: {}", config.home().display());

    let out = OutputFormatter::new();
    match args.command {
        Command::Add(add_args) => run::add(&config, add_args, &out)?,
        Command::List => run::list(&config, &out)?,
        Command::Delete(name_args) => run::delete(&config, name_args, &out)?,
        Command::Update(update_args) => run::update(&config, update_args, &out)?,
        Command::Generate(generate_args) => run::generate(&config, generate_args, &out)?,
        Command::Review(name_args) => run::review(&config, name_args, &out)?,
        Command::Versions(name_args) => run::versions(&config, name_args, &out)?,
        Command::View(view_args) => run::view(&config, view_args, &out)?,
        Command::History(history_args) => run::history(&config, history_args, &out)?,
        Command::Repair(repair_args) => run::repair(&config, repair_args, &out)?,
        Command::Completion(completion_args) => run::completion(completion_args),
    }

    debug!("promptgen completed successfully");
    Ok(())
}

/// Initialize tracing subscriber on stderr.
fn init_tracing(verbose: bool, logging: &LoggingConfig) -> Result<()> {
    let log_level = if verbose {
        LevelFilter::DEBUG
    } else {
        logging.level.parse()?
    };

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if logging.format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}
