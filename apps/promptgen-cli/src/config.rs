//! Configuration management for promptgen CLI.
//!
//! Resolves the promptgen home directory and loads the optional
//! `config.yml` inside it.

use std::path::{Path, PathBuf};

use promptgen_core::config::ConfigError;
use promptgen_core::{FsStore, HistoryLog, PromptgenConfig, TemplateManager};
use thiserror::Error;
use tracing::{debug, instrument};

/// Editor used when neither the config file nor `$EDITOR` names one.
const DEFAULT_EDITOR: &str = "vim";

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigLoadError>;

/// Error types for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// No home directory given and none could be determined.
    #[error("Cannot determine the promptgen home directory; pass --home or set PROMPTGEN_HOME")]
    NoHome,

    /// Error loading configuration.
    #[error("Failed to load configuration from {path}")]
    LoadError {
        /// Configuration file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: ConfigError,
    },
}

/// Configuration manager for promptgen CLI.
#[derive(Debug)]
pub struct ConfigManager {
    /// promptgen home directory.
    home: PathBuf,
    /// Loaded configuration.
    config: PromptgenConfig,
}

impl ConfigManager {
    /// Get the configuration file path for a home directory.
    #[must_use]
    pub fn config_file_path(home: &Path) -> PathBuf {
        home.join("config.yml")
    }

    /// Default home directory, `~/.promptgen`.
    #[must_use]
    pub fn default_home() -> Option<PathBuf> {
        dirs::home_dir().map(|dir| dir.join(".promptgen"))
    }

    /// Load configuration for the given home, or the default home.
    ///
    /// A missing configuration file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if no home can be resolved or the configuration file
    /// exists but is invalid.
    #[instrument]
    pub fn load(home: Option<PathBuf>) -> Result<Self> {
        let home = home
            .or_else(Self::default_home)
            .ok_or(ConfigLoadError::NoHome)?;

        let config_path = Self::config_file_path(&home);
        let config = if config_path.is_file() {
            debug!("Loading configuration from {}", config_path.display());
            PromptgenConfig::load_from_file(&config_path).map_err(|source| {
                ConfigLoadError::LoadError {
                    path: config_path.clone(),
                    source,
                }
            })?
        } else {
            debug!("No configuration at {}, using defaults", config_path.display());
            PromptgenConfig::default()
        };

        Ok(Self { home, config })
    }

    /// Get the home directory.
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &PromptgenConfig {
        &self.config
    }

    /// Get the template store directory.
    #[must_use]
    pub fn store_dir(&self) -> PathBuf {
        self.config.store_dir(&self.home)
    }

    /// Template manager over the configured store.
    #[must_use]
    pub fn manager(&self) -> TemplateManager {
        TemplateManager::new(FsStore::new(self.store_dir()))
    }

    /// History log kept alongside the templates.
    #[must_use]
    pub fn history(&self) -> HistoryLog {
        HistoryLog::in_dir(&self.store_dir())
    }

    /// Editor command: the config file, then `$EDITOR`, then `vim`.
    #[must_use]
    pub fn editor_command(&self) -> String {
        resolve_editor(
            self.config.editor.command.as_deref(),
            std::env::var("EDITOR").ok().as_deref(),
        )
    }
}

fn resolve_editor(configured: Option<&str>, env: Option<&str>) -> String {
    [configured, env]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|command| !command.is_empty())
        .unwrap_or(DEFAULT_EDITOR)
        .to_string()
}
