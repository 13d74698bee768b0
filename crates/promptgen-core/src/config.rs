//! Configuration types for promptgen.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Error types for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error validating configuration.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_yaml::Error),
}

/// promptgen configuration.
///
/// Stored in `config.yml` inside the promptgen home directory. Every field
/// has a default, so the file is optional and may be partial.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PromptgenConfig {
    /// Configuration version.
    #[serde(default = "default_config_version")]
    pub version: String,

    /// Template store settings.
    #[serde(default)]
    #[validate(nested)]
    pub store: StoreConfig,

    /// External editor settings.
    #[serde(default)]
    pub editor: EditorConfig,

    /// Prompt generation settings.
    #[serde(default)]
    pub generate: GenerateConfig,

    /// Logging configuration.
    #[serde(default)]
    #[validate(nested)]
    pub logging: LoggingConfig,
}

fn default_config_version() -> String {
    "1.0".to_string()
}

/// Template store settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Directory holding template records and the history log, relative to
    /// the promptgen home unless absolute.
    #[serde(default = "default_store_dir")]
    #[validate(length(min = 1))]
    pub directory: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: default_store_dir(),
        }
    }
}

fn default_store_dir() -> String {
    "templates".to_string()
}

/// External editor settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Editor command, possibly with arguments. Falls back to `$EDITOR`,
    /// then `vim`.
    #[serde(default)]
    pub command: Option<String>,
}

/// Prompt generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateConfig {
    /// Copy generated prompts to the clipboard.
    #[serde(default = "default_true")]
    pub copy_to_clipboard: bool,

    /// Append generated prompts to the history log.
    #[serde(default = "default_true")]
    pub record_history: bool,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            copy_to_clipboard: true,
            record_history: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    #[validate(length(min = 1))]
    pub level: String,

    /// Log format, `human` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

impl PromptgenConfig {
    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    #[tracing::instrument(skip(path))]
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        config
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Resolve the template store directory against the promptgen home.
    #[must_use]
    pub fn store_dir(&self, home: &Path) -> PathBuf {
        home.join(&self.store.directory)
    }
}

impl Default for PromptgenConfig {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            store: StoreConfig::default(),
            editor: EditorConfig::default(),
            generate: GenerateConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
