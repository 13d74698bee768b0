//! Error types for promptgen core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for promptgen core.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Template store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Template not found.
    #[error("Template '{0}' not found")]
    NotFound(String),

    /// A specific version of a template was not found.
    #[error("Version {version} of template '{name}' not found")]
    VersionNotFound {
        /// Template name.
        name: String,
        /// Requested version.
        version: u32,
    },

    /// Template already exists.
    #[error("Template '{0}' already exists, use update to modify it")]
    AlreadyExists(String),

    /// A different record already occupies this version slot.
    #[error("Version {version} of template '{name}' already exists with different content")]
    VersionConflict {
        /// Template name.
        name: String,
        /// Conflicting version.
        version: u32,
    },

    /// The latest version number cannot be incremented.
    #[error("Template '{0}' has reached the maximum version number")]
    VersionOverflow(String),

    /// Template name cannot be used as a storage key.
    #[error("Invalid template name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A record exists but cannot be parsed.
    #[error("Corrupt record {}: {source}", path.display())]
    Corrupt {
        /// Path of the unreadable record.
        path: PathBuf,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
