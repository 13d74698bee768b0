//! promptgen core - versioned template store.
//!
//! This crate persists named templates as chains of immutable versions,
//! keeps a latest pointer per template in sync with the newest version, and
//! records an append-only history of prompt generations.

#![warn(rust_2024_compatibility, missing_docs, missing_debug_implementations)]

pub mod chain;
pub mod config;
pub mod error;
pub mod history;
pub mod store;
pub mod template;

pub use chain::{Reconciliation, Saved, TemplateManager};
pub use config::{ConfigError, PromptgenConfig};
pub use error::{Result, StoreError};
pub use history::{HistoryEntry, HistoryLog};
pub use store::{DeleteReport, FailedRemoval, FsStore, TemplateStorage};
pub use template::{Template, TemplateSummary, validate_name};

/// Re-export common types for convenience.
pub mod prelude {
    pub use crate::{
        FsStore, HistoryEntry, HistoryLog, Result, StoreError, Template, TemplateManager,
        TemplateStorage,
    };
}
