//! Append-only log of prompt generations.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::Result;

/// File name of the history log inside the store directory.
pub const HISTORY_FILE: &str = "history.log";

/// One successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the prompt was generated.
    pub timestamp: DateTime<Utc>,
    /// Template used.
    pub name: String,
    /// Template version used.
    pub version: u32,
}

impl HistoryEntry {
    /// Entry for a generation happening now.
    #[must_use]
    pub fn now(name: impl Into<String>, version: u32) -> Self {
        Self {
            timestamp: Utc::now(),
            name: name.into(),
            version,
        }
    }
}

/// History log stored as one JSON object per line.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    /// History log at an explicit path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// History log stored next to the templates in `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(HISTORY_FILE))
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry, creating the log and its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be opened or written.
    #[instrument(skip(self, entry), fields(name = %entry.name, version = entry.version))]
    pub fn append(&self, entry: &HistoryEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;

        debug!("Appended history entry");
        Ok(())
    }

    /// All entries in append order. Lines that do not parse are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the log exists but cannot be read.
    pub fn entries(&self) -> Result<Vec<HistoryEntry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(index, line)| {
                serde_json::from_str::<HistoryEntry>(line)
                    .map_err(|e| warn!(line = index + 1, error = %e, "Skipping malformed history line"))
                    .ok()
            })
            .collect())
    }

    /// The most recent `limit` entries for `name` (or for every template),
    /// oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read.
    pub fn recent(&self, name: Option<&str>, limit: Option<usize>) -> Result<Vec<HistoryEntry>> {
        let mut entries: Vec<HistoryEntry> = self
            .entries()?
            .into_iter()
            .filter(|entry| name.is_none_or(|name| entry.name == name))
            .collect();

        if let Some(limit) = limit
            && entries.len() > limit
        {
            entries.drain(..entries.len() - limit);
        }
        Ok(entries)
    }
}
