//! External editor run on a scratch file.

use std::io::Write;
use std::process::Command;

use promptgen_pm::{CapabilityError, Editor};
use tracing::{debug, instrument};

/// Runs a user-configured editor on a temporary file.
#[derive(Debug, Clone)]
pub struct ExternalEditor {
    /// Program and arguments, e.g. `code --wait`.
    command: String,
}

impl ExternalEditor {
    /// Create an editor for a command line.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Editor for ExternalEditor {
    #[instrument(skip(self, seed), fields(command = %self.command))]
    fn edit(&mut self, seed: &str) -> Result<String, CapabilityError> {
        let mut parts = self.command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| CapabilityError::new("no editor configured"))?;

        // Removed on drop, whether or not the editor succeeds
        let mut scratch = tempfile::Builder::new()
            .prefix("promptgen_input_")
            .suffix(".txt")
            .tempfile()?;
        scratch.write_all(seed.as_bytes())?;
        scratch.flush()?;

        debug!(path = %scratch.path().display(), "Opening editor");
        let status = Command::new(program)
            .args(parts)
            .arg(scratch.path())
            .status()
            .map_err(|e| CapabilityError::new(format!("failed to run {program}: {e}")))?;

        if !status.success() {
            return Err(CapabilityError::new(format!("{program} exited with {status}")));
        }

        Ok(std::fs::read_to_string(scratch.path())?)
    }
}
