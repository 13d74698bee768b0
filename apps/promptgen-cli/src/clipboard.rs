//! System clipboard backed by arboard.

use promptgen_pm::{CapabilityError, Clipboard};
use tracing::debug;

/// The system clipboard.
///
/// Connects on first use so commands that never touch the clipboard never
/// open a display connection.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    /// Create an unconnected clipboard handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn connect(&mut self) -> Result<&mut arboard::Clipboard, CapabilityError> {
        if self.inner.is_none() {
            debug!("Connecting to system clipboard");
            let clipboard = arboard::Clipboard::new().map_err(to_capability_error)?;
            self.inner = Some(clipboard);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| CapabilityError::new("clipboard not connected"))
    }
}

impl Clipboard for SystemClipboard {
    fn read(&mut self) -> Result<String, CapabilityError> {
        match self.connect()?.get_text() {
            Ok(text) => Ok(text),
            // An empty clipboard is readable, it just holds no text
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(to_capability_error(e)),
        }
    }

    fn write(&mut self, text: &str) -> Result<(), CapabilityError> {
        self.connect()?
            .set_text(text.to_owned())
            .map_err(to_capability_error)
    }
}

fn to_capability_error(e: arboard::Error) -> CapabilityError {
    CapabilityError::new(e.to_string())
}
