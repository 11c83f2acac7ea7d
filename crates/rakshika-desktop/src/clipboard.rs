//! System clipboard access.

use clipboard_rs::{Clipboard, ClipboardContext};
use tracing::debug;

use crate::{DesktopError, Result};

/// Writes text to the system clipboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl SystemClipboard {
    /// Create a new clipboard handle.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Replace the clipboard contents with `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard cannot be opened or written.
    pub fn write_text(&self, text: &str) -> Result<()> {
        let ctx = ClipboardContext::new().map_err(|e| DesktopError::Clipboard(e.to_string()))?;
        ctx.set_text(text.to_string())
            .map_err(|e| DesktopError::Clipboard(e.to_string()))?;
        debug!(len = text.len(), "Wrote text to clipboard");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clipboard_debug() {
        let clipboard = SystemClipboard::new();
        assert_eq!(format!("{clipboard:?}"), "SystemClipboard");
    }
}
