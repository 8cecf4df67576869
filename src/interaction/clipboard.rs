//! Clipboard access

use anyhow::{Context, Result};

/// Somewhere copied code goes
pub trait ClipboardSink: Send + Sync {
    fn copy(&self, text: &str) -> Result<()>;
}

/// The system clipboard
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn copy(&self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("Clipboard unavailable")?;
        clipboard.set_text(text.to_string()).context("Failed to copy to clipboard")?;
        Ok(())
    }
}
