//! Clipboard Delivery for DOCX Packages
//!
//! Word processors pick up a pasted document when the clipboard offers it
//! under the DOCX MIME type. [`SystemClipboard`] stores the package as a
//! custom-format buffer through `clipboard-rs`, which supports arbitrary
//! format names on Windows, macOS and X11/Wayland.
//!
//! On X11 the selection is served by this process, so the item stays
//! available only while the process is alive.

#![allow(clippy::enum_variant_names)]

use clipboard_rs::{Clipboard, ClipboardContext};
use log::debug;

// ─────────────────────────────────────────────────────────────────────────────
// Clipboard Error
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during clipboard operations.
#[derive(Debug)]
pub enum ClipboardError {
    /// Failed to access clipboard
    AccessError(String),
    /// Failed to set clipboard content
    WriteError(String),
}

impl std::fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClipboardError::AccessError(msg) => write!(f, "Clipboard access error: {}", msg),
            ClipboardError::WriteError(msg) => write!(f, "Clipboard write error: {}", msg),
        }
    }
}

impl std::error::Error for ClipboardError {}

// ─────────────────────────────────────────────────────────────────────────────
// Clipboard Capability
// ─────────────────────────────────────────────────────────────────────────────

/// A clipboard that accepts a single item tagged with a MIME type.
pub trait DocumentClipboard {
    /// Replace the clipboard contents with `bytes` labelled as `mime_type`.
    fn write_item(&mut self, mime_type: &str, bytes: &[u8]) -> Result<(), ClipboardError>;
}

/// The desktop clipboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentClipboard for SystemClipboard {
    fn write_item(&mut self, mime_type: &str, bytes: &[u8]) -> Result<(), ClipboardError> {
        let ctx =
            ClipboardContext::new().map_err(|e| ClipboardError::AccessError(e.to_string()))?;

        debug!("Writing {} bytes to clipboard as {}", bytes.len(), mime_type);

        ctx.set_buffer(mime_type, bytes.to_vec())
            .map_err(|e| ClipboardError::WriteError(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
