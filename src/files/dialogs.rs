//! Native file dialog integration using the rfd crate
//!
//! This module provides the save dialog used when a document is exported
//! interactively.

use rfd::FileDialog;
use std::path::{Path, PathBuf};

/// File extension filters for supported file types.
const DOCX_EXTENSIONS: &[&str] = &["docx"];

/// Opens a native save dialog for an exported Word document.
///
/// Returns `Some(PathBuf)` if a location was selected, `None` if cancelled.
pub fn save_docx_dialog(initial_dir: Option<&Path>, default_name: Option<&str>) -> Option<PathBuf> {
    let mut dialog = FileDialog::new()
        .set_title("Export Document")
        .add_filter("Word Document", DOCX_EXTENSIONS)
        .add_filter("All Files", &["*"]);

    if let Some(dir) = initial_dir {
        dialog = dialog.set_directory(dir);
    }

    if let Some(name) = default_name {
        dialog = dialog.set_file_name(name);
    }

    dialog.save_file()
}
