//! Export Options and Configuration
//!
//! This module defines the export options, delivery targets, and the
//! persisted export settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default filename for generic document exports.
pub const DEFAULT_FILENAME: &str = "document.docx";

/// Default filename for exports from the equation editor (`export --equation`).
pub const EQUATION_FILENAME: &str = "equation-document.docx";

// ─────────────────────────────────────────────────────────────────────────────
// Export Format
// ─────────────────────────────────────────────────────────────────────────────

/// Where an exported document is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Save a `.docx` file
    #[default]
    DocxFile,
    /// Put the `.docx` package on the clipboard
    ClipboardDocx,
}

impl ExportFormat {
    /// Get the display label for this format.
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::DocxFile => "Word Document",
            ExportFormat::ClipboardDocx => "Word Document (clipboard)",
        }
    }

}

// ─────────────────────────────────────────────────────────────────────────────
// Source Format
// ─────────────────────────────────────────────────────────────────────────────

/// Markup the export source is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// HTML from a rich-text editor
    #[default]
    Html,
    /// Markdown, rendered to HTML before export
    Markdown,
}

impl SourceFormat {
    /// Recognise the source format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" | "xhtml" => Some(SourceFormat::Html),
            "md" | "markdown" | "mdown" | "mkd" | "mkdn" => Some(SourceFormat::Markdown),
            _ => None,
        }
    }

    /// Recognise the source format from a file's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Export Options
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration options for document export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Markup of sources whose extension says nothing
    pub source: SourceFormat,

    /// Filename used for saved documents
    pub filename: String,

    /// Document title used when none is given on the command line
    pub title: Option<String>,

    /// Last export directory (for remembering user preference)
    pub last_export_directory: Option<PathBuf>,

    /// Ask for the destination with a native save dialog
    pub use_save_dialog: bool,

    /// Whether to open the exported file after export
    pub open_after_export: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            source: SourceFormat::default(),
            filename: DEFAULT_FILENAME.to_string(),
            title: None,
            last_export_directory: None,
            use_save_dialog: false,
            open_after_export: false,
        }
    }
}

impl ExportOptions {
    /// Source format for `path`: its extension if recognised, else the default.
    pub fn source_for(&self, path: &Path) -> SourceFormat {
        SourceFormat::from_path(path).unwrap_or(self.source)
    }

    /// Filename for a saved document.
    pub fn filename_for(&self, equation: bool) -> &str {
        if equation {
            EQUATION_FILENAME
        } else {
            &self.filename
        }
    }

    /// Title for the document, preferring an explicit one.
    pub fn title_or(&self, explicit: Option<&str>) -> Option<String> {
        explicit.or(self.title.as_deref()).map(str::to_string)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Export Settings (for persistence)
// ─────────────────────────────────────────────────────────────────────────────

/// Persistent export settings stored in user configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExportSettings {
    /// Default export options
    pub default_options: ExportOptions,

    /// Last used export format
    pub last_format: ExportFormat,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_default() {
        assert_eq!(ExportFormat::default(), ExportFormat::DocxFile);
        assert_eq!(ExportFormat::DocxFile.label(), "Word Document");
    }

    #[test]
    fn test_source_format_from_extension() {
        assert_eq!(SourceFormat::from_extension("MD"), Some(SourceFormat::Markdown));
        assert_eq!(SourceFormat::from_extension("html"), Some(SourceFormat::Html));
        assert_eq!(SourceFormat::from_extension("txt"), None);
    }

    #[test]
    fn test_export_options_default() {
        let options = ExportOptions::default();
        assert_eq!(options.source, SourceFormat::Html);
        assert_eq!(options.filename, "document.docx");
        assert!(!options.use_save_dialog);
        assert!(!options.open_after_export);
    }

    #[test]
    fn test_source_for_prefers_extension() {
        let options = ExportOptions {
            source: SourceFormat::Markdown,
            ..Default::default()
        };
        assert_eq!(options.source_for(Path::new("page.html")), SourceFormat::Html);
        assert_eq!(options.source_for(Path::new("notes.md")), SourceFormat::Markdown);
        // Unknown extensions fall back to the configured source
        assert_eq!(options.source_for(Path::new("notes.txt")), SourceFormat::Markdown);
        assert_eq!(options.source_for(Path::new("README")), SourceFormat::Markdown);
    }

    #[test]
    fn test_filename_for_equation_exports() {
        let options = ExportOptions {
            filename: "notes.docx".to_string(),
            ..Default::default()
        };
        assert_eq!(options.filename_for(false), "notes.docx");
        assert_eq!(options.filename_for(true), "equation-document.docx");
    }

    #[test]
    fn test_title_or_prefers_explicit() {
        let options = ExportOptions {
            title: Some("Saved".to_string()),
            ..Default::default()
        };
        assert_eq!(options.title_or(Some("Given")), Some("Given".to_string()));
        assert_eq!(options.title_or(None), Some("Saved".to_string()));
        assert_eq!(ExportOptions::default().title_or(None), None);
    }

    #[test]
    fn test_persisted_defaults_deserialize() {
        let options: ExportOptions =
            serde_json::from_str(r#"{"source": "markdown", "title": "Notes"}"#).unwrap();
        assert_eq!(options.source, SourceFormat::Markdown);
        assert_eq!(options.title.as_deref(), Some("Notes"));
        assert_eq!(options.filename, DEFAULT_FILENAME);
    }

    #[test]
    fn test_export_options_serialization() {
        let options = ExportOptions {
            filename: "notes.docx".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&options).unwrap();
        let deserialized: ExportOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(options, deserialized);
    }
}
