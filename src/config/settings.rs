//! User settings and preferences for docxiq
//!
//! This module defines the `Settings` struct that holds all user-configurable
//! options, with serde support for JSON persistence.

use crate::export::options::{ExportSettings, DEFAULT_FILENAME};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// User preferences persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────────
    /// Export defaults and last used format
    pub export: ExportSettings,

    // ─────────────────────────────────────────────────────────────────────────
    // Session & History
    // ─────────────────────────────────────────────────────────────────────────
    /// Recently exported documents (most recent first)
    pub recent_exports: Vec<PathBuf>,

    /// Maximum number of recent exports to remember
    pub max_recent_exports: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            export: ExportSettings::default(),
            recent_exports: Vec::new(),
            max_recent_exports: 10,
        }
    }
}

impl Settings {
    /// Add a document to the recent exports list.
    ///
    /// If the path already exists in the list, it's moved to the front.
    /// The list is trimmed to `max_recent_exports`.
    pub fn add_recent_export(&mut self, path: PathBuf) {
        // Remove if already exists
        self.recent_exports.retain(|p| p != &path);
        // Add to front
        self.recent_exports.insert(0, path);
        // Trim to max
        self.recent_exports.truncate(self.max_recent_exports);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation Constants and Sanitization
    // ─────────────────────────────────────────────────────────────────────────

    /// Default number of remembered exports.
    pub const DEFAULT_RECENT_EXPORTS: usize = 10;
    /// Maximum number of remembered exports.
    pub const MAX_RECENT_EXPORTS: usize = 100;

    /// Sanitize settings by clamping values to valid ranges.
    ///
    /// This is useful after loading settings from a file that might have
    /// been manually edited with invalid values.
    pub fn sanitize(&mut self) {
        // Ensure max_recent_exports is reasonable
        if self.max_recent_exports == 0 {
            self.max_recent_exports = Self::DEFAULT_RECENT_EXPORTS;
        } else if self.max_recent_exports > Self::MAX_RECENT_EXPORTS {
            self.max_recent_exports = Self::MAX_RECENT_EXPORTS;
        }

        // Trim recent exports to max
        self.recent_exports.truncate(self.max_recent_exports);

        // Saved documents must keep the Word extension
        let options = &mut self.export.default_options;
        let filename = options.filename.trim();
        if filename.is_empty() {
            options.filename = DEFAULT_FILENAME.to_string();
        } else if !filename.to_ascii_lowercase().ends_with(".docx") {
            options.filename = format!("{}.docx", filename);
        } else if filename.len() != options.filename.len() {
            options.filename = filename.to_string();
        }
    }

    /// Load settings and sanitize them to ensure validity.
    ///
    /// This is a convenience method that deserializes and then sanitizes.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::options::ExportFormat;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.recent_exports.is_empty());
        assert_eq!(settings.max_recent_exports, 10);
        assert_eq!(settings.export.default_options.filename, "document.docx");
    }

    #[test]
    fn test_add_recent_export() {
        let mut settings = Settings {
            max_recent_exports: 3,
            ..Default::default()
        };

        settings.add_recent_export(PathBuf::from("/a.docx"));
        settings.add_recent_export(PathBuf::from("/b.docx"));
        settings.add_recent_export(PathBuf::from("/c.docx"));

        assert_eq!(settings.recent_exports.len(), 3);
        assert_eq!(settings.recent_exports[0], PathBuf::from("/c.docx"));
        assert_eq!(settings.recent_exports[2], PathBuf::from("/a.docx"));

        // Re-adding moves to the front
        settings.add_recent_export(PathBuf::from("/a.docx"));
        assert_eq!(settings.recent_exports.len(), 3);
        assert_eq!(settings.recent_exports[0], PathBuf::from("/a.docx"));

        // Adding a fourth trims the oldest
        settings.add_recent_export(PathBuf::from("/d.docx"));
        assert_eq!(settings.recent_exports.len(), 3);
        assert!(!settings.recent_exports.contains(&PathBuf::from("/b.docx")));
    }

    #[test]
    fn test_sanitize_recent_limits() {
        let mut settings = Settings {
            max_recent_exports: 0,
            ..Default::default()
        };
        settings.sanitize();
        assert_eq!(settings.max_recent_exports, Settings::DEFAULT_RECENT_EXPORTS);

        settings.max_recent_exports = 1000;
        settings.sanitize();
        assert_eq!(settings.max_recent_exports, Settings::MAX_RECENT_EXPORTS);

        settings.max_recent_exports = 2;
        settings.recent_exports = vec![
            PathBuf::from("/1.docx"),
            PathBuf::from("/2.docx"),
            PathBuf::from("/3.docx"),
        ];
        settings.sanitize();
        assert_eq!(settings.recent_exports.len(), 2);
    }

    #[test]
    fn test_sanitize_filename() {
        let mut settings = Settings::default();

        settings.export.default_options.filename = "notes".to_string();
        settings.sanitize();
        assert_eq!(settings.export.default_options.filename, "notes.docx");

        settings.export.default_options.filename = "   ".to_string();
        settings.sanitize();
        assert_eq!(settings.export.default_options.filename, "document.docx");

        settings.export.default_options.filename = " Report.DOCX ".to_string();
        settings.sanitize();
        assert_eq!(settings.export.default_options.filename, "Report.DOCX");
    }

    #[test]
    fn test_from_json_sanitized() {
        let json = r#"{"max_recent_exports": 500, "export": {"last_format": "clipboarddocx"}}"#;
        let settings = Settings::from_json_sanitized(json).unwrap();

        assert_eq!(settings.max_recent_exports, Settings::MAX_RECENT_EXPORTS);
        assert_eq!(settings.export.last_format, ExportFormat::ClipboardDocx);
    }

    #[test]
    fn test_settings_serialization_roundtrip() {
        let mut settings = Settings::default();
        settings.add_recent_export(PathBuf::from("/out/document.docx"));

        let json = serde_json::to_string_pretty(&settings).unwrap();
        let loaded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, loaded);
    }
}
