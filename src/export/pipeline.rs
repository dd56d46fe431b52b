//! Export pipeline
//!
//! [`Exporter`] ties the stages together: equations are extracted, the HTML
//! is parsed into nodes, the nodes are assembled into paragraphs, and the
//! packager turns the result into `.docx` bytes. The two delivery entry
//! points report a plain `bool` to the editing front end and log the reason
//! for any failure.

use super::assembler::build_document;
use super::clipboard::{ClipboardError, DocumentClipboard, SystemClipboard};
use super::docx::{DocumentPackager, DocxPackager, PackagingError, DOCX_MIME_TYPE};
use super::document::Document;
use super::markdown::markdown_to_export_html;
use super::math::{LatexOmmlConverter, MathConverter};
use super::options::SourceFormat;
use super::save::{DialogSaver, FileSaver, SaveError};
use log::{debug, error, info, warn};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Creator recorded in the package properties.
pub const CREATOR: &str = "docxiq";

// ─────────────────────────────────────────────────────────────────────────────
// Export Error
// ─────────────────────────────────────────────────────────────────────────────

/// Why a delivery did not complete.
#[derive(Debug)]
pub enum ExportError {
    Packaging(PackagingError),
    Save(SaveError),
    Clipboard(ClipboardError),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Packaging(e) => write!(f, "Packaging failed: {}", e),
            ExportError::Save(e) => write!(f, "Saving failed: {}", e),
            ExportError::Clipboard(e) => write!(f, "Clipboard copy failed: {}", e),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Packaging(e) => Some(e),
            ExportError::Save(e) => Some(e),
            ExportError::Clipboard(e) => Some(e),
        }
    }
}

impl From<PackagingError> for ExportError {
    fn from(err: PackagingError) -> Self {
        ExportError::Packaging(err)
    }
}

impl From<SaveError> for ExportError {
    fn from(err: SaveError) -> Self {
        ExportError::Save(err)
    }
}

impl From<ClipboardError> for ExportError {
    fn from(err: ClipboardError) -> Self {
        ExportError::Clipboard(err)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exporter
// ─────────────────────────────────────────────────────────────────────────────

/// HTML to `.docx` exporter with pluggable math conversion and packaging.
pub struct Exporter {
    converter: Box<dyn MathConverter>,
    packager: Box<dyn DocumentPackager>,
    title: Option<String>,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(
            Box::new(LatexOmmlConverter::new()),
            Box::new(DocxPackager::new().with_creator(CREATOR)),
        )
    }
}

impl Exporter {
    pub fn new(converter: Box<dyn MathConverter>, packager: Box<dyn DocumentPackager>) -> Self {
        Self {
            converter,
            packager,
            title: None,
        }
    }

    /// Title written to the package properties of every export.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Assemble the document model without packaging it.
    pub fn build(&self, html: &str) -> Document {
        let document = build_document(html, self.converter.as_ref());
        match &self.title {
            Some(title) => document.with_title(title.clone()),
            None => document,
        }
    }

    /// Produce the `.docx` package bytes for `html`.
    pub fn export(&self, html: &str) -> Result<Vec<u8>, PackagingError> {
        let document = self.build(html);
        debug!("Assembled {} paragraph(s)", document.paragraphs.len());
        self.packager.package(&document)
    }

    /// Package `html` and save it, returning the path written.
    pub fn save_to(
        &self,
        html: &str,
        filename: &str,
        saver: &mut dyn FileSaver,
    ) -> Result<PathBuf, ExportError> {
        let bytes = self.export(html)?;
        let path = saver.save(&bytes, filename)?;
        info!("Exported document to {}", path.display());
        Ok(path)
    }

    /// Package `html` and hand it to the saver as `filename`.
    ///
    /// Returns `true` once the file has been handed over; any failure is
    /// logged and reported as `false`.
    pub fn download(&self, html: &str, filename: &str, saver: &mut dyn FileSaver) -> bool {
        match self.save_to(html, filename, saver) {
            Ok(_) => true,
            Err(e) => {
                error!("Failed to export document: {}", e);
                false
            }
        }
    }

    /// Package `html` and place it on the clipboard as a single DOCX item.
    pub fn copy(&self, html: &str, clipboard: &mut dyn DocumentClipboard) -> bool {
        let result = self
            .export(html)
            .map_err(ExportError::from)
            .and_then(|bytes| {
                clipboard
                    .write_item(DOCX_MIME_TYPE, &bytes)
                    .map_err(ExportError::from)
            });

        match result {
            Ok(()) => {
                info!("Copied document to clipboard");
                true
            }
            Err(e) => {
                error!("Failed to copy document: {}", e);
                false
            }
        }
    }
}

/// Turn source text into the HTML the pipeline consumes.
pub fn prepare_source(source: &str, format: SourceFormat) -> Cow<'_, str> {
    match format {
        SourceFormat::Html => Cow::Borrowed(source),
        SourceFormat::Markdown => Cow::Owned(markdown_to_export_html(source)),
    }
}

/// Open an exported file with the system's default application.
///
/// Failing to open is not a failed export, so it is only logged.
pub fn open_exported(path: &Path) {
    if let Err(e) = open::that(path) {
        warn!("Failed to open {}: {}", path.display(), e);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Convenience entry points
// ─────────────────────────────────────────────────────────────────────────────

/// Export `html` with the default pipeline, asking where to save it.
pub fn download_as_docx(html: &str, filename: &str) -> bool {
    Exporter::default().download(html, filename, &mut DialogSaver::default())
}

/// Export `html` with the default pipeline onto the system clipboard.
pub fn copy_as_docx(html: &str) -> bool {
    Exporter::default().copy(html, &mut SystemClipboard::new())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
