//! Saving exported documents
//!
//! A [`FileSaver`] hands a finished package to the user as a file. The
//! headless [`DirectorySaver`] writes into a fixed directory; the
//! [`DialogSaver`] asks for the destination with a native save dialog.

use crate::files::dialogs::save_docx_dialog;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while saving an exported document.
#[derive(Debug)]
pub enum SaveError {
    /// The user dismissed the save dialog
    Cancelled,
    /// Writing the file failed
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Cancelled => write!(f, "Save cancelled"),
            SaveError::Io { path, source } => {
                write!(f, "Failed to write '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Io { source, .. } => Some(source),
            SaveError::Cancelled => None,
        }
    }
}

/// Something that can persist document bytes under a suggested filename.
pub trait FileSaver {
    /// Save `bytes`, returning the path actually written.
    fn save(&mut self, bytes: &[u8], filename: &str) -> Result<PathBuf, SaveError>;
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), SaveError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| SaveError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, bytes).map_err(|source| SaveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Directory Saver
// ─────────────────────────────────────────────────────────────────────────────

/// Writes documents into a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FileSaver for DirectorySaver {
    fn save(&mut self, bytes: &[u8], filename: &str) -> Result<PathBuf, SaveError> {
        let path = self.dir.join(filename);
        write_file(&path, bytes)?;
        Ok(path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dialog Saver
// ─────────────────────────────────────────────────────────────────────────────

/// Asks the user where to save with a native dialog.
#[derive(Debug, Clone, Default)]
pub struct DialogSaver {
    initial_dir: Option<PathBuf>,
}

impl DialogSaver {
    pub fn new(initial_dir: Option<PathBuf>) -> Self {
        Self { initial_dir }
    }
}

impl FileSaver for DialogSaver {
    fn save(&mut self, bytes: &[u8], filename: &str) -> Result<PathBuf, SaveError> {
        let path = save_docx_dialog(self.initial_dir.as_deref(), Some(filename))
            .ok_or(SaveError::Cancelled)?;
        write_file(&path, bytes)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_saver_writes_file() {
        let temp = TempDir::new().unwrap();
        let mut saver = DirectorySaver::new(temp.path());

        let path = saver.save(b"PK\x03\x04", "document.docx").unwrap();

        assert_eq!(path, temp.path().join("document.docx"));
        assert_eq!(fs::read(&path).unwrap(), b"PK\x03\x04");
    }

    #[test]
    fn test_directory_saver_creates_directory() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("out").join("docs");
        let mut saver = DirectorySaver::new(&nested);

        let path = saver.save(b"data", "a.docx").unwrap();

        assert!(nested.is_dir());
        assert!(path.exists());
    }

    #[test]
    fn test_directory_saver_reports_io_error() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, b"x").unwrap();

        // A regular file cannot act as the parent directory.
        let mut saver = DirectorySaver::new(&blocker);
        let err = saver.save(b"data", "a.docx").unwrap_err();
        assert!(matches!(err, SaveError::Io { .. }));
    }

    #[test]
    fn test_save_error_display() {
        assert_eq!(SaveError::Cancelled.to_string(), "Save cancelled");
    }
}
