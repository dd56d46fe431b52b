//! docxiq - export rich-text HTML with LaTeX equations to Word documents
//!
//! The export pipeline lives in [`export`]; [`config`] persists user
//! preferences and [`files`] wraps the native save dialog.
//!
//! ```ignore
//! let ok = docxiq::export::copy_as_docx("<p>Area: $\\pi r^2$</p>");
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod files;

pub use error::{Error, Result};
pub use export::{copy_as_docx, download_as_docx, Exporter};
