//! Document Export Module for docxiq
//!
//! This module turns rich-text HTML (or markdown) carrying LaTeX equations
//! into Word documents with native, editable equations.
//!
//! # Pipeline
//!
//! 1. `equations.rs` - rewrite `$$...$$` / `$...$` into equation placeholders
//! 2. `nodes.rs` - parse the HTML body into a tree of text, equation and element nodes
//! 3. `assembler.rs` - map the tree onto paragraphs and formatted runs
//! 4. `docx.rs` - write the OOXML package
//!
//! # Architecture
//!
//! - `math.rs` / `omml.rs` - LaTeX to MathML to Office Math conversion
//! - `document.rs` - output data model
//! - `markdown.rs` - markdown sources rendered through comrak
//! - `pipeline.rs` - the `Exporter` and the boolean delivery entry points
//! - `save.rs` / `clipboard.rs` - delivery targets
//! - `options.rs` - export configuration and options

pub mod assembler;
pub mod clipboard;
pub mod document;
pub mod docx;
pub mod equations;
pub mod markdown;
pub mod math;
pub mod nodes;
pub mod omml;
pub mod options;
pub mod pipeline;
pub mod save;

pub use clipboard::{ClipboardError, DocumentClipboard, SystemClipboard};
pub use docx::{DocumentPackager, DocxPackager, PackagingError, DOCX_MIME_TYPE};
pub use equations::{extract_equations, DisplayMode};
pub use math::{LatexOmmlConverter, MathConverter};
pub use nodes::{parse_to_nodes, ParsedNode};
pub use options::{ExportFormat, ExportOptions, ExportSettings, SourceFormat};
pub use pipeline::{copy_as_docx, download_as_docx, Exporter};
pub use save::{DialogSaver, DirectorySaver, FileSaver, SaveError};
