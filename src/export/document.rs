//! Output document model
//!
//! Paragraphs and runs produced by the assembler and consumed by a
//! [`DocumentPackager`](super::docx::DocumentPackager). Everything here is
//! built fresh for one export and dropped once the package bytes exist.

use super::equations::DisplayMode;
use serde::Serialize;

/// Reference name of the shared ordered-list numbering definition.
pub const DEFAULT_NUMBERING: &str = "default-numbering";

/// Text used when an export produces no paragraphs at all.
pub const EMPTY_DOCUMENT_TEXT: &str = "Empty document";

// ─────────────────────────────────────────────────────────────────────────────
// Runs
// ─────────────────────────────────────────────────────────────────────────────

/// A span of text sharing one formatting state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Explicit font family, `None` for the document default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    /// Size in half-points, `None` for the document default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_half_points: Option<u32>,
    /// Hex RGB color without `#`, `None` for automatic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl TextRun {
    /// Plain run with no formatting.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// An embedded equation, already converted to OMML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MathRun {
    /// A complete `<m:oMath>` element
    pub omml: String,
    pub mode: DisplayMode,
}

/// Smallest styled unit within a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FormattedRun {
    Text(TextRun),
    Math(MathRun),
}

impl FormattedRun {
    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            FormattedRun::Text(run) => Some(run),
            FormattedRun::Math(_) => None,
        }
    }

    pub fn as_math(&self) -> Option<&MathRun> {
        match self {
            FormattedRun::Math(run) => Some(run),
            FormattedRun::Text(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Paragraphs
// ─────────────────────────────────────────────────────────────────────────────

/// Heading levels recognised from `<h1>`..`<h3>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "h1" => Some(HeadingLevel::H1),
            "h2" => Some(HeadingLevel::H2),
            "h3" => Some(HeadingLevel::H3),
            _ => None,
        }
    }

    /// Paragraph style id in the generated style sheet.
    pub fn style_id(&self) -> &'static str {
        match self {
            HeadingLevel::H1 => "Heading1",
            HeadingLevel::H2 => "Heading2",
            HeadingLevel::H3 => "Heading3",
        }
    }
}

/// List marker attached to a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListMarker {
    #[default]
    None,
    Bullet,
    /// Numbered through [`DEFAULT_NUMBERING`]
    Numbered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Start,
    Center,
}

/// Paragraph spacing in twentieths of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct Spacing {
    pub before: u32,
    pub after: u32,
}

/// One output paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct OutputParagraph {
    pub runs: Vec<FormattedRun>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<HeadingLevel>,
    pub list: ListMarker,
    /// List nesting level; nested lists are flattened to level 0
    pub level: u8,
    pub alignment: Alignment,
    pub spacing: Spacing,
}

impl OutputParagraph {
    pub fn new(runs: Vec<FormattedRun>) -> Self {
        Self {
            runs,
            ..Default::default()
        }
    }

    pub fn with_heading(mut self, heading: HeadingLevel) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn with_list(mut self, marker: ListMarker) -> Self {
        self.list = marker;
        self.level = 0;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_spacing(mut self, before: u32, after: u32) -> Self {
        self.spacing = Spacing { before, after };
        self
    }

    /// Concatenated text of all text runs; math runs are skipped.
    pub fn plain_text(&self) -> String {
        self.runs
            .iter()
            .filter_map(FormattedRun::as_text)
            .map(|run| run.text.as_str())
            .collect()
    }

    /// True when every run is a display-mode equation.
    pub fn is_display_math(&self) -> bool {
        !self.runs.is_empty()
            && self
                .runs
                .iter()
                .all(|run| matches!(run, FormattedRun::Math(m) if m.mode == DisplayMode::Display))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Document
// ─────────────────────────────────────────────────────────────────────────────

/// A numbering definition made available to list paragraphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberingDefinition {
    pub reference: String,
    /// OOXML number format, e.g. `decimal`
    pub format: String,
    /// Level text, e.g. `%1.`
    pub text: String,
    pub alignment: Alignment,
}

impl NumberingDefinition {
    /// The decimal `%1.` definition shared by every ordered list.
    pub fn default_decimal() -> Self {
        Self {
            reference: DEFAULT_NUMBERING.to_string(),
            format: "decimal".to_string(),
            text: "%1.".to_string(),
            alignment: Alignment::Start,
        }
    }
}

/// A single-section document ready to be packaged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub title: Option<String>,
    pub paragraphs: Vec<OutputParagraph>,
    pub numbering: NumberingDefinition,
}

impl Document {
    /// Wrap paragraphs into a document; an empty list becomes the single
    /// "Empty document" paragraph so the package is never structurally empty.
    pub fn new(mut paragraphs: Vec<OutputParagraph>) -> Self {
        if paragraphs.is_empty() {
            paragraphs.push(OutputParagraph::new(vec![FormattedRun::Text(
                TextRun::plain(EMPTY_DOCUMENT_TEXT),
            )]));
        }
        Self {
            title: None,
            paragraphs,
            numbering: NumberingDefinition::default_decimal(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}
