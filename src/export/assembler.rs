//! Document Assembler
//!
//! Walks the parsed node tree and produces the ordered paragraph list. The
//! tag-to-paragraph mapping:
//!
//! | Node | Paragraphs |
//! |------|------------|
//! | `p` | one, with a single empty run when it has no content |
//! | `h1`-`h3` | one, with the heading level |
//! | `ul` / `ol` | one per `li` child, bullet or numbered, level 0 |
//! | `div` / `span` | none of its own, children are processed in place |
//! | equation | one, centered, holding the math run |
//! | anything else | one if it produced any runs, otherwise none |
//!
//! Formatting flags only ever switch on as the walk descends.

use super::document::{
    Alignment, Document, FormattedRun, HeadingLevel, ListMarker, MathRun, OutputParagraph, TextRun,
};
use super::equations::{extract_equations, DisplayMode};
use super::math::MathConverter;
use super::nodes::{parse_to_nodes, ParsedNode};
use log::{debug, warn};

/// Font used for equations that could not be converted.
pub const FALLBACK_MATH_FONT: &str = "Cambria Math";
/// Size of the fallback run, in half-points.
pub const FALLBACK_MATH_SIZE: u32 = 24;
/// Color of the fallback run.
pub const FALLBACK_MATH_COLOR: &str = "0070C0";

/// Spacing after body paragraphs and headings, in twips.
const PARAGRAPH_SPACING_AFTER: u32 = 200;
/// Spacing after list items.
const LIST_SPACING_AFTER: u32 = 100;
/// Spacing around standalone equations.
const EQUATION_SPACING: u32 = 200;

/// Accumulated character formatting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunFlags {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl RunFlags {
    /// Flags for the children of an element with the given tag.
    fn descend(self, tag: &str) -> Self {
        Self {
            bold: self.bold || matches!(tag, "strong" | "b"),
            italic: self.italic || matches!(tag, "em" | "i"),
            underline: self.underline || tag == "u",
        }
    }
}

/// Run the full front half of the pipeline: extract equations, parse, assemble.
pub fn build_document(html: &str, converter: &dyn MathConverter) -> Document {
    let prepared = extract_equations(html);
    let nodes = parse_to_nodes(&prepared);
    Document::new(assemble(&nodes, converter))
}

/// Convert top-level nodes into paragraphs, in document order.
pub fn assemble(nodes: &[ParsedNode], converter: &dyn MathConverter) -> Vec<OutputParagraph> {
    let mut paragraphs = Vec::new();
    for node in nodes {
        node_to_paragraphs(node, converter, &mut paragraphs);
    }
    debug!("Assembled {} paragraph(s)", paragraphs.len());
    paragraphs
}

fn node_to_paragraphs(
    node: &ParsedNode,
    converter: &dyn MathConverter,
    out: &mut Vec<OutputParagraph>,
) {
    match node {
        ParsedNode::Element { tag, children } => match tag.as_str() {
            "p" => {
                let runs = children_runs(children, converter);
                out.push(
                    OutputParagraph::new(non_empty(runs)).with_spacing(0, PARAGRAPH_SPACING_AFTER),
                );
            }
            "h1" | "h2" | "h3" => {
                let runs = children_runs(children, converter);
                let mut paragraph =
                    OutputParagraph::new(non_empty(runs)).with_spacing(0, PARAGRAPH_SPACING_AFTER);
                if let Some(level) = HeadingLevel::from_tag(tag) {
                    paragraph = paragraph.with_heading(level);
                }
                out.push(paragraph);
            }
            "ul" | "ol" => {
                let marker = if tag == "ul" {
                    ListMarker::Bullet
                } else {
                    ListMarker::Numbered
                };
                for item in children.iter().filter(|child| child.tag() == Some("li")) {
                    let runs = node_to_runs(item, RunFlags::default(), converter);
                    out.push(
                        OutputParagraph::new(non_empty(runs))
                            .with_list(marker)
                            .with_spacing(0, LIST_SPACING_AFTER),
                    );
                }
            }
            "div" | "span" => {
                for child in children {
                    node_to_paragraphs(child, converter, out);
                }
            }
            _ => push_if_any(node, converter, out),
        },
        ParsedNode::Equation { .. } => {
            let runs = node_to_runs(node, RunFlags::default(), converter);
            if !runs.is_empty() {
                out.push(
                    OutputParagraph::new(runs)
                        .with_alignment(Alignment::Center)
                        .with_spacing(EQUATION_SPACING, EQUATION_SPACING),
                );
            }
        }
        ParsedNode::Text { .. } => push_if_any(node, converter, out),
    }
}

/// Emit one paragraph for `node` if it produces at least one run.
fn push_if_any(node: &ParsedNode, converter: &dyn MathConverter, out: &mut Vec<OutputParagraph>) {
    let runs = node_to_runs(node, RunFlags::default(), converter);
    if !runs.is_empty() {
        out.push(OutputParagraph::new(runs).with_spacing(0, PARAGRAPH_SPACING_AFTER));
    }
}

fn children_runs(children: &[ParsedNode], converter: &dyn MathConverter) -> Vec<FormattedRun> {
    children
        .iter()
        .flat_map(|child| node_to_runs(child, RunFlags::default(), converter))
        .collect()
}

fn non_empty(runs: Vec<FormattedRun>) -> Vec<FormattedRun> {
    if runs.is_empty() {
        vec![FormattedRun::Text(TextRun::plain(""))]
    } else {
        runs
    }
}

/// Flatten a node into runs carrying the accumulated formatting.
pub fn node_to_runs(
    node: &ParsedNode,
    flags: RunFlags,
    converter: &dyn MathConverter,
) -> Vec<FormattedRun> {
    match node {
        ParsedNode::Text { content } => vec![FormattedRun::Text(TextRun {
            text: content.clone(),
            bold: flags.bold,
            italic: flags.italic,
            underline: flags.underline,
            ..Default::default()
        })],
        ParsedNode::Equation { content, mode } => vec![equation_run(content, *mode, converter)],
        ParsedNode::Element { tag, children } => {
            let flags = flags.descend(tag);
            children
                .iter()
                .flat_map(|child| node_to_runs(child, flags, converter))
                .collect()
        }
    }
}

fn equation_run(latex: &str, mode: DisplayMode, converter: &dyn MathConverter) -> FormattedRun {
    match converter.convert(latex, mode) {
        Ok(omml) => FormattedRun::Math(MathRun { omml, mode }),
        Err(e) => {
            warn!("Equation '{}' kept as text: {}", latex, e);
            FormattedRun::Text(fallback_run(latex))
        }
    }
}

/// Styled literal LaTeX used when conversion fails.
pub fn fallback_run(latex: &str) -> TextRun {
    TextRun {
        text: latex.to_string(),
        italic: true,
        font: Some(FALLBACK_MATH_FONT.to_string()),
        size_half_points: Some(FALLBACK_MATH_SIZE),
        color: Some(FALLBACK_MATH_COLOR.to_string()),
        ..Default::default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
