//! Node Tree Builder
//!
//! Parses placeholder-annotated HTML with html5ever and reduces the DOM to a
//! small tree of text leaves, equation leaves and tagged elements. Attributes,
//! comments and processing instructions are dropped; well-formedness recovery
//! (auto-closing, implicit `<body>`) is left entirely to the parser.

use super::equations::{find_placeholders, DisplayMode, Segment};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use log::debug;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use serde::Serialize;

/// One node of the simplified document tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParsedNode {
    /// Literal text, untrimmed
    Text { content: String },
    /// Raw LaTeX source of an equation
    Equation { content: String, mode: DisplayMode },
    /// An element with its lower-cased tag name
    Element {
        tag: String,
        children: Vec<ParsedNode>,
    },
}

impl ParsedNode {
    pub fn text(content: impl Into<String>) -> Self {
        ParsedNode::Text {
            content: content.into(),
        }
    }

    pub fn equation(content: impl Into<String>, mode: DisplayMode) -> Self {
        ParsedNode::Equation {
            content: content.into(),
            mode,
        }
    }

    pub fn element(tag: impl Into<String>, children: Vec<ParsedNode>) -> Self {
        ParsedNode::Element {
            tag: tag.into(),
            children,
        }
    }

    /// Tag name for element nodes.
    pub fn tag(&self) -> Option<&str> {
        match self {
            ParsedNode::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }
}

/// Parse HTML (with equation placeholders already substituted) into the
/// ordered list of top-level body nodes.
///
/// Never fails: input the parser cannot make sense of yields fewer nodes,
/// and an input with nothing usable yields an empty list.
pub fn parse_to_nodes(html: &str) -> Vec<ParsedNode> {
    let dom = match parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
    {
        Ok(dom) => dom,
        Err(e) => {
            // Reading from an in-memory slice does not fail in practice.
            debug!("HTML parse returned an I/O error: {}", e);
            return Vec::new();
        }
    };

    let Some(body) = find_body(&dom.document) else {
        return Vec::new();
    };

    let mut nodes = Vec::new();
    for child in body.children.borrow().iter() {
        convert_node(child, &mut nodes);
    }
    debug!("Parsed {} top-level node(s)", nodes.len());
    nodes
}

/// Depth-first search for the `<body>` element.
fn find_body(handle: &Handle) -> Option<Handle> {
    if let NodeData::Element { name, .. } = &handle.data {
        if name.local.as_ref() == "body" {
            return Some(handle.clone());
        }
    }
    handle.children.borrow().iter().find_map(find_body)
}

/// Convert one DOM node, appending zero or more results to `out`.
///
/// Text nodes that carry placeholders expand to several leaves, so the
/// conversion pushes into the parent's list instead of returning one node.
fn convert_node(handle: &Handle, out: &mut Vec<ParsedNode>) {
    match &handle.data {
        NodeData::Text { contents } => {
            let text = contents.borrow();
            if text.trim().is_empty() {
                return;
            }
            convert_text(&text, out);
        }
        NodeData::Element { name, .. } => {
            let mut children = Vec::new();
            for child in handle.children.borrow().iter() {
                convert_node(child, &mut children);
            }
            out.push(ParsedNode::Element {
                tag: name.local.as_ref().to_ascii_lowercase(),
                children,
            });
        }
        // Comments, doctypes and processing instructions carry no content.
        _ => {}
    }
}

/// Whitespace between two equations is kept so `$a$ $b$` stays spaced;
/// whitespace at either end of the node is dropped.
fn convert_text(text: &str, out: &mut Vec<ParsedNode>) {
    let segments = find_placeholders(text);
    let last = segments.len().saturating_sub(1);
    for (i, segment) in segments.into_iter().enumerate() {
        match segment {
            Segment::Text(literal) => {
                let interior = i > 0 && i < last;
                if interior || !literal.trim().is_empty() {
                    out.push(ParsedNode::text(literal));
                }
            }
            Segment::Equation { mode, latex, .. } => {
                out.push(ParsedNode::equation(latex, mode));
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::equations::extract_equations;

    #[test]
    fn test_paragraph_with_text() {
        let nodes = parse_to_nodes("<p>Hello</p>");
        assert_eq!(
            nodes,
            vec![ParsedNode::element("p", vec![ParsedNode::text("Hello")])]
        );
    }

    #[test]
    fn test_whitespace_text_dropped() {
        let nodes = parse_to_nodes("<p>   </p>\n<p>text</p>");
        assert_eq!(
            nodes,
            vec![
                ParsedNode::element("p", vec![]),
                ParsedNode::element("p", vec![ParsedNode::text("text")]),
            ]
        );
    }

    #[test]
    fn test_text_is_not_trimmed() {
        let nodes = parse_to_nodes("<p>a <b>b</b></p>");
        assert_eq!(
            nodes,
            vec![ParsedNode::element(
                "p",
                vec![
                    ParsedNode::text("a "),
                    ParsedNode::element("b", vec![ParsedNode::text("b")]),
                ]
            )]
        );
    }

    #[test]
    fn test_tags_are_lowercased() {
        let nodes = parse_to_nodes("<DIV><SPAN>x</SPAN></DIV>");
        assert_eq!(nodes[0].tag(), Some("div"));
        match &nodes[0] {
            ParsedNode::Element { children, .. } => assert_eq!(children[0].tag(), Some("span")),
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn test_display_placeholder_becomes_equation() {
        let nodes = parse_to_nodes("<p>[EQUATION:DISPLAY:x^2]</p>");
        assert_eq!(
            nodes,
            vec![ParsedNode::element(
                "p",
                vec![ParsedNode::equation("x^2", DisplayMode::Display)]
            )]
        );
    }

    #[test]
    fn test_mixed_text_and_placeholder_split() {
        let nodes = parse_to_nodes("<p>area [EQUATION:INLINE:\\pi r^2] units</p>");
        assert_eq!(
            nodes,
            vec![ParsedNode::element(
                "p",
                vec![
                    ParsedNode::text("area "),
                    ParsedNode::equation("\\pi r^2", DisplayMode::Inline),
                    ParsedNode::text(" units"),
                ]
            )]
        );
    }

    #[test]
    fn test_space_between_equations_kept() {
        let nodes = parse_to_nodes("<p>[EQUATION:INLINE:a] [EQUATION:INLINE:b]</p>");
        assert_eq!(
            nodes,
            vec![ParsedNode::element(
                "p",
                vec![
                    ParsedNode::equation("a", DisplayMode::Inline),
                    ParsedNode::text(" "),
                    ParsedNode::equation("b", DisplayMode::Inline),
                ]
            )]
        );
    }

    #[test]
    fn test_edge_whitespace_around_equation_dropped() {
        let nodes = parse_to_nodes("<div>\n  [EQUATION:DISPLAY:x]\n</div>");
        assert_eq!(
            nodes,
            vec![ParsedNode::element(
                "div",
                vec![ParsedNode::equation("x", DisplayMode::Display)]
            )]
        );
    }

    #[test]
    fn test_interval_equation_recognised() {
        let html = extract_equations("<p>Let $x \\in [0, 1)$ hold</p>");
        let nodes = parse_to_nodes(&html);
        assert_eq!(
            nodes,
            vec![ParsedNode::element(
                "p",
                vec![
                    ParsedNode::text("Let "),
                    ParsedNode::equation("x \\in [0, 1)", DisplayMode::Inline),
                    ParsedNode::text(" hold"),
                ]
            )]
        );
    }

    #[test]
    fn test_entities_decoded_inside_placeholders() {
        let nodes = parse_to_nodes("<p>[EQUATION:INLINE:a &lt; b]</p>");
        assert_eq!(
            nodes,
            vec![ParsedNode::element(
                "p",
                vec![ParsedNode::equation("a < b", DisplayMode::Inline)]
            )]
        );
    }

    #[test]
    fn test_comments_dropped() {
        let nodes = parse_to_nodes("<!-- note --><p>x</p>");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].tag(), Some("p"));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(parse_to_nodes("").is_empty());
        assert!(parse_to_nodes("   \n ").is_empty());
    }

    #[test]
    fn test_malformed_html_recovered() {
        let nodes = parse_to_nodes("<p>one<p>two");
        assert_eq!(
            nodes,
            vec![
                ParsedNode::element("p", vec![ParsedNode::text("one")]),
                ParsedNode::element("p", vec![ParsedNode::text("two")]),
            ]
        );
    }

    #[test]
    fn test_top_level_text_kept() {
        let nodes = parse_to_nodes("just text");
        assert_eq!(nodes, vec![ParsedNode::text("just text")]);
    }
}
