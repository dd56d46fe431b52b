//! Equation Extraction
//!
//! LaTeX spans written with `$...$` (inline) or `$$...$$` (display) are
//! swapped for bracket placeholders before the HTML is handed to the parser,
//! so that math source never goes through tag or entity handling as raw
//! dollar-delimited text. The tree builder later recognises the placeholders
//! inside text nodes and turns them back into equation leaves.
//!
//! Placeholder syntax:
//!
//! ```text
//! [EQUATION:DISPLAY:<latex>]
//! [EQUATION:INLINE:<latex>]
//! ```
//!
//! Square brackets inside the LaTeX are stored as private-use characters so
//! the first `]` always closes the placeholder, whatever brackets the
//! equation itself contains (`[0, 1)`, `\sqrt[3]{x}`).

use regex::{Captures, Regex};
use serde::Serialize;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Opening marker shared by both placeholder kinds.
const PLACEHOLDER_PREFIX: &str = "[EQUATION:";

/// Stand-ins for `[` and `]` inside placeholder bodies.
const OPEN_BRACKET: char = '\u{F8F2}';
const CLOSE_BRACKET: char = '\u{F8F3}';

static DISPLAY_RE: OnceLock<Regex> = OnceLock::new();
static INLINE_RE: OnceLock<Regex> = OnceLock::new();

fn display_regex() -> &'static Regex {
    DISPLAY_RE.get_or_init(|| Regex::new(r"(?s)\$\$(.*?)\$\$").expect("display equation regex"))
}

fn inline_regex() -> &'static Regex {
    INLINE_RE.get_or_init(|| Regex::new(r"\$([^$\n]+?)\$").expect("inline equation regex"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Display Mode
// ─────────────────────────────────────────────────────────────────────────────

/// How an equation is laid out relative to the surrounding text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Rendered within running text (`$...$`)
    Inline,
    /// Rendered centered on its own line (`$$...$$`)
    Display,
}

impl DisplayMode {
    /// The kind tag written into placeholders.
    pub fn tag(&self) -> &'static str {
        match self {
            DisplayMode::Inline => "INLINE",
            DisplayMode::Display => "DISPLAY",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "INLINE" => Some(DisplayMode::Inline),
            "DISPLAY" => Some(DisplayMode::Display),
            _ => None,
        }
    }
}

/// Build the placeholder token for an equation body.
pub fn placeholder(mode: DisplayMode, latex: &str) -> String {
    let body: String = latex
        .chars()
        .map(|ch| match ch {
            '[' => OPEN_BRACKET,
            ']' => CLOSE_BRACKET,
            other => other,
        })
        .collect();
    format!("{}{}:{}]", PLACEHOLDER_PREFIX, mode.tag(), body)
}

fn unescape_body(body: &str) -> Cow<'_, str> {
    if body.contains([OPEN_BRACKET, CLOSE_BRACKET]) {
        Cow::Owned(body.replace(OPEN_BRACKET, "[").replace(CLOSE_BRACKET, "]"))
    } else {
        Cow::Borrowed(body)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Extraction
// ─────────────────────────────────────────────────────────────────────────────

/// Replace every `$$...$$` and `$...$` span with its placeholder.
///
/// Display spans are replaced first over the whole input; inline spans are
/// then replaced only in the text between display placeholders, so dollar
/// signs that ended up inside a display body are never re-read as inline
/// delimiters. Bodies are trimmed. Unterminated delimiters and spans with an
/// empty body stay untouched.
pub fn extract_equations(html: &str) -> String {
    let with_display = replace_spans(display_regex(), html, DisplayMode::Display);

    let mut result = String::with_capacity(with_display.len());
    for segment in find_placeholders(&with_display) {
        match segment {
            Segment::Text(text) => {
                result.push_str(&replace_spans(inline_regex(), text, DisplayMode::Inline));
            }
            Segment::Equation { raw, .. } => result.push_str(raw),
        }
    }
    result
}

fn replace_spans(re: &Regex, text: &str, mode: DisplayMode) -> String {
    re.replace_all(text, |caps: &Captures| {
        let body = caps[1].trim();
        if body.is_empty() {
            caps[0].to_string()
        } else {
            placeholder(mode, body)
        }
    })
    .into_owned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Placeholder Recognition
// ─────────────────────────────────────────────────────────────────────────────

/// A piece of text split around equation placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text between placeholders
    Text(&'a str),
    /// A recognised placeholder
    Equation {
        mode: DisplayMode,
        /// LaTeX source with its brackets restored
        latex: Cow<'a, str>,
        /// The full placeholder token as it appeared in the input
        raw: &'a str,
    },
}

/// Split `text` into literal runs and equation placeholders, in order.
///
/// The placeholder body ends at the first `]`. Tokens with an unknown kind,
/// an empty body or no closing bracket are kept as text.
pub fn find_placeholders(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find(PLACEHOLDER_PREFIX) {
        let start = cursor + offset;
        match parse_placeholder(text, start) {
            Some((mode, latex, end)) => {
                if literal_start < start {
                    segments.push(Segment::Text(&text[literal_start..start]));
                }
                segments.push(Segment::Equation {
                    mode,
                    latex,
                    raw: &text[start..end],
                });
                literal_start = end;
                cursor = end;
            }
            None => cursor = start + PLACEHOLDER_PREFIX.len(),
        }
    }

    if literal_start < text.len() {
        segments.push(Segment::Text(&text[literal_start..]));
    }
    segments
}

/// Parse the placeholder starting at byte `start`; returns the mode, the
/// body and the byte offset just past the closing bracket.
fn parse_placeholder(text: &str, start: usize) -> Option<(DisplayMode, Cow<'_, str>, usize)> {
    let after_prefix = start + PLACEHOLDER_PREFIX.len();
    let colon = after_prefix + text[after_prefix..].find(':')?;
    let mode = DisplayMode::from_tag(&text[after_prefix..colon])?;

    let body_start = colon + 1;
    let body_end = body_start + text[body_start..].find(']')?;
    let body = &text[body_start..body_end];
    if body.trim().is_empty() {
        return None;
    }
    Some((mode, unescape_body(body), body_end + 1))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_before_inline() {
        let out = extract_equations("$$a$$ and $b$");
        assert_eq!(out, "[EQUATION:DISPLAY:a] and [EQUATION:INLINE:b]");
    }

    #[test]
    fn test_bodies_are_trimmed() {
        assert_eq!(
            extract_equations("$$  x + y  $$"),
            "[EQUATION:DISPLAY:x + y]"
        );
        assert_eq!(extract_equations("$  x + y  $"), "[EQUATION:INLINE:x + y]");
    }

    #[test]
    fn test_display_may_span_lines() {
        let out = extract_equations("$$\na = b\n$$");
        assert_eq!(out, "[EQUATION:DISPLAY:a = b]");
    }

    #[test]
    fn test_inline_does_not_span_lines() {
        let input = "costs $5\nand $6";
        assert_eq!(extract_equations(input), input);
    }

    #[test]
    fn test_unterminated_delimiters_left_alone() {
        assert_eq!(extract_equations("price: $5"), "price: $5");
        assert_eq!(extract_equations("$$x + 1"), "$$x + 1");
    }

    #[test]
    fn test_empty_bodies_left_alone() {
        assert_eq!(extract_equations("$$  $$"), "$$  $$");
        assert_eq!(extract_equations("$$$$"), "$$$$");
    }

    #[test]
    fn test_dollar_inside_display_body_not_reparsed() {
        let out = extract_equations("$$a$b$$ then $c$ and $d$");
        assert_eq!(
            out,
            "[EQUATION:DISPLAY:a$b] then [EQUATION:INLINE:c] and [EQUATION:INLINE:d]"
        );
    }

    #[test]
    fn test_html_around_equations_is_preserved() {
        let out = extract_equations("<p>Euler: $e^{i\\pi} + 1 = 0$</p>");
        assert_eq!(out, "<p>Euler: [EQUATION:INLINE:e^{i\\pi} + 1 = 0]</p>");
    }

    #[test]
    fn test_find_placeholders_splits_text() {
        let segments = find_placeholders("see [EQUATION:INLINE:x^2] here");
        assert_eq!(
            segments,
            vec![
                Segment::Text("see "),
                Segment::Equation {
                    mode: DisplayMode::Inline,
                    latex: "x^2".into(),
                    raw: "[EQUATION:INLINE:x^2]",
                },
                Segment::Text(" here"),
            ]
        );
    }

    #[test]
    fn test_brackets_in_latex_round_trip() {
        let token = placeholder(DisplayMode::Display, "\\sqrt[3]{x}");
        let segments = find_placeholders(&token);
        assert_eq!(
            segments,
            vec![Segment::Equation {
                mode: DisplayMode::Display,
                latex: "\\sqrt[3]{x}".into(),
                raw: token.as_str(),
            }]
        );
    }

    #[test]
    fn test_unbalanced_interval_brackets() {
        for (input, latex) in [
            ("Let $x \\in [0, 1)$ hold", "x \\in [0, 1)"),
            ("on $(0, 1]$ only", "(0, 1]"),
        ] {
            let prepared = extract_equations(input);
            let equations: Vec<String> = find_placeholders(&prepared)
                .into_iter()
                .filter_map(|segment| match segment {
                    Segment::Equation { latex, .. } => Some(latex.into_owned()),
                    Segment::Text(_) => None,
                })
                .collect();
            assert_eq!(equations, vec![latex.to_string()], "input {}", input);
        }
    }

    #[test]
    fn test_placeholder_ends_at_first_bracket() {
        let segments = find_placeholders("[EQUATION:INLINE:a] b]");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1], Segment::Text(" b]"));
    }

    #[test]
    fn test_find_placeholders_rejects_malformed_tokens() {
        let text = "[EQUATION:BLOCK:x] [EQUATION:INLINE:unclosed";
        assert_eq!(find_placeholders(text), vec![Segment::Text(text)]);
    }

    #[test]
    fn test_find_placeholders_plain_text() {
        assert_eq!(find_placeholders("hello"), vec![Segment::Text("hello")]);
        assert!(find_placeholders("").is_empty());
    }
}
