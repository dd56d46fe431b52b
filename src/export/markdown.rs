//! Markdown sources
//!
//! Markdown is rendered to HTML with comrak before it enters the export
//! pipeline. Equations are pulled out first and stashed behind opaque tokens
//! so markdown escaping (`\\`, `\{`, `_`) never touches LaTeX source; the
//! tokens are swapped back for equation placeholders in the rendered HTML.

use super::equations::{extract_equations, find_placeholders, DisplayMode, Segment};
use comrak::{markdown_to_html, Options};
use regex::{Captures, Regex};
use std::sync::OnceLock;

const TOKEN_OPEN: char = '\u{F8F0}';
const TOKEN_CLOSE: char = '\u{F8F1}';

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
static DISPLAY_PARAGRAPH_RE: OnceLock<Regex> = OnceLock::new();

fn token_regex() -> &'static Regex {
    TOKEN_RE.get_or_init(|| Regex::new("\u{F8F0}(\\d+)\u{F8F1}").expect("token regex"))
}

fn display_paragraph_regex() -> &'static Regex {
    DISPLAY_PARAGRAPH_RE
        .get_or_init(|| Regex::new("<p>\u{F8F0}(\\d+)\u{F8F1}</p>").expect("paragraph token regex"))
}

/// Render markdown to an HTML fragment that carries equation placeholders.
///
/// A display equation that forms a paragraph on its own is emitted without
/// the surrounding `<p>` so it is laid out as a standalone equation.
pub fn markdown_to_export_html(markdown: &str) -> String {
    let prepared = extract_equations(markdown);

    let mut stash: Vec<(DisplayMode, String)> = Vec::new();
    let mut protected = String::with_capacity(prepared.len());
    for segment in find_placeholders(&prepared) {
        match segment {
            Segment::Text(text) => protected.push_str(text),
            Segment::Equation { mode, raw, .. } => {
                protected.push(TOKEN_OPEN);
                protected.push_str(&stash.len().to_string());
                protected.push(TOKEN_CLOSE);
                stash.push((mode, raw.to_string()));
            }
        }
    }

    let html = markdown_to_html(&protected, &comrak_options());

    let html = display_paragraph_regex().replace_all(&html, |caps: &Captures| {
        match lookup(&stash, &caps[1]) {
            Some((DisplayMode::Display, raw)) => html_escape(raw),
            _ => caps[0].to_string(),
        }
    });
    token_regex()
        .replace_all(&html, |caps: &Captures| match lookup(&stash, &caps[1]) {
            Some((_, raw)) => html_escape(raw),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn lookup<'a>(stash: &'a [(DisplayMode, String)], index: &str) -> Option<&'a (DisplayMode, String)> {
    index.parse::<usize>().ok().and_then(|i| stash.get(i))
}

fn comrak_options() -> Options {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;

    // Raw HTML in the markdown is passed through to the exporter.
    options.render.unsafe_ = true;
    options
}

/// HTML-escape a string.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_markdown() {
        let html = markdown_to_export_html("# Title\n\n**Bold** and *italic*");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<strong>Bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
    }

    #[test]
    fn test_inline_equation_escapes_untouched() {
        let html = markdown_to_export_html("Set $\\{x_1, x_2\\}$ here");
        assert!(html.contains("[EQUATION:INLINE:\\{x_1, x_2\\}]"));
    }

    #[test]
    fn test_display_equation_paragraph_unwrapped() {
        let html = markdown_to_export_html("Intro\n\n$$a \\\\ b$$\n\nOutro");
        assert!(html.contains("[EQUATION:DISPLAY:a \\\\ b]"));
        assert!(!html.contains("<p>[EQUATION:DISPLAY"));
    }

    #[test]
    fn test_equation_html_is_escaped() {
        let html = markdown_to_export_html("Check $a < b$ now");
        assert!(html.contains("[EQUATION:INLINE:a &lt; b]"));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("a & b"), "a &amp; b");
    }
}
