//! MathML to OMML translation
//!
//! Maps presentation MathML onto Office Math Markup. The MathML is read with
//! the same html5ever parser the tree builder uses; `<math>` is foreign
//! content to an HTML parser, so element structure and names survive intact.
//!
//! | MathML | OMML |
//! |--------|------|
//! | `mi`, `mn`, `mo`, `mtext` | `m:r` |
//! | `mfrac` | `m:f` |
//! | `msqrt`, `mroot` | `m:rad` |
//! | `msub`, `msup`, `msubsup` | `m:sSub`, `m:sSup`, `m:sSubSup` |
//! | scripted large operator + operand | `m:nary` |
//! | `mover` / `munder` | `m:acc`, `m:bar`, `m:limUpp`, `m:limLow` |
//! | `mfenced`, stretchy `mo` pairs | `m:d` |
//! | `mtable` | `m:m` |

use super::docx::escape_xml;
use super::math::ConversionError;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// OMML namespace URI.
pub const OMML_NAMESPACE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/math";

/// Operators rendered as n-ary structures when they carry limits.
const NARY_OPERATORS: &[&str] = &[
    "∑", "∏", "∐", "∫", "∬", "∭", "∮", "∯", "∰", "⋃", "⋂", "⋁", "⋀", "⨁", "⨂", "⨀",
];

/// Over-script characters drawn as a bar rather than an accent.
const BAR_CHARACTERS: &[&str] = &["‾", "¯", "_", "―", "̅"];

/// Invisible operators (function application, invisible times and separator).
const INVISIBLE_OPERATORS: &[&str] = &["\u{2061}", "\u{2062}", "\u{2063}", "\u{2064}"];

/// Convert a MathML document or fragment into a namespaced `<m:oMath>` element.
pub fn mathml_to_omml(mathml: &str) -> Result<String, ConversionError> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut mathml.as_bytes())
        .map_err(|e| ConversionError::InvalidMathMl(e.to_string()))?;

    let math = find_element(&dom.document, "math")
        .ok_or_else(|| ConversionError::InvalidMathMl("no <math> element".to_string()))?;

    let mut out = format!(r#"<m:oMath xmlns:m="{}">"#, OMML_NAMESPACE);
    write_sequence(&element_children(&math), &mut out);
    out.push_str("</m:oMath>");
    Ok(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// DOM Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn find_element(handle: &Handle, local: &str) -> Option<Handle> {
    if local_name(handle).as_deref() == Some(local) {
        return Some(handle.clone());
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, local))
}

fn local_name(handle: &Handle) -> Option<String> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref().to_string()),
        _ => None,
    }
}

fn attr(handle: &Handle, key: &str) -> Option<String> {
    match &handle.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref() == key)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

fn element_children(handle: &Handle) -> Vec<Handle> {
    handle
        .children
        .borrow()
        .iter()
        .filter(|child| matches!(child.data, NodeData::Element { .. }))
        .cloned()
        .collect()
}

fn text_content(handle: &Handle) -> String {
    let mut text = String::new();
    collect_text(handle, &mut text);
    text
}

fn collect_text(handle: &Handle, out: &mut String) {
    match &handle.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in handle.children.borrow().iter() {
                collect_text(child, out);
            }
        }
    }
}

/// Text of an `mo` element, or `None` for anything else.
fn operator_text(handle: &Handle) -> Option<String> {
    (local_name(handle).as_deref() == Some("mo")).then(|| text_content(handle).trim().to_string())
}

fn is_truthy(handle: &Handle, key: &str) -> bool {
    attr(handle, key).as_deref() == Some("true")
}

// ─────────────────────────────────────────────────────────────────────────────
// Writers
// ─────────────────────────────────────────────────────────────────────────────

/// Math run properties: script family (`m:scr`) and style (`m:sty`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunStyle {
    script: Option<&'static str>,
    style: Option<&'static str>,
}

impl RunStyle {
    /// Word's default for math runs.
    const ITALIC: Self = Self {
        script: None,
        style: None,
    };
    const UPRIGHT: Self = Self {
        script: None,
        style: Some("p"),
    };

    /// Map a MathML `mathvariant` onto OMML run properties.
    fn from_variant(variant: &str) -> Option<Self> {
        let (script, style) = match variant {
            "normal" => (None, "p"),
            "bold" => (None, "b"),
            "italic" => (None, "i"),
            "bold-italic" => (None, "bi"),
            "double-struck" => (Some("double-struck"), "p"),
            "script" => (Some("script"), "p"),
            "bold-script" => (Some("script"), "b"),
            "fraktur" => (Some("fraktur"), "p"),
            "bold-fraktur" => (Some("fraktur"), "b"),
            "sans-serif" => (Some("sans-serif"), "p"),
            "bold-sans-serif" => (Some("sans-serif"), "b"),
            "sans-serif-italic" => (Some("sans-serif"), "i"),
            "sans-serif-bold-italic" => (Some("sans-serif"), "bi"),
            "monospace" => (Some("monospace"), "p"),
            _ => return None,
        };
        Some(Self {
            script,
            style: Some(style),
        })
    }

    /// The element's own `mathvariant`, or `default` when absent or unknown.
    fn of(handle: &Handle, default: Self) -> Self {
        attr(handle, "mathvariant")
            .and_then(|variant| Self::from_variant(variant.trim()))
            .unwrap_or(default)
    }
}

fn write_run(text: &str, run_style: RunStyle, out: &mut String) {
    out.push_str("<m:r>");
    if run_style != RunStyle::ITALIC {
        out.push_str("<m:rPr>");
        if let Some(script) = run_style.script {
            out.push_str(&format!(r#"<m:scr m:val="{}"/>"#, script));
        }
        if let Some(style) = run_style.style {
            out.push_str(&format!(r#"<m:sty m:val="{}"/>"#, style));
        }
        out.push_str("</m:rPr>");
    }
    out.push_str(r#"<m:t xml:space="preserve">"#);
    out.push_str(&escape_xml(text));
    out.push_str("</m:t></m:r>");
}

/// Write `content` wrapped in `<m:{tag}>`; an absent child gives an empty element.
fn write_arg(tag: &str, child: Option<&Handle>, out: &mut String) {
    match child {
        Some(child) => {
            out.push_str(&format!("<m:{}>", tag));
            write_sequence(std::slice::from_ref(child), out);
            out.push_str(&format!("</m:{}>", tag));
        }
        None => out.push_str(&format!("<m:{}/>", tag)),
    }
}

fn write_sequence(children: &[Handle], out: &mut String) {
    let mut i = 0;
    while i < children.len() {
        if let Some(nary) = NaryParts::detect(&children[i]) {
            let operand = children.get(i + 1);
            nary.write(operand, out);
            i += if operand.is_some() { 2 } else { 1 };
            continue;
        }
        write_node(&children[i], out);
        i += 1;
    }
}

fn write_node(handle: &Handle, out: &mut String) {
    let Some(name) = local_name(handle) else {
        return;
    };
    let args = element_children(handle);

    match name.as_str() {
        "mi" => {
            let text = text_content(handle);
            let text = text.trim();
            if !text.is_empty() {
                // Multi-letter identifiers are function names.
                let default = if text.chars().count() > 1 {
                    RunStyle::UPRIGHT
                } else {
                    RunStyle::ITALIC
                };
                write_run(text, RunStyle::of(handle, default), out);
            }
        }
        "mn" => {
            let text = text_content(handle);
            if !text.trim().is_empty() {
                write_run(text.trim(), RunStyle::of(handle, RunStyle::ITALIC), out);
            }
        }
        "mo" => {
            let text = text_content(handle);
            let text = text.trim();
            if !text.is_empty() && !INVISIBLE_OPERATORS.contains(&text) {
                write_run(text, RunStyle::of(handle, RunStyle::ITALIC), out);
            }
        }
        "mtext" | "ms" => {
            let text = text_content(handle);
            if !text.is_empty() {
                write_run(&text, RunStyle::of(handle, RunStyle::UPRIGHT), out);
            }
        }
        "mspace" => write_run(" ", RunStyle::UPRIGHT, out),
        "mphantom" | "annotation" | "annotation-xml" | "none" | "mprescripts" => {}
        "semantics" => {
            if let Some(first) = args.first() {
                write_node(first, out);
            }
        }
        "mrow" => {
            if is_fenced_row(&args) {
                write_delimited_row(&args, out);
            } else {
                write_sequence(&args, out);
            }
        }
        "mfrac" => {
            out.push_str("<m:f>");
            let thickness = attr(handle, "linethickness").unwrap_or_default();
            if matches!(thickness.as_str(), "0" | "0pt" | "0em" | "0px") {
                out.push_str(r#"<m:fPr><m:type m:val="noBar"/></m:fPr>"#);
            }
            write_arg("num", args.first(), out);
            write_arg("den", args.get(1), out);
            out.push_str("</m:f>");
        }
        "msqrt" => {
            out.push_str(r#"<m:rad><m:radPr><m:degHide m:val="1"/></m:radPr><m:deg/><m:e>"#);
            write_sequence(&args, out);
            out.push_str("</m:e></m:rad>");
        }
        "mroot" => {
            out.push_str("<m:rad>");
            write_arg("deg", args.get(1), out);
            write_arg("e", args.first(), out);
            out.push_str("</m:rad>");
        }
        "msub" => {
            out.push_str("<m:sSub>");
            write_arg("e", args.first(), out);
            write_arg("sub", args.get(1), out);
            out.push_str("</m:sSub>");
        }
        "msup" => {
            out.push_str("<m:sSup>");
            write_arg("e", args.first(), out);
            write_arg("sup", args.get(1), out);
            out.push_str("</m:sSup>");
        }
        "msubsup" => {
            out.push_str("<m:sSubSup>");
            write_arg("e", args.first(), out);
            write_arg("sub", args.get(1), out);
            write_arg("sup", args.get(2), out);
            out.push_str("</m:sSubSup>");
        }
        "mover" => write_over(handle, &args, out),
        "munder" => write_under(&args, out),
        "munderover" => {
            out.push_str("<m:limUpp><m:e><m:limLow>");
            write_arg("e", args.first(), out);
            write_arg("lim", args.get(1), out);
            out.push_str("</m:limLow></m:e>");
            write_arg("lim", args.get(2), out);
            out.push_str("</m:limUpp>");
        }
        "mfenced" => {
            let open = attr(handle, "open").unwrap_or_else(|| "(".to_string());
            let close = attr(handle, "close").unwrap_or_else(|| ")".to_string());
            write_delimiter_start(&open, &close, out);
            if args.is_empty() {
                out.push_str("<m:e/>");
            }
            for arg in &args {
                write_arg("e", Some(arg), out);
            }
            out.push_str("</m:d>");
        }
        "mtable" => write_table(&args, out),
        _ => {
            if args.is_empty() {
                let text = text_content(handle);
                if !text.trim().is_empty() {
                    write_run(text.trim(), RunStyle::ITALIC, out);
                }
            } else {
                write_sequence(&args, out);
            }
        }
    }
}

fn write_over(handle: &Handle, args: &[Handle], out: &mut String) {
    let over = args.get(1).and_then(operator_text);
    let accent = is_truthy(handle, "accent") || over.as_ref().is_some_and(|t| t.chars().count() == 1);

    match over {
        Some(chr) if BAR_CHARACTERS.contains(&chr.as_str()) => {
            out.push_str(r#"<m:bar><m:barPr><m:pos m:val="top"/></m:barPr>"#);
            write_arg("e", args.first(), out);
            out.push_str("</m:bar>");
        }
        Some(chr) if accent => {
            out.push_str(&format!(
                r#"<m:acc><m:accPr><m:chr m:val="{}"/></m:accPr>"#,
                escape_xml(&chr)
            ));
            write_arg("e", args.first(), out);
            out.push_str("</m:acc>");
        }
        _ => {
            out.push_str("<m:limUpp>");
            write_arg("e", args.first(), out);
            write_arg("lim", args.get(1), out);
            out.push_str("</m:limUpp>");
        }
    }
}

fn write_under(args: &[Handle], out: &mut String) {
    let under = args.get(1).and_then(operator_text);
    if under.as_deref().is_some_and(|chr| BAR_CHARACTERS.contains(&chr)) {
        out.push_str(r#"<m:bar><m:barPr><m:pos m:val="bot"/></m:barPr>"#);
        write_arg("e", args.first(), out);
        out.push_str("</m:bar>");
        return;
    }
    out.push_str("<m:limLow>");
    write_arg("e", args.first(), out);
    write_arg("lim", args.get(1), out);
    out.push_str("</m:limLow>");
}

fn write_table(rows: &[Handle], out: &mut String) {
    out.push_str("<m:m>");
    for row in rows {
        if !matches!(local_name(row).as_deref(), Some("mtr" | "mlabeledtr")) {
            continue;
        }
        out.push_str("<m:mr>");
        for cell in element_children(row) {
            out.push_str("<m:e>");
            write_sequence(&element_children(&cell), out);
            out.push_str("</m:e>");
        }
        out.push_str("</m:mr>");
    }
    out.push_str("</m:m>");
}

// ─────────────────────────────────────────────────────────────────────────────
// Delimiters
// ─────────────────────────────────────────────────────────────────────────────

fn is_fence_operator(handle: &Handle, form: &str) -> bool {
    local_name(handle).as_deref() == Some("mo")
        && (is_truthy(handle, "fence") || is_truthy(handle, "stretchy"))
        && attr(handle, "form").map_or(true, |f| f == form)
}

/// An `mrow` bracketed by stretchy prefix/postfix operators (`\left( ... \right)`).
fn is_fenced_row(args: &[Handle]) -> bool {
    match (args.first(), args.last()) {
        (Some(first), Some(last)) if args.len() >= 2 => {
            is_fence_operator(first, "prefix") && is_fence_operator(last, "postfix")
        }
        _ => false,
    }
}

fn write_delimiter_start(open: &str, close: &str, out: &mut String) {
    out.push_str(&format!(
        r#"<m:d><m:dPr><m:begChr m:val="{}"/><m:endChr m:val="{}"/></m:dPr>"#,
        escape_xml(open),
        escape_xml(close)
    ));
}

fn write_delimited_row(args: &[Handle], out: &mut String) {
    let open = text_content(&args[0]).trim().to_string();
    let close = text_content(&args[args.len() - 1]).trim().to_string();
    write_delimiter_start(&open, &close, out);
    out.push_str("<m:e>");
    write_sequence(&args[1..args.len() - 1], out);
    out.push_str("</m:e></m:d>");
}

// ─────────────────────────────────────────────────────────────────────────────
// N-ary Operators
// ─────────────────────────────────────────────────────────────────────────────

/// A large operator with optional limits, e.g. `\sum_{i=1}^{n}`.
struct NaryParts {
    chr: String,
    sub: Option<Handle>,
    sup: Option<Handle>,
    under_over: bool,
}

impl NaryParts {
    fn detect(handle: &Handle) -> Option<Self> {
        let name = local_name(handle)?;
        let args = element_children(handle);

        let (base, sub, sup, under_over) = match name.as_str() {
            "mo" => (handle.clone(), None, None, false),
            "msub" => (args.first()?.clone(), args.get(1).cloned(), None, false),
            "msup" => (args.first()?.clone(), None, args.get(1).cloned(), false),
            "msubsup" => (
                args.first()?.clone(),
                args.get(1).cloned(),
                args.get(2).cloned(),
                false,
            ),
            "munder" => (args.first()?.clone(), args.get(1).cloned(), None, true),
            "mover" => (args.first()?.clone(), None, args.get(1).cloned(), true),
            "munderover" => (
                args.first()?.clone(),
                args.get(1).cloned(),
                args.get(2).cloned(),
                true,
            ),
            _ => return None,
        };

        let chr = operator_text(&base)?;
        if !NARY_OPERATORS.contains(&chr.as_str()) {
            return None;
        }
        Some(Self {
            chr,
            sub,
            sup,
            under_over,
        })
    }

    fn write(&self, operand: Option<&Handle>, out: &mut String) {
        out.push_str("<m:nary><m:naryPr>");
        out.push_str(&format!(r#"<m:chr m:val="{}"/>"#, escape_xml(&self.chr)));
        out.push_str(&format!(
            r#"<m:limLoc m:val="{}"/>"#,
            if self.under_over { "undOvr" } else { "subSup" }
        ));
        if self.sub.is_none() {
            out.push_str(r#"<m:subHide m:val="1"/>"#);
        }
        if self.sup.is_none() {
            out.push_str(r#"<m:supHide m:val="1"/>"#);
        }
        out.push_str("</m:naryPr>");
        write_arg("sub", self.sub.as_ref(), out);
        write_arg("sup", self.sup.as_ref(), out);
        write_arg("e", operand, out);
        out.push_str("</m:nary>");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
