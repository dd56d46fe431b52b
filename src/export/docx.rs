//! DOCX Packaging
//!
//! Serializes a [`Document`] into an Office Open XML word-processing package
//! held in memory. The package carries the main document part, a small style
//! sheet (Normal, Heading1-3, ListParagraph), the numbering part with the
//! bullet definition and the shared `default-numbering` decimal definition,
//! and core properties.

use super::document::{
    Alignment, Document, FormattedRun, ListMarker, NumberingDefinition, OutputParagraph, TextRun,
};
use super::omml::OMML_NAMESPACE;
use log::debug;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// MIME type of a word-processing document package.
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Numbering instance used by bullet paragraphs.
const BULLET_NUM_ID: u32 = 1;
/// Numbering instance bound to the shared ordered-list definition.
const DEFAULT_NUM_ID: u32 = 2;

// ─────────────────────────────────────────────────────────────────────────────
// Packaging Error
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur while writing the package.
#[derive(Debug)]
pub enum PackagingError {
    /// Writing into the in-memory buffer failed
    Io(std::io::Error),
    /// The zip container could not be written
    Zip(zip::result::ZipError),
}

impl std::fmt::Display for PackagingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackagingError::Io(e) => write!(f, "IO error: {}", e),
            PackagingError::Zip(e) => write!(f, "Zip error: {}", e),
        }
    }
}

impl std::error::Error for PackagingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PackagingError::Io(e) => Some(e),
            PackagingError::Zip(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for PackagingError {
    fn from(err: std::io::Error) -> Self {
        PackagingError::Io(err)
    }
}

impl From<zip::result::ZipError> for PackagingError {
    fn from(err: zip::result::ZipError) -> Self {
        PackagingError::Zip(err)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Packager
// ─────────────────────────────────────────────────────────────────────────────

/// Turns an assembled document into package bytes.
pub trait DocumentPackager {
    fn package(&self, document: &Document) -> Result<Vec<u8>, PackagingError>;
}

/// Writes `.docx` packages with Deflate compression.
#[derive(Debug, Clone, Default)]
pub struct DocxPackager {
    /// Written to `docProps/core.xml` as the creator
    pub creator: Option<String>,
}

impl DocxPackager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }
}

impl DocumentPackager for DocxPackager {
    fn package(&self, document: &Document) -> Result<Vec<u8>, PackagingError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let opt = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let parts: [(&str, String); 7] = [
            ("[Content_Types].xml", content_types_xml().to_string()),
            ("_rels/.rels", rels_xml().to_string()),
            (
                "docProps/core.xml",
                core_xml(document.title.as_deref(), self.creator.as_deref()),
            ),
            ("word/document.xml", document_xml(document)),
            ("word/styles.xml", styles_xml().to_string()),
            ("word/numbering.xml", numbering_xml(&document.numbering)),
            ("word/_rels/document.xml.rels", word_rels_xml().to_string()),
        ];

        for (name, content) in parts.iter() {
            zip.start_file(*name, opt)?;
            zip.write_all(content.as_bytes())?;
        }

        let bytes = zip.finish()?.into_inner();
        debug!(
            "Packaged {} paragraph(s) into {} bytes",
            document.paragraphs.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main Document Part
// ─────────────────────────────────────────────────────────────────────────────

/// Build `word/document.xml`.
pub fn document_xml(document: &Document) -> String {
    let mut body = String::new();
    for paragraph in &document.paragraphs {
        write_paragraph(paragraph, &mut body);
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:m="{math_ns}">
<w:body>{body}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/><w:cols w:space="708"/><w:docGrid w:linePitch="360"/></w:sectPr></w:body>
</w:document>"#,
        math_ns = OMML_NAMESPACE,
        body = body,
    )
}

fn write_paragraph(paragraph: &OutputParagraph, out: &mut String) {
    out.push_str("<w:p><w:pPr>");

    if let Some(heading) = paragraph.heading {
        out.push_str(&format!(r#"<w:pStyle w:val="{}"/>"#, heading.style_id()));
    } else if paragraph.list != ListMarker::None {
        out.push_str(r#"<w:pStyle w:val="ListParagraph"/>"#);
    }

    let num_id = match paragraph.list {
        ListMarker::None => None,
        ListMarker::Bullet => Some(BULLET_NUM_ID),
        ListMarker::Numbered => Some(DEFAULT_NUM_ID),
    };
    if let Some(num_id) = num_id {
        out.push_str(&format!(
            r#"<w:numPr><w:ilvl w:val="{}"/><w:numId w:val="{}"/></w:numPr>"#,
            paragraph.level, num_id
        ));
    }

    let spacing = paragraph.spacing;
    if spacing.before > 0 || spacing.after > 0 {
        out.push_str(&format!(
            r#"<w:spacing w:before="{}" w:after="{}"/>"#,
            spacing.before, spacing.after
        ));
    }

    if paragraph.alignment == Alignment::Center {
        out.push_str(r#"<w:jc w:val="center"/>"#);
    }
    out.push_str("</w:pPr>");

    if paragraph.is_display_math() {
        out.push_str(r#"<m:oMathPara><m:oMathParaPr><m:jc m:val="center"/></m:oMathParaPr>"#);
        for run in &paragraph.runs {
            write_run(run, out);
        }
        out.push_str("</m:oMathPara>");
    } else {
        for run in &paragraph.runs {
            write_run(run, out);
        }
    }

    out.push_str("</w:p>");
}

fn write_run(run: &FormattedRun, out: &mut String) {
    match run {
        FormattedRun::Text(text) => write_text_run(text, out),
        FormattedRun::Math(math) => out.push_str(&math.omml),
    }
}

fn write_text_run(run: &TextRun, out: &mut String) {
    out.push_str("<w:r>");

    let mut props = String::new();
    if let Some(font) = &run.font {
        let font = escape_xml(font);
        props.push_str(&format!(
            r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:cs="{0}"/>"#,
            font
        ));
    }
    if run.bold {
        props.push_str("<w:b/>");
    }
    if run.italic {
        props.push_str("<w:i/>");
    }
    if run.underline {
        props.push_str(r#"<w:u w:val="single"/>"#);
    }
    if let Some(color) = &run.color {
        props.push_str(&format!(r#"<w:color w:val="{}"/>"#, escape_xml(color)));
    }
    if let Some(size) = run.size_half_points {
        props.push_str(&format!(r#"<w:sz w:val="{}"/>"#, size));
    }
    if !props.is_empty() {
        out.push_str("<w:rPr>");
        out.push_str(&props);
        out.push_str("</w:rPr>");
    }

    out.push_str(r#"<w:t xml:space="preserve">"#);
    out.push_str(&escape_xml(&run.text));
    out.push_str("</w:t></w:r>");
}

// ─────────────────────────────────────────────────────────────────────────────
// Supporting Parts
// ─────────────────────────────────────────────────────────────────────────────

fn content_types_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>"#
}

fn rels_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#
}

fn word_rels_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/>
</Relationships>"#
}

fn core_xml(title: Option<&str>, creator: Option<&str>) -> String {
    let mut props = String::new();
    if let Some(title) = title {
        props.push_str(&format!("<dc:title>{}</dc:title>", escape_xml(title)));
    }
    if let Some(creator) = creator {
        props.push_str(&format!("<dc:creator>{}</dc:creator>", escape_xml(creator)));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">{}</cp:coreProperties>"#,
        props
    )
}

fn styles_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:qFormat/>
    <w:rPr><w:sz w:val="22"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:keepNext/><w:spacing w:before="240"/><w:outlineLvl w:val="0"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="32"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading2">
    <w:name w:val="heading 2"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:keepNext/><w:spacing w:before="200"/><w:outlineLvl w:val="1"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="28"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading3">
    <w:name w:val="heading 3"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:keepNext/><w:spacing w:before="200"/><w:outlineLvl w:val="2"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="24"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="ListParagraph">
    <w:name w:val="List Paragraph"/>
    <w:basedOn w:val="Normal"/>
    <w:qFormat/>
    <w:pPr><w:ind w:left="720"/></w:pPr>
  </w:style>
</w:styles>"#
}

/// Build `word/numbering.xml`: the bullet list definition plus `numbering`.
fn numbering_xml(numbering: &NumberingDefinition) -> String {
    let jc = match numbering.alignment {
        Alignment::Start => "left",
        Alignment::Center => "center",
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="0">
    <w:multiLevelType w:val="singleLevel"/>
    <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="•"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl>
  </w:abstractNum>
  <w:abstractNum w:abstractNumId="1">
    <w:multiLevelType w:val="singleLevel"/>
    <w:name w:val="{name}"/>
    <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="{format}"/><w:lvlText w:val="{text}"/><w:lvlJc w:val="{jc}"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl>
  </w:abstractNum>
  <w:num w:numId="{bullet}"><w:abstractNumId w:val="0"/></w:num>
  <w:num w:numId="{numbered}"><w:abstractNumId w:val="1"/></w:num>
</w:numbering>"#,
        name = escape_xml(&numbering.reference),
        format = escape_xml(&numbering.format),
        text = escape_xml(&numbering.text),
        jc = jc,
        bullet = BULLET_NUM_ID,
        numbered = DEFAULT_NUM_ID,
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Utility Functions
// ─────────────────────────────────────────────────────────────────────────────

/// XML-escape text and attribute values.
///
/// Characters XML 1.0 does not allow at all (most C0 controls, U+FFFE and
/// U+FFFF) are dropped; Word refuses packages that contain them.
pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars().filter(|&ch| is_xml_char(ch)) {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::document::{HeadingLevel, MathRun};
    use crate::export::equations::DisplayMode;
    use std::io::Read;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_package_contains_all_parts() {
        let doc = Document::new(vec![OutputParagraph::new(vec![FormattedRun::Text(
            TextRun::plain("Hello"),
        )])]);
        let bytes = DocxPackager::new().package(&doc).unwrap();

        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "word/document.xml",
            "word/styles.xml",
            "word/numbering.xml",
            "word/_rels/document.xml.rels",
        ] {
            assert!(names.contains(&part), "missing part {}", part);
        }

        assert!(read_part(&bytes, "word/document.xml").contains(">Hello</w:t>"));
    }

    #[test]
    fn test_text_run_formatting() {
        let run = TextRun {
            text: "a & b".to_string(),
            bold: true,
            italic: true,
            underline: true,
            ..Default::default()
        };
        let mut out = String::new();
        write_text_run(&run, &mut out);

        assert!(out.contains("<w:b/>"));
        assert!(out.contains("<w:i/>"));
        assert!(out.contains(r#"<w:u w:val="single"/>"#));
        assert!(out.contains("a &amp; b"));
    }

    #[test]
    fn test_plain_run_has_no_properties() {
        let mut out = String::new();
        write_text_run(&TextRun::plain("x"), &mut out);
        assert!(!out.contains("<w:rPr>"));
    }

    #[test]
    fn test_paragraph_properties() {
        let heading = OutputParagraph::new(vec![]).with_heading(HeadingLevel::H2);
        let numbered = OutputParagraph::new(vec![]).with_list(ListMarker::Numbered);
        let bullet = OutputParagraph::new(vec![]).with_list(ListMarker::Bullet);
        let doc = Document::new(vec![heading, numbered, bullet]);
        let xml = document_xml(&doc);

        assert!(xml.contains(r#"<w:pStyle w:val="Heading2"/>"#));
        assert!(xml.contains(r#"<w:numId w:val="2"/>"#));
        assert!(xml.contains(r#"<w:numId w:val="1"/>"#));
        assert!(xml.contains(r#"<w:ilvl w:val="0"/>"#));
    }

    #[test]
    fn test_display_math_paragraph_wrapped() {
        let math = FormattedRun::Math(MathRun {
            omml: "<m:oMath><m:r><m:t>x</m:t></m:r></m:oMath>".to_string(),
            mode: DisplayMode::Display,
        });
        let doc = Document::new(vec![
            OutputParagraph::new(vec![math]).with_alignment(Alignment::Center)
        ]);
        let xml = document_xml(&doc);

        assert!(xml.contains("<m:oMathPara>"));
        assert!(xml.contains(r#"<w:jc w:val="center"/>"#));
        assert!(xml.contains("<m:oMath><m:r><m:t>x</m:t></m:r></m:oMath>"));
    }

    #[test]
    fn test_numbering_part() {
        let xml = numbering_xml(&NumberingDefinition::default_decimal());
        assert!(xml.contains(r#"<w:name w:val="default-numbering"/>"#));
        assert!(xml.contains(r#"<w:numFmt w:val="decimal"/>"#));
        assert!(xml.contains(r#"<w:lvlText w:val="%1."/>"#));
        assert!(xml.contains(r#"<w:lvlJc w:val="left"/>"#));
    }

    #[test]
    fn test_core_properties() {
        let xml = core_xml(Some("Notes <1>"), Some("docxiq"));
        assert!(xml.contains("<dc:title>Notes &lt;1&gt;</dc:title>"));
        assert!(xml.contains("<dc:creator>docxiq</dc:creator>"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("plain"), "plain");
        assert_eq!(escape_xml("<a href=\"x\">"), "&lt;a href=&quot;x&quot;&gt;");
        assert_eq!(escape_xml("it's"), "it&apos;s");
    }

    #[test]
    fn test_escape_xml_drops_invalid_characters() {
        assert_eq!(escape_xml("a\u{0B}b\u{01}c\u{1F}"), "abc");
        assert_eq!(escape_xml("tab\tline\n"), "tab\tline\n");
        assert_eq!(escape_xml("\u{FFFE}ok\u{FFFF}"), "ok");
    }

    #[test]
    fn test_control_characters_never_reach_document_xml() {
        let doc = Document::new(vec![OutputParagraph::new(vec![FormattedRun::Text(
            TextRun::plain("a\u{0B}b\u{01}c"),
        )])]);
        let xml = document_xml(&doc);
        assert!(xml.contains(">abc</w:t>"));
        assert!(!xml.contains('\u{0B}'));
        assert!(!xml.contains('\u{01}'));
    }
}
