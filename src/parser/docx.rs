//! DOCX block walker.
//!
//! Reads `word/document.xml` from the archive and walks the body in order,
//! turning paragraphs into headings, list items or inline-formatted
//! paragraphs and tables into grids. Embedded images come from the document
//! relationships and are appended after the body, in relationship order.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use roxmltree::Node;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::model::{Element, ImageElement, ListItemElement, TableElement};

/// WordprocessingML main namespace.
const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const RELS_PART: &str = "word/_rels/document.xml.rels";

/// Style applied to paragraphs without an explicit style.
const DEFAULT_STYLE: &str = "Normal";

/// Everything extracted from one DOCX archive.
#[derive(Debug, Clone, Default)]
pub struct DocxContent {
    /// Body blocks in document order, followed by images
    pub elements: Vec<Element>,
    /// Words across top-level body paragraphs
    pub word_count: usize,
    /// Image relationships found
    pub image_count: usize,
}

/// How a paragraph renders, decided by its style name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParagraphKind {
    /// `Heading N` or `Title`
    Heading(u8),
    /// A style whose name contains `List`
    ListItem {
        /// Whether the paragraph carries numbering
        ordered: bool,
        /// Nesting level from the style name
        level: u8,
    },
    /// Anything else
    Body,
}

impl ParagraphKind {
    /// Classify a paragraph by style name.
    pub fn classify(style_name: &str, has_numbering: bool) -> Self {
        if style_name.starts_with("Heading") {
            ParagraphKind::Heading(trailing_number(style_name).unwrap_or(1))
        } else if style_name == "Title" {
            ParagraphKind::Heading(1)
        } else if style_name.contains("List") {
            ParagraphKind::ListItem {
                ordered: has_numbering,
                level: trailing_number(style_name).unwrap_or(1),
            }
        } else {
            ParagraphKind::Body
        }
    }
}

/// A text run with its direct formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Run {
    text: String,
    bold: bool,
    italic: bool,
}

/// Parse a DOCX archive.
pub fn parse_docx(data: &[u8]) -> Result<DocxContent> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;

    let document_xml = read_part(&mut archive, DOCUMENT_PART)?
        .ok_or_else(|| Error::Docx(format!("missing {}", DOCUMENT_PART)))?;
    let styles = match read_part(&mut archive, STYLES_PART)? {
        Some(xml) => parse_styles(&xml)?,
        None => HashMap::new(),
    };
    let image_targets = match read_part(&mut archive, RELS_PART)? {
        Some(xml) => parse_image_relationships(&xml)?,
        None => Vec::new(),
    };

    let doc = roxmltree::Document::parse(&document_xml)?;
    let body = doc
        .root_element()
        .children()
        .find(|n| is_w(n, "body"))
        .ok_or_else(|| Error::Docx("document has no body".to_string()))?;

    let mut content = DocxContent::default();
    walk_blocks(body, &styles, &mut content);

    for target in &image_targets {
        let path = part_path(target);
        match read_binary_part(&mut archive, &path)? {
            Some(bytes) => {
                content.image_count += 1;
                content
                    .elements
                    .push(Element::Image(ImageElement::embedded(bytes, None)));
            }
            None => log::warn!("Image relationship points to missing part {}", path),
        }
    }

    log::debug!(
        "DOCX: {} elements, {} words, {} images",
        content.elements.len(),
        content.word_count,
        content.image_count
    );
    Ok(content)
}

/// Walk paragraphs and tables in order.
///
/// Content controls (`w:sdt`) are transparent.
fn walk_blocks(container: Node, styles: &HashMap<String, String>, out: &mut DocxContent) {
    for node in container.children().filter(Node::is_element) {
        if is_w(&node, "p") {
            let plain = paragraph_text(node);
            out.word_count += plain.split_whitespace().count();
            if let Some(element) = convert_paragraph(node, &plain, styles) {
                out.elements.push(element);
            }
        } else if is_w(&node, "tbl") {
            let table = convert_table(node);
            if table.is_empty() {
                log::warn!("Skipping table with no rows");
            } else {
                out.elements.push(Element::Table(table));
            }
        } else if is_w(&node, "sdt") {
            if let Some(inner) = node.children().find(|n| is_w(n, "sdtContent")) {
                walk_blocks(inner, styles, out);
            }
        }
    }
}

fn convert_paragraph(p: Node, plain: &str, styles: &HashMap<String, String>) -> Option<Element> {
    let ppr = p.children().find(|n| is_w(n, "pPr"));
    let style_name = ppr
        .and_then(|ppr| ppr.children().find(|n| is_w(n, "pStyle")))
        .and_then(|s| s.attribute((W_NS, "val")))
        .map(|id| styles.get(id).cloned().unwrap_or_else(|| id.to_string()))
        .unwrap_or_else(|| DEFAULT_STYLE.to_string());
    let has_numbering = ppr
        .map(|ppr| ppr.children().any(|n| is_w(&n, "numPr")))
        .unwrap_or(false);

    match ParagraphKind::classify(&style_name, has_numbering) {
        ParagraphKind::Heading(level) => {
            let text = plain.trim();
            (!text.is_empty()).then(|| Element::heading(level, text))
        }
        ParagraphKind::ListItem { ordered, level } => Some(Element::ListItem(
            ListItemElement::new(inline_markdown(&runs(p)), ordered, level),
        )),
        ParagraphKind::Body => Some(Element::paragraph(inline_markdown(&runs(p)))),
    }
}

fn convert_table(tbl: Node) -> TableElement {
    let rows = tbl
        .children()
        .filter(|n| is_w(n, "tr"))
        .map(|tr| {
            let mut cells = Vec::new();
            for tc in tr.children().filter(|n| is_w(n, "tc")) {
                let text = tc
                    .children()
                    .filter(|n| is_w(n, "p"))
                    .map(paragraph_text)
                    .collect::<Vec<_>>()
                    .join("\n");
                // Merged cells repeat across their span
                for _ in 0..grid_span(tc) {
                    cells.push(text.trim().to_string());
                }
            }
            cells
        })
        .collect();
    TableElement::new(rows)
}

fn grid_span(tc: Node) -> usize {
    tc.children()
        .find(|n| is_w(n, "tcPr"))
        .and_then(|pr| pr.children().find(|n| is_w(n, "gridSpan")))
        .and_then(|g| g.attribute((W_NS, "val")))
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&span| span > 0)
        .unwrap_or(1)
}

/// Runs of a paragraph, including those inside hyperlinks.
fn runs(p: Node) -> Vec<Run> {
    let mut result = Vec::new();
    for child in p.children().filter(Node::is_element) {
        if is_w(&child, "r") {
            result.push(read_run(child));
        } else if is_w(&child, "hyperlink") {
            result.extend(child.children().filter(|n| is_w(n, "r")).map(read_run));
        }
    }
    result
}

fn read_run(r: Node) -> Run {
    let rpr = r.children().find(|n| is_w(n, "rPr"));
    let flag = |name: &str| {
        rpr.and_then(|rpr| rpr.children().find(|n| is_w(n, name)))
            .map(|n| toggle_on(n.attribute((W_NS, "val"))))
            .unwrap_or(false)
    };

    Run {
        text: run_text(r),
        bold: flag("b"),
        italic: flag("i"),
    }
}

fn run_text(r: Node) -> String {
    let mut text = String::new();
    for child in r.children().filter(Node::is_element) {
        if is_w(&child, "t") {
            text.push_str(child.text().unwrap_or(""));
        } else if is_w(&child, "tab") {
            text.push('\t');
        } else if is_w(&child, "br") || is_w(&child, "cr") {
            text.push('\n');
        }
    }
    text
}

/// Plain text of a paragraph.
fn paragraph_text(p: Node) -> String {
    runs(p).into_iter().map(|r| r.text).collect()
}

/// Render runs with emphasis markers; whitespace-only runs are dropped.
fn inline_markdown(runs: &[Run]) -> String {
    let mut out = String::new();
    for run in runs {
        let text = run.text.trim();
        if text.is_empty() {
            continue;
        }
        match (run.bold, run.italic) {
            (true, true) => out.push_str(&format!("***{}***", text)),
            (true, false) => out.push_str(&format!("**{}**", text)),
            (false, true) => out.push_str(&format!("*{}*", text)),
            (false, false) => out.push_str(text),
        }
    }
    out
}

/// A toggle property is on unless its value says otherwise.
fn toggle_on(val: Option<&str>) -> bool {
    !matches!(val, Some("0") | Some("false") | Some("off"))
}

/// The run of digits ending a style name (`heading 2`, `Heading2`).
fn trailing_number(style_name: &str) -> Option<u8> {
    let trimmed = style_name.trim_end();
    let stem = trimmed.trim_end_matches(|c: char| c.is_ascii_digit());
    trimmed[stem.len()..].parse().ok()
}

/// Map style ids to display names.
///
/// Built-in styles are stored lowercase (`heading 1`); their display name
/// starts with a capital letter.
fn parse_styles(xml: &str) -> Result<HashMap<String, String>> {
    let doc = roxmltree::Document::parse(xml)?;
    let mut styles = HashMap::new();

    for style in doc.descendants().filter(|n| is_w(n, "style")) {
        let Some(id) = style.attribute((W_NS, "styleId")) else {
            continue;
        };
        let name = style
            .children()
            .find(|n| is_w(n, "name"))
            .and_then(|n| n.attribute((W_NS, "val")))
            .map(capitalize)
            .unwrap_or_else(|| id.to_string());
        styles.insert(id.to_string(), name);
    }

    Ok(styles)
}

/// Image relationship targets, in relationship table order.
fn parse_image_relationships(xml: &str) -> Result<Vec<String>> {
    let doc = roxmltree::Document::parse(xml)?;
    Ok(doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "Relationship")
        .filter(|n| n.attribute("TargetMode") != Some("External"))
        .filter_map(|n| n.attribute("Target"))
        .filter(|target| target.contains("image"))
        .map(str::to_string)
        .collect())
}

/// Resolve a relationship target to an archive path.
fn part_path(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = vec!["word"];
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_w(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(W_NS)
}

fn read_part<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut content = String::new();
            file.read_to_string(&mut content)?;
            Ok(Some(content))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn read_binary_part<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut content = Vec::new();
            file.read_to_end(&mut content)?;
            Ok(Some(content))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
