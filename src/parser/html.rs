//! HTML normalizer.
//!
//! Walks the DOM from `<body>` in document order. Block-level elements each
//! produce one element; inline content between blocks is gathered into a
//! single paragraph. Every node is converted exactly once: a block's inline
//! markup is absorbed into that block and its children are not revisited.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};
use crate::model::{Element, ImageElement, ListItemElement, TableElement};

/// An absolute URL starts with a scheme.
static URL_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap());

/// Elements whose content is never rendered.
const SKIPPED: &[&str] = &[
    "head", "script", "style", "noscript", "template", "title", "meta", "link", "iframe", "svg",
    "object",
];

/// Elements that only group other content.
const CONTAINERS: &[&str] = &[
    "html", "body", "div", "section", "article", "main", "header", "footer", "nav", "aside",
    "figure", "figcaption", "form", "address", "details", "summary", "center", "dl", "dd", "dt",
    "fieldset", "li",
];

/// Everything extracted from one HTML document.
#[derive(Debug, Clone, Default)]
pub struct HtmlContent {
    /// Blocks and images in document order
    pub elements: Vec<Element>,
    /// Words across all document text
    pub word_count: usize,
    /// Number of `img` tags
    pub image_count: usize,
}

/// Parse an HTML document.
pub fn parse_html(data: &[u8]) -> Result<HtmlContent> {
    let source = String::from_utf8_lossy(data);
    let document = Html::parse_document(&source);

    let base_url = document
        .select(&selector("base[href]")?)
        .next()
        .and_then(|b| b.value().attr("href"))
        .map(str::to_string);

    let mut walker = Walker {
        base_url,
        elements: Vec::new(),
    };
    match document.select(&selector("body")?).next() {
        Some(body) => walker.walk_container(body),
        None => walker.walk_container(document.root_element()),
    }

    let word_count = document
        .root_element()
        .text()
        .map(|t| t.split_whitespace().count())
        .sum();
    let image_count = document.select(&selector("img")?).count();

    log::debug!(
        "HTML: {} elements, {} words, {} images",
        walker.elements.len(),
        word_count,
        image_count
    );

    Ok(HtmlContent {
        elements: walker.elements,
        word_count,
        image_count,
    })
}

/// Resolve an image `src` against the document base.
///
/// Protocol-relative URLs get `https:`. URLs with a scheme are kept. Other
/// paths are joined to the base when there is one and left as-is otherwise.
pub fn resolve_image_url(src: &str, base_url: Option<&str>) -> String {
    let src = src.trim();
    if let Some(rest) = src.strip_prefix("//") {
        return format!("https://{}", rest);
    }
    if URL_SCHEME.is_match(src) {
        return src.to_string();
    }
    match base_url.map(str::trim).filter(|b| !b.is_empty()) {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), src.trim_start_matches('/')),
        None => src.to_string(),
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Html(format!("invalid selector {}: {}", css, e)))
}

struct Walker {
    base_url: Option<String>,
    elements: Vec<Element>,
}

impl Walker {
    /// Walk a grouping element, merging loose inline content into paragraphs.
    fn walk_container(&mut self, container: ElementRef) {
        let mut inline = InlineBuffer::default();

        for child in container.children() {
            if let Some(text) = child.value().as_text() {
                inline.push_text(text);
                continue;
            }
            let Some(element) = ElementRef::wrap(child) else {
                continue;
            };
            let name = element.value().name();

            if SKIPPED.contains(&name) {
                continue;
            }
            if is_block(name) {
                self.flush(&mut inline);
                self.walk_block(element);
            } else if name == "img" {
                self.flush(&mut inline);
                if let Some(image) = self.image(element) {
                    self.elements.push(Element::Image(image));
                }
            } else {
                self.inline_element(element, &mut inline);
            }
        }

        self.flush(&mut inline);
    }

    fn walk_block(&mut self, element: ElementRef) {
        let name = element.value().name();
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse().unwrap_or(1);
                let mut inline = InlineBuffer::default();
                self.inline_children(element, &mut inline);
                let (text, images) = inline.finish();
                if !text.is_empty() {
                    self.elements.push(Element::heading(level, text));
                }
                self.push_images(images);
            }
            "p" => {
                let mut inline = InlineBuffer::default();
                self.inline_children(element, &mut inline);
                self.flush(&mut inline);
            }
            "ul" | "ol" => self.walk_list(element, name == "ol", 1),
            "table" => {
                let table = table_rows(element);
                if table.is_empty() {
                    log::warn!("Skipping table with no rows");
                } else {
                    self.elements.push(Element::Table(table));
                }
            }
            "pre" => {
                let code: String = element.text().collect();
                let code = code.trim_matches('\n');
                if !code.trim().is_empty() {
                    self.elements.push(Element::Block(format!("```\n{}\n```", code)));
                }
            }
            "blockquote" => {
                let text = collapse_whitespace(&element.text().collect::<String>());
                if !text.is_empty() {
                    self.elements.push(Element::Block(format!("> {}", text)));
                }
            }
            "hr" => self.elements.push(Element::Block("---".to_string())),
            _ => self.walk_container(element),
        }
    }

    fn walk_list(&mut self, list: ElementRef, ordered: bool, level: u8) {
        for li in list.children().filter_map(ElementRef::wrap) {
            if li.value().name() != "li" {
                continue;
            }

            let mut inline = InlineBuffer::default();
            let mut nested = Vec::new();
            for child in li.children() {
                if let Some(text) = child.value().as_text() {
                    inline.push_text(text);
                } else if let Some(element) = ElementRef::wrap(child) {
                    match element.value().name() {
                        "ul" | "ol" => nested.push(element),
                        _ => self.inline_element(element, &mut inline),
                    }
                }
            }

            let (text, images) = inline.finish();
            if !text.is_empty() {
                self.elements
                    .push(Element::ListItem(ListItemElement::new(text, ordered, level)));
            }
            self.push_images(images);

            for sub in nested {
                self.walk_list(sub, sub.value().name() == "ol", level.saturating_add(1));
            }
        }
    }

    fn inline_children(&self, element: ElementRef, inline: &mut InlineBuffer) {
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                inline.push_text(text);
            } else if let Some(el) = ElementRef::wrap(child) {
                self.inline_element(el, inline);
            }
        }
    }

    /// Convert an inline element into Markdown.
    fn inline_element(&self, element: ElementRef, inline: &mut InlineBuffer) {
        let name = element.value().name();
        if SKIPPED.contains(&name) {
            return;
        }

        match name {
            "br" => inline.text.push('\n'),
            "img" => {
                if let Some(image) = self.image(element) {
                    inline.images.push(image);
                }
            }
            "strong" | "b" => self.wrapped(element, inline, "**", "**"),
            "em" | "i" => self.wrapped(element, inline, "*", "*"),
            "code" => self.wrapped(element, inline, "`", "`"),
            "a" => match element.value().attr("href") {
                Some(href) => {
                    let close = format!("]({})", href);
                    self.wrapped(element, inline, "[", &close);
                }
                None => self.inline_children(element, inline),
            },
            _ => self.inline_children(element, inline),
        }
    }

    fn wrapped(&self, element: ElementRef, inline: &mut InlineBuffer, open: &str, close: &str) {
        let mut inner = InlineBuffer::default();
        self.inline_children(element, &mut inner);
        let (text, images) = inner.finish();
        if !text.is_empty() {
            inline.text.push_str(open);
            inline.text.push_str(&text);
            inline.text.push_str(close);
        }
        inline.images.extend(images);
    }

    fn image(&self, img: ElementRef) -> Option<ImageElement> {
        let src = img.value().attr("src")?;
        Some(ImageElement::url(resolve_image_url(src, self.base_url.as_deref())))
    }

    fn flush(&mut self, inline: &mut InlineBuffer) {
        let (text, images) = std::mem::take(inline).finish();
        if !text.is_empty() {
            self.elements.push(Element::paragraph(text));
        }
        self.push_images(images);
    }

    fn push_images(&mut self, images: Vec<ImageElement>) {
        self.elements.extend(images.into_iter().map(Element::Image));
    }
}

/// Inline Markdown being gathered, plus images found inside it.
#[derive(Debug, Default)]
struct InlineBuffer {
    text: String,
    images: Vec<ImageElement>,
}

impl InlineBuffer {
    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Collapse whitespace within each line and drop blank edges.
    fn finish(self) -> (String, Vec<ImageElement>) {
        let text = self
            .text
            .split('\n')
            .map(collapse_whitespace)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();
        (text, self.images)
    }
}

fn table_rows(table: ElementRef) -> TableElement {
    let mut rows = Vec::new();
    collect_rows(table, &mut rows);
    TableElement::new(rows)
}

/// Rows of a table, looking through thead/tbody/tfoot but not nested tables.
fn collect_rows(element: ElementRef, rows: &mut Vec<Vec<String>>) {
    for child in element.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|c| matches!(c.value().name(), "td" | "th"))
                    .map(|c| collapse_whitespace(&c.text().collect::<String>()))
                    .collect(),
            ),
            "thead" | "tbody" | "tfoot" => collect_rows(child, rows),
            _ => {}
        }
    }
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "ul" | "ol" | "table" | "pre" | "blockquote" | "hr"
    ) || CONTAINERS.contains(&name)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
