//! Markdown assembly for extracted documents.

use crate::error::Result;
use crate::model::{Document, Element, ImageElement, ImageSource};

use super::table::{render_list_item, render_table};

/// Deepest heading Markdown can express.
const MAX_HEADING_LEVEL: u8 = 6;

/// Convert a document to Markdown.
pub fn to_markdown(doc: &Document) -> Result<String> {
    MarkdownRenderer::new().render(&doc.elements)
}

/// Joins rendered elements into one Markdown string.
///
/// Rendering reads the elements only, so rendering the same sequence twice
/// yields identical output.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    max_heading_level: u8,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new() -> Self {
        Self {
            max_heading_level: MAX_HEADING_LEVEL,
        }
    }

    /// Cap heading depth (clamped to 1..=6).
    pub fn with_max_heading_level(mut self, level: u8) -> Self {
        self.max_heading_level = level.clamp(1, MAX_HEADING_LEVEL);
        self
    }

    /// Render elements in order.
    ///
    /// Block-level elements are separated by a blank line. Consecutive list
    /// items form one list and are separated by a single newline.
    pub fn render(&self, elements: &[Element]) -> Result<String> {
        let mut output = String::new();
        let mut figure = 0usize;
        let mut prev_was_list = false;

        for element in elements {
            let is_list = matches!(element, Element::ListItem(_));
            let block = match element {
                Element::Image(image) => {
                    if image.is_embedded() {
                        figure += 1;
                    }
                    render_image(image, figure)
                }
                other => self.render_block(other)?,
            };

            if block.is_empty() {
                continue;
            }

            if !output.is_empty() {
                output.push_str(if is_list && prev_was_list { "\n" } else { "\n\n" });
            }
            output.push_str(&block);
            prev_was_list = is_list;
        }

        Ok(output)
    }

    fn render_block(&self, element: &Element) -> Result<String> {
        let block = match element {
            Element::Heading { level, text } => {
                let level = (*level).clamp(1, self.max_heading_level);
                format!("{} {}", "#".repeat(usize::from(level)), text)
            }
            Element::Text(text) => text.content.clone(),
            Element::Paragraph(text) => text.clone(),
            Element::ListItem(item) => render_list_item(item),
            Element::Table(table) => render_table(table)?,
            Element::Block(markdown) => markdown.trim_end().to_string(),
            Element::Image(_) => String::new(),
        };
        Ok(block)
    }
}

/// Render an image placeholder.
///
/// Embedded images are numbered figures; URL images carry no number.
pub fn render_image(image: &ImageElement, figure: usize) -> String {
    match (&image.source, image.description.as_deref()) {
        (ImageSource::Embedded { .. }, None) => format!("![Figure {}]", figure),
        (ImageSource::Embedded { .. }, Some(desc)) => format!("![Figure {}]: {}", figure, desc),
        (ImageSource::Url(_), None) => "![Image]".to_string(),
        (ImageSource::Url(_), Some(desc)) => format!("![Image: {}]", desc),
    }
}
