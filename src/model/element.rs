//! Element types: the ordered units an extractor produces.

/// A line of text together with its dominant font size.
///
/// Only the PDF extractor produces these; the heading classifier turns
/// each one into a [`Element::Heading`] or [`Element::Paragraph`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    /// Size of the first sized character run, if any
    pub font_size: Option<f32>,
    /// Trimmed line text
    pub content: String,
}

impl TextElement {
    /// Create a text element.
    pub fn new(font_size: Option<f32>, content: impl Into<String>) -> Self {
        Self {
            font_size,
            content: content.into(),
        }
    }
}

/// Where an image's payload comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Raw image bytes found inside the document.
    Embedded {
        /// Encoded image payload
        data: Vec<u8>,
        /// Zero-based page the image was found on (PDF only)
        page: Option<u32>,
    },
    /// An absolute (or unresolvable relative) image URL.
    Url(String),
}

/// An image reference, optionally enriched with a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageElement {
    /// Image payload or location
    pub source: ImageSource,
    /// Caption/OCR text, present only after advanced extraction
    pub description: Option<String>,
}

impl ImageElement {
    /// An embedded image.
    pub fn embedded(data: Vec<u8>, page: Option<u32>) -> Self {
        Self {
            source: ImageSource::Embedded { data, page },
            description: None,
        }
    }

    /// A URL-addressed image.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            source: ImageSource::Url(url.into()),
            description: None,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether the payload is embedded bytes.
    pub fn is_embedded(&self) -> bool {
        matches!(self.source, ImageSource::Embedded { .. })
    }
}

/// A rectangular text grid. Row 0 is the header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableElement {
    /// Rows of cell text
    pub rows: Vec<Vec<String>>,
}

impl TableElement {
    /// Create a table from rows.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Build a table from anything that yields rows of strings.
    pub fn from_rows<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// Number of rows including the header.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the header row.
    pub fn column_count(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A single list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItemElement {
    /// Item text (inline Markdown)
    pub text: String,
    /// Numbered vs bulleted
    pub ordered: bool,
    /// Nesting level, 1 = top level
    pub level: u8,
}

impl ListItemElement {
    /// Create a list item. Levels below 1 are raised to 1.
    pub fn new(text: impl Into<String>, ordered: bool, level: u8) -> Self {
        Self {
            text: text.into(),
            ordered,
            level: level.max(1),
        }
    }
}

/// A single element of a document, in reading order.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Unclassified PDF text line
    Text(TextElement),
    /// Heading with its level (1 = top)
    Heading {
        /// Heading level
        level: u8,
        /// Heading text
        text: String,
    },
    /// Body paragraph (inline Markdown)
    Paragraph(String),
    /// List entry
    ListItem(ListItemElement),
    /// Table
    Table(TableElement),
    /// Image
    Image(ImageElement),
    /// Pre-rendered Markdown block (code fences, quotes, rules)
    Block(String),
}

impl Element {
    /// Create a heading element.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Element::Heading {
            level,
            text: text.into(),
        }
    }

    /// Create a paragraph element.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Element::Paragraph(text.into())
    }

    /// Text that counts toward the document's word count.
    pub fn prose(&self) -> Option<&str> {
        match self {
            Element::Text(t) => Some(&t.content),
            Element::Heading { text, .. } => Some(text),
            Element::Paragraph(text) => Some(text),
            Element::ListItem(item) => Some(&item.text),
            Element::Table(_) | Element::Image(_) | Element::Block(_) => None,
        }
    }

    /// Check if this is an image element.
    pub fn is_image(&self) -> bool {
        matches!(self, Element::Image(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_dimensions() {
        let table = TableElement::from_rows([["a", "b", "c"], ["1", "2", "3"]]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 3);
        assert!(!table.is_empty());
        assert_eq!(TableElement::default().column_count(), 0);
    }

    #[test]
    fn test_list_level_floor() {
        assert_eq!(ListItemElement::new("x", false, 0).level, 1);
        assert_eq!(ListItemElement::new("x", true, 3).level, 3);
    }

    #[test]
    fn test_prose() {
        assert_eq!(Element::heading(2, "Intro").prose(), Some("Intro"));
        assert_eq!(Element::Image(ImageElement::url("https://x/a.png")).prose(), None);
        assert_eq!(Element::Table(TableElement::default()).prose(), None);
    }
}
