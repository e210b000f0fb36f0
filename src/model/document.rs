//! Document-level types.

use super::Element;
use crate::detect::DocumentType;
use serde::{Deserialize, Serialize};

/// An extracted document: ordered elements plus the source size.
///
/// Built once per conversion and never shared between conversions.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Source format
    pub doc_type: DocumentType,

    /// Elements in reading order
    pub elements: Vec<Element>,

    /// Size of the source bytes
    pub file_size: usize,
}

impl Document {
    /// Create a document from its elements.
    pub fn new(doc_type: DocumentType, elements: Vec<Element>, file_size: usize) -> Self {
        Self {
            doc_type,
            elements,
            file_size,
        }
    }

    /// Whitespace-separated words across all prose elements.
    pub fn word_count(&self) -> usize {
        self.elements
            .iter()
            .filter_map(Element::prose)
            .map(|t| t.split_whitespace().count())
            .sum()
    }

    /// Number of image elements.
    pub fn image_count(&self) -> usize {
        self.elements.iter().filter(|e| e.is_image()).count()
    }

    /// Check if the document has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Prose-style statistics for this document.
    pub fn info(&self) -> FileInfo {
        FileInfo::Prose {
            doc_type: self.doc_type,
            word_count: self.word_count(),
            image_count: self.image_count(),
            file_size: self.file_size,
        }
    }
}

/// Basic statistics reported alongside the Markdown.
///
/// Serializes to the `file_info` object of the upload response: prose formats
/// carry word and image counts, tabular formats carry row and column counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileInfo {
    /// PDF, DOCX and HTML documents
    Prose {
        /// Source format
        #[serde(rename = "type")]
        doc_type: DocumentType,
        /// Number of words
        word_count: usize,
        /// Number of images
        image_count: usize,
        /// Source size in bytes
        file_size: usize,
    },
    /// CSV documents
    Tabular {
        /// Source format
        #[serde(rename = "type")]
        doc_type: DocumentType,
        /// Number of data rows (header excluded)
        row_count: usize,
        /// Number of columns
        col_count: usize,
        /// Source size in bytes
        file_size: usize,
    },
}

impl FileInfo {
    /// Source format.
    pub fn doc_type(&self) -> DocumentType {
        match self {
            FileInfo::Prose { doc_type, .. } | FileInfo::Tabular { doc_type, .. } => *doc_type,
        }
    }

    /// Number of images; tabular documents have none.
    pub fn image_count(&self) -> usize {
        match self {
            FileInfo::Prose { image_count, .. } => *image_count,
            FileInfo::Tabular { .. } => 0,
        }
    }

    /// Source size in bytes.
    pub fn file_size(&self) -> usize {
        match self {
            FileInfo::Prose { file_size, .. } | FileInfo::Tabular { file_size, .. } => *file_size,
        }
    }
}
