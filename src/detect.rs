//! Document type detection from file extensions and magic bytes.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The document formats deepdoc can convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentType {
    /// Portable Document Format
    Pdf,
    /// Office Open XML word-processing document
    Docx,
    /// Comma-separated values
    Csv,
    /// HTML page
    Html,
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
/// ZIP local file header, shared by every OOXML container.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

impl DocumentType {
    /// Every supported type, in router order.
    pub const ALL: [DocumentType; 4] = [
        DocumentType::Pdf,
        DocumentType::Docx,
        DocumentType::Csv,
        DocumentType::Html,
    ];

    /// Map a file extension to a document type.
    ///
    /// The extension is normalized first: surrounding whitespace and a single
    /// leading dot are removed and the result is lowercased, so `".PDF"` and
    /// `"pdf"` are equivalent.
    pub fn from_extension(ext: &str) -> Result<Self> {
        let normalized = normalize_extension(ext);
        match normalized.as_str() {
            "pdf" => Ok(DocumentType::Pdf),
            "docx" => Ok(DocumentType::Docx),
            "csv" => Ok(DocumentType::Csv),
            "html" => Ok(DocumentType::Html),
            _ => Err(Error::UnsupportedFormat(normalized)),
        }
    }

    /// Map a file path to a document type by its extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
        Self::from_extension(ext)
    }

    /// Canonical lowercase extension.
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentType::Pdf => "pdf",
            DocumentType::Docx => "docx",
            DocumentType::Csv => "csv",
            DocumentType::Html => "html",
        }
    }

    /// Uppercase label used in document info (`"PDF"`, `"DOCX"`, ...).
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Pdf => "PDF",
            DocumentType::Docx => "DOCX",
            DocumentType::Csv => "CSV",
            DocumentType::Html => "HTML",
        }
    }

    /// Check whether `data` plausibly holds a document of this type.
    ///
    /// Only binary formats have a signature; CSV and HTML always pass.
    pub fn matches_magic(&self, data: &[u8]) -> bool {
        match self {
            DocumentType::Pdf => data.starts_with(PDF_MAGIC),
            DocumentType::Docx => data.starts_with(ZIP_MAGIC),
            DocumentType::Csv | DocumentType::Html => true,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalize an extension: trim, drop one leading dot, lowercase.
pub fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim();
    trimmed
        .strip_prefix('.')
        .unwrap_or(trimmed)
        .to_lowercase()
}
