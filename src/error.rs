//! Error types for deepdoc.

use std::io;
use thiserror::Error;

/// Result type alias for deepdoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during document conversion.
///
/// Structural variants abort a conversion. Enrichment variants
/// (`DescriptionUnavailable`, `EnhancementUnavailable`, `Delivery`) are
/// produced by collaborators and are normally replaced by a fallback
/// before they reach the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file extension does not map to any extractor.
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// An extractor was invoked before any document bytes were loaded.
    #[error("No file data is configured")]
    NoFileConfigured,

    /// A table with zero rows cannot be rendered.
    #[error("Table has no rows")]
    EmptyTable,

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// Error reading the DOCX container or its XML parts.
    #[error("DOCX parsing error: {0}")]
    Docx(String),

    /// Error parsing HTML input.
    #[error("HTML parsing error: {0}")]
    Html(String),

    /// Error reading CSV records.
    #[error("CSV parsing error: {0}")]
    Csv(String),

    /// The captioning/OCR provider failed or timed out.
    #[error("Image description unavailable: {0}")]
    DescriptionUnavailable(String),

    /// The text enhancer failed.
    #[error("Enhancement unavailable: {0}")]
    EnhancementUnavailable(String),

    /// Out-of-band delivery of a result failed.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error comes from parsing the document itself.
    ///
    /// Structural failures propagate to the caller as an extraction failure;
    /// everything else is an enrichment failure that degrades output.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            Error::DescriptionUnavailable(_) | Error::EnhancementUnavailable(_) | Error::Delivery(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::Docx(err.to_string()),
        }
    }
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::Docx(format!("malformed XML: {}", err))
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err.to_string())
    }
}
