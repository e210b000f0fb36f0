//! # deepdoc
//!
//! Layout-aware conversion of PDF, DOCX, HTML and CSV documents to Markdown.
//!
//! Every format is parsed into an ordered sequence of typed elements
//! (text, headings, lists, tables, images) that the Markdown assembler then
//! joins. PDF headings are inferred from font sizes and numbering patterns.
//!
//! ## Quick Start
//!
//! ```no_run
//! use deepdoc::convert_file;
//!
//! fn main() -> deepdoc::Result<()> {
//!     let markdown = convert_file("document.pdf")?;
//!     println!("{}", markdown);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Reading order**: text, images and tables interleaved as they appear
//! - **Heading inference**: 80th-percentile font cutoff plus numbering rules
//! - **Image descriptions**: pluggable captioning/OCR provider with memoization
//! - **Azure AI Vision** client behind the `azure` feature

pub mod convert;
pub mod delivery;
pub mod describe;
pub mod detect;
pub mod enhance;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use convert::{extractor_for, ConvertOptions, ConvertResult, Converter, Extractor};
pub use delivery::{Delivery, DeliveryJob, DeliverySink, JobStatus};
pub use describe::{DescribeOptions, Description, ImageDescriber, VisionAnalysis, VisionProvider};
pub use detect::DocumentType;
pub use enhance::{Enhanced, Enhancer, PassthroughEnhancer};
pub use error::{Error, Result};
pub use model::{
    Document, Element, FileInfo, ImageElement, ImageSource, ListItemElement, TableElement,
    TextElement,
};
pub use parser::{ErrorMode, ParseOptions};

use std::path::Path;

/// Convert a file to Markdown without image descriptions.
///
/// The format is chosen from the file extension.
///
/// # Example
///
/// ```no_run
/// let markdown = deepdoc::convert_file("report.docx").unwrap();
/// std::fs::write("report.md", markdown).unwrap();
/// ```
pub fn convert_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let result = Converter::new().convert_file(path, &ConvertOptions::default())?;
    Ok(result.markdown)
}

/// Convert bytes to Markdown without image descriptions.
///
/// # Arguments
///
/// * `ext` - File extension, with or without the leading dot
/// * `data` - Document content
///
/// # Example
///
/// ```
/// let md = deepdoc::convert_bytes("csv", b"header1,header2\nvalue1,value2\n".to_vec()).unwrap();
/// assert!(md.starts_with("| header1 | header2 |"));
/// ```
pub fn convert_bytes(ext: &str, data: Vec<u8>) -> Result<String> {
    let mut extractor = extractor_for(ext, ImageDescriber::disabled())?;
    extractor.load(data);
    extractor.basic_extract()
}

/// Read document statistics for a file.
pub fn document_info<P: AsRef<Path>>(path: P) -> Result<FileInfo> {
    let path = path.as_ref();
    let doc_type = DocumentType::from_path(path)?;
    let mut extractor = Extractor::new(doc_type, ImageDescriber::disabled());
    extractor.load(std::fs::read(path)?);
    extractor.document_info()
}

/// Extract a document's element sequence without image descriptions.
pub fn extract_bytes(ext: &str, data: Vec<u8>) -> Result<Document> {
    let mut extractor = extractor_for(ext, ImageDescriber::disabled())?;
    extractor.load(data);
    extractor.extract_document(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_bytes_routes() {
        let md = convert_bytes(".HTML", b"<h2>Intro</h2>".to_vec()).unwrap();
        assert_eq!(md, "## Intro");
        assert!(matches!(convert_bytes("xlsx", vec![]), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_extract_bytes_renders_idempotently() {
        let doc = extract_bytes("html", b"<h1>A</h1><ul><li>x</li><li>y</li></ul>".to_vec()).unwrap();
        let first = render::to_markdown(&doc).unwrap();
        let second = render::to_markdown(&doc).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "# A\n\n- x\n- y");
    }
}
