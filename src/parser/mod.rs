//! Per-format parsing.

pub mod csv;
pub mod docx;
mod heading;
pub mod html;
mod options;
pub mod pdf;

pub use self::csv::{parse_csv, CsvContent};
pub use docx::{parse_docx, DocxContent, ParagraphKind};
pub use heading::{classify_headings, HeadingThresholds};
pub use html::{parse_html, resolve_image_url, HtmlContent};
pub use options::{ErrorMode, ParseOptions};
pub use pdf::PdfLayoutExtractor;
