//! Per-format extractors behind one capability set.

use crate::describe::ImageDescriber;
use crate::detect::DocumentType;
use crate::error::{Error, Result};
use crate::model::{Document, Element, FileInfo, ImageSource};
use crate::parser::{
    classify_headings, parse_csv, parse_docx, parse_html, ParseOptions, PdfLayoutExtractor,
};
use crate::render::{render_table, to_markdown};

/// Pick the extractor for a file extension.
///
/// The extension is normalized first (`".PDF"` and `"pdf"` are the same).
/// Unknown extensions fail with [`Error::UnsupportedFormat`].
pub fn extractor_for(ext: &str, describer: ImageDescriber) -> Result<Extractor> {
    Ok(Extractor::new(DocumentType::from_extension(ext)?, describer))
}

/// One extractor per supported format.
///
/// Every variant supports basic extraction, advanced extraction and document
/// info. Basic extraction never contacts the image describer.
#[derive(Debug)]
pub enum Extractor {
    /// PDF layout extraction with heading inference
    Pdf {
        /// Loaded bytes
        data: Option<Vec<u8>>,
        /// Parser configuration
        options: ParseOptions,
        /// Describer for advanced mode
        describer: ImageDescriber,
    },
    /// DOCX block walk
    Docx {
        /// Loaded bytes
        data: Option<Vec<u8>>,
        /// Describer for advanced mode
        describer: ImageDescriber,
    },
    /// CSV to a pipe table
    Csv {
        /// Loaded bytes
        data: Option<Vec<u8>>,
    },
    /// HTML DOM walk
    Html {
        /// Loaded bytes
        data: Option<Vec<u8>>,
        /// Describer for advanced mode
        describer: ImageDescriber,
    },
}

impl Extractor {
    /// Create an empty extractor for `doc_type`.
    pub fn new(doc_type: DocumentType, describer: ImageDescriber) -> Self {
        match doc_type {
            DocumentType::Pdf => Extractor::Pdf {
                data: None,
                options: ParseOptions::default(),
                describer,
            },
            DocumentType::Docx => Extractor::Docx {
                data: None,
                describer,
            },
            DocumentType::Csv => Extractor::Csv { data: None },
            DocumentType::Html => Extractor::Html {
                data: None,
                describer,
            },
        }
    }

    /// Replace the PDF parser options. Other formats ignore them.
    pub fn with_parse_options(mut self, parse: ParseOptions) -> Self {
        if let Extractor::Pdf { options, .. } = &mut self {
            *options = parse;
        }
        self
    }

    /// Format handled by this extractor.
    pub fn doc_type(&self) -> DocumentType {
        match self {
            Extractor::Pdf { .. } => DocumentType::Pdf,
            Extractor::Docx { .. } => DocumentType::Docx,
            Extractor::Csv { .. } => DocumentType::Csv,
            Extractor::Html { .. } => DocumentType::Html,
        }
    }

    /// Set the document bytes, replacing any earlier ones.
    pub fn load(&mut self, bytes: Vec<u8>) {
        if !self.doc_type().matches_magic(&bytes) {
            log::warn!("Content does not look like {}", self.doc_type().label());
        }
        *self.data_mut() = Some(bytes);
    }

    /// Whether bytes have been loaded.
    pub fn is_loaded(&self) -> bool {
        self.data().is_some()
    }

    /// Markdown without image descriptions.
    pub fn basic_extract(&mut self) -> Result<String> {
        self.markdown(false)
    }

    /// Markdown with every image described.
    pub fn advanced_extract(&mut self) -> Result<String> {
        self.markdown(true)
    }

    /// Word, image or row counts for the loaded document.
    pub fn document_info(&self) -> Result<FileInfo> {
        let data = self.data().ok_or(Error::NoFileConfigured)?;
        let file_size = data.len();
        let doc_type = self.doc_type();

        let info = match self {
            Extractor::Pdf { options, .. } => {
                // Info always counts images, even though basic output has none
                let options = options.clone().with_images(true);
                let elements = PdfLayoutExtractor::from_bytes(data, options)?.extract()?;
                Document::new(doc_type, elements, file_size).info()
            }
            Extractor::Docx { .. } => {
                let content = parse_docx(data)?;
                FileInfo::Prose {
                    doc_type,
                    word_count: content.word_count,
                    image_count: content.image_count,
                    file_size,
                }
            }
            Extractor::Html { .. } => {
                let content = parse_html(data)?;
                FileInfo::Prose {
                    doc_type,
                    word_count: content.word_count,
                    image_count: content.image_count,
                    file_size,
                }
            }
            Extractor::Csv { .. } => {
                let content = parse_csv(data)?;
                FileInfo::Tabular {
                    doc_type,
                    row_count: content.row_count,
                    col_count: content.col_count,
                    file_size,
                }
            }
        };
        Ok(info)
    }

    /// Extract the ordered element sequence.
    ///
    /// With `advanced`, image elements carry descriptions.
    pub fn extract_document(&mut self, advanced: bool) -> Result<Document> {
        let doc_type = self.doc_type();
        let data = self.data().ok_or(Error::NoFileConfigured)?;
        let file_size = data.len();

        let elements = match &*self {
            Extractor::Pdf { options, .. } => {
                let options = options.clone().with_images(advanced);
                let raw = PdfLayoutExtractor::from_bytes(data, options.clone())?.extract()?;
                classify_headings(raw, &options)
            }
            Extractor::Docx { .. } => parse_docx(data)?.elements,
            Extractor::Html { .. } => parse_html(data)?.elements,
            Extractor::Csv { .. } => vec![Element::Table(parse_csv(data)?.table)],
        };

        let mut doc = Document::new(doc_type, elements, file_size);
        if advanced {
            if let Some(describer) = self.describer_mut() {
                describe_images(&mut doc.elements, describer);
            }
        }
        Ok(doc)
    }

    fn markdown(&mut self, advanced: bool) -> Result<String> {
        if let Extractor::Csv { data } = &*self {
            let data = data.as_deref().ok_or(Error::NoFileConfigured)?;
            return render_table(&parse_csv(data)?.table);
        }
        to_markdown(&self.extract_document(advanced)?)
    }

    fn data(&self) -> Option<&[u8]> {
        match self {
            Extractor::Pdf { data, .. }
            | Extractor::Docx { data, .. }
            | Extractor::Csv { data }
            | Extractor::Html { data, .. } => data.as_deref(),
        }
    }

    fn data_mut(&mut self) -> &mut Option<Vec<u8>> {
        match self {
            Extractor::Pdf { data, .. }
            | Extractor::Docx { data, .. }
            | Extractor::Csv { data }
            | Extractor::Html { data, .. } => data,
        }
    }

    fn describer_mut(&mut self) -> Option<&mut ImageDescriber> {
        match self {
            Extractor::Pdf { describer, .. }
            | Extractor::Docx { describer, .. }
            | Extractor::Html { describer, .. } => Some(describer),
            Extractor::Csv { .. } => None,
        }
    }
}

/// Attach a description to every image, in document order.
fn describe_images(elements: &mut [Element], describer: &mut ImageDescriber) {
    for element in elements.iter_mut() {
        if let Element::Image(image) = element {
            let description = match &image.source {
                ImageSource::Embedded { data, .. } => describer.describe(data),
                ImageSource::Url(url) => describer.describe_url(url),
            };
            image.description = Some(description.text().to_string());
        }
    }
}
