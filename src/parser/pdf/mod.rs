//! PDF layout extraction.
//!
//! Two passes run over the same document. The image pass records every
//! raster image with its page index. The text pass walks each page's content
//! operations; at every XObject placement the next queued image is spliced in
//! if it belongs to the current page.

mod backend;
mod images;
mod layout;

pub use backend::{decode_text_simple, ContentOp, LopdfBackend, PageId, PdfBackend, PdfValue};
pub use images::{collect_images, encode_png, ColorKind, ImageQueue, PageImage};
pub use layout::{group_spans_into_lines, LayoutAnalyzer, LayoutItem, TextLine, TextSpan};

use crate::error::Result;
use crate::model::{Element, ImageElement};

use super::options::{ErrorMode, ParseOptions};

/// Extracts ordered text and image elements from a PDF.
pub struct PdfLayoutExtractor<B: PdfBackend> {
    backend: B,
    options: ParseOptions,
}

impl PdfLayoutExtractor<LopdfBackend> {
    /// Load a PDF from bytes.
    pub fn from_bytes(data: &[u8], options: ParseOptions) -> Result<Self> {
        Ok(Self::new(LopdfBackend::load_bytes(data)?, options))
    }
}

impl<B: PdfBackend> PdfLayoutExtractor<B> {
    /// Create an extractor over an existing backend.
    pub fn new(backend: B, options: ParseOptions) -> Self {
        Self { backend, options }
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.backend.pages().len()
    }

    /// Run both passes and merge them.
    ///
    /// Text lines become [`Element::Text`]; headings are not classified yet.
    pub fn extract(&self) -> Result<Vec<Element>> {
        let mut queue = if self.options.extract_images {
            ImageQueue::new(collect_images(&self.backend)?)
        } else {
            ImageQueue::default()
        };

        let mut elements = Vec::new();
        for (index, (page_num, page_id)) in self.backend.pages().into_iter().enumerate() {
            let page = index as u32;
            let items = match self.page_layout(page_id) {
                Ok(items) => items,
                Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                    log::warn!("Skipping page {}: {}", page_num, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let before = elements.len();
            for item in items {
                match item {
                    LayoutItem::Line(line) => {
                        if let Some(text) = line.into_element() {
                            elements.push(Element::Text(text));
                        }
                    }
                    LayoutItem::Figure if self.options.extract_images => {
                        match queue.take_for_page(page) {
                            Some(image) => elements.push(Element::Image(ImageElement::embedded(
                                image.data,
                                Some(image.page),
                            ))),
                            None => log::debug!("Figure on page {} has no matching image", page_num),
                        }
                    }
                    LayoutItem::Figure => {}
                }
            }
            log::debug!("Page {}: {} elements", page_num, elements.len() - before);
        }

        if queue.remaining() > 0 {
            log::warn!("{} images could not be matched to a figure and were dropped", queue.remaining());
        }

        Ok(elements)
    }

    fn page_layout(&self, page_id: PageId) -> Result<Vec<LayoutItem>> {
        let content = self.backend.page_content(page_id)?;
        let ops = self.backend.decode_content(&content)?;
        let analyzer = LayoutAnalyzer::new(|font: &[u8], bytes: &[u8]| {
            self.backend.decode_text(page_id, font, bytes)
        });
        Ok(analyzer.analyze(&ops))
    }
}
