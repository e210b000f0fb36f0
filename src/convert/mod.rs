//! Conversion pipeline.
//!
//! A [`Converter`] routes bytes to the [`Extractor`] for their extension,
//! reports document info, and produces Markdown. Advanced conversions also
//! describe images and run the enhancer. When a recipient is given and the
//! document has images, the advanced work is handed to a detached delivery
//! job and the caller gets the basic Markdown right away.
//!
//! # Example
//!
//! ```no_run
//! use deepdoc::convert::{ConvertOptions, Converter};
//!
//! fn main() -> deepdoc::Result<()> {
//!     let converter = Converter::new();
//!     let result = converter.convert_file("report.pdf", &ConvertOptions::default())?;
//!     println!("{}", result.markdown);
//!     Ok(())
//! }
//! ```

mod extractor;

pub use extractor::{extractor_for, Extractor};

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::delivery::{spawn_delivery, Delivery, DeliveryJob, DeliverySink};
use crate::describe::ImageDescriber;
use crate::detect::{normalize_extension, DocumentType};
use crate::enhance::{enhance_markdown, Enhancer, PassthroughEnhancer};
use crate::error::{Error, Result};
use crate::model::FileInfo;
use crate::parser::ParseOptions;

/// Options for one conversion.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Describe images and enhance the Markdown
    pub advanced: bool,

    /// Deliver the advanced result here instead of returning it
    pub recipient: Option<String>,

    /// Name of the uploaded file, used for the delivered attachment
    pub file_name: Option<String>,

    /// PDF parser options
    pub parse: ParseOptions,
}

impl ConvertOptions {
    /// Create default (basic) options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable advanced conversion.
    pub fn with_advanced(mut self, advanced: bool) -> Self {
        self.advanced = advanced;
        self
    }

    /// Set the delivery recipient.
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    /// Set the source file name.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Set PDF parser options.
    pub fn with_parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }
}

/// Result of one conversion.
///
/// Serializes to `{"markdown", "file_info", "isSentEmail"}`.
#[derive(Debug, Serialize)]
pub struct ConvertResult {
    /// Converted Markdown
    pub markdown: String,

    /// Basic document statistics
    pub file_info: FileInfo,

    /// Whether the advanced result was handed to a delivery job
    #[serde(rename = "isSentEmail")]
    pub is_sent_email: bool,

    /// Set when enhancement fell back to the unenhanced text
    #[serde(skip)]
    pub enhancement_fallback: Option<String>,

    /// Handle to the delivery job, if one was started
    #[serde(skip)]
    pub delivery: Option<DeliveryJob>,
}

impl ConvertResult {
    /// Serialize to the JSON response body.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Other(e.to_string()))
    }
}

/// Runs conversions with shared collaborators.
///
/// Each conversion gets its own extractor and its own describer caches.
#[derive(Clone)]
pub struct Converter {
    describer: ImageDescriber,
    enhancer: Arc<dyn Enhancer>,
    sink: Option<Arc<dyn DeliverySink>>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("describer", &self.describer)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    /// Create a converter with no image provider, no enhancement and no delivery.
    pub fn new() -> Self {
        Self {
            describer: ImageDescriber::disabled(),
            enhancer: Arc::new(PassthroughEnhancer),
            sink: None,
        }
    }

    /// Use `describer` for advanced conversions.
    pub fn with_describer(mut self, describer: ImageDescriber) -> Self {
        self.describer = describer;
        self
    }

    /// Use `enhancer` for advanced conversions.
    pub fn with_enhancer(mut self, enhancer: Arc<dyn Enhancer>) -> Self {
        self.enhancer = enhancer;
        self
    }

    /// Deliver advanced results through `sink` when a recipient is given.
    pub fn with_delivery(mut self, sink: Arc<dyn DeliverySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build a loaded extractor for `ext`.
    pub fn extractor(&self, ext: &str, data: Vec<u8>, parse: &ParseOptions) -> Result<Extractor> {
        let mut extractor = extractor_for(ext, self.describer.clone())?.with_parse_options(parse.clone());
        extractor.load(data);
        Ok(extractor)
    }

    /// Convert a file, routing by its extension.
    pub fn convert_file<P: AsRef<Path>>(&self, path: P, options: &ConvertOptions) -> Result<ConvertResult> {
        let path = path.as_ref();
        let doc_type = DocumentType::from_path(path)?;
        let data = std::fs::read(path)?;

        let mut options = options.clone();
        if options.file_name.is_none() {
            options.file_name = path.file_name().and_then(|n| n.to_str()).map(str::to_string);
        }
        self.convert_bytes(doc_type.extension(), data, &options)
    }

    /// Convert bytes whose format is given by `ext`.
    pub fn convert_bytes(&self, ext: &str, data: Vec<u8>, options: &ConvertOptions) -> Result<ConvertResult> {
        let mut extractor = self.extractor(ext, data.clone(), &options.parse)?;
        let doc_type = extractor.doc_type();
        let file_info = extractor.document_info()?;
        log::debug!("{} document info: {:?}", doc_type, file_info);

        if !options.advanced {
            return Ok(ConvertResult {
                markdown: extractor.basic_extract()?,
                file_info,
                is_sent_email: false,
                enhancement_fallback: None,
                delivery: None,
            });
        }

        if let (Some(recipient), Some(sink)) = (&options.recipient, &self.sink) {
            if file_info.image_count() > 0 {
                let markdown = extractor.basic_extract()?;
                let job = self.start_delivery(ext, data, options, recipient.clone(), Arc::clone(sink))?;
                return Ok(ConvertResult {
                    markdown,
                    file_info,
                    is_sent_email: true,
                    enhancement_fallback: None,
                    delivery: Some(job),
                });
            }
        } else if options.recipient.is_some() {
            log::warn!("Recipient given but no delivery sink is configured; converting synchronously");
        }

        let markdown = extractor.advanced_extract()?;
        let enhanced = enhance_markdown(self.enhancer.as_ref(), &markdown, doc_type);
        Ok(ConvertResult {
            markdown: enhanced.text,
            file_info,
            is_sent_email: false,
            enhancement_fallback: enhanced.fallback_reason,
            delivery: None,
        })
    }

    /// Hand the advanced conversion to a detached job with its own extractor.
    fn start_delivery(
        &self,
        ext: &str,
        data: Vec<u8>,
        options: &ConvertOptions,
        recipient: String,
        sink: Arc<dyn DeliverySink>,
    ) -> Result<DeliveryJob> {
        let mut extractor = self.extractor(&normalize_extension(ext), data, &options.parse)?;
        let enhancer = Arc::clone(&self.enhancer);
        let file_name = Delivery::attachment_name(options.file_name.as_deref());

        spawn_delivery(sink, recipient, file_name, move || {
            let markdown = extractor.advanced_extract()?;
            Ok(enhance_markdown(enhancer.as_ref(), &markdown, extractor.doc_type()).text)
        })
    }
}
