//! Image description.
//!
//! [`ImageDescriber`] sits between the extractors and an external
//! captioning/OCR service. It checks pixel dimensions before any call,
//! bounds each call with a timeout, and memoizes results by exact content.
//! Failures never propagate: they become a [`Description`] whose text is a
//! fixed fallback message.

#[cfg(feature = "azure")]
mod azure;
mod cache;

#[cfg(feature = "azure")]
pub use azure::AzureVisionClient;
pub use cache::DescriptionCache;

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use image::ImageReader;

use crate::error::{Error, Result};

/// Shown when the provider fails or times out.
pub const UNAVAILABLE_MESSAGE: &str = "Image description unavailable";

/// Shown when an image is too small or too large to analyze.
pub const UNSUPPORTED_DIMENSIONS_MESSAGE: &str =
    "Image description unavailable due to unsupported dimensions";

/// Default smallest accepted width and height.
pub const DEFAULT_MIN_DIMENSION: u32 = 50;

/// Default largest accepted width and height.
pub const DEFAULT_MAX_DIMENSION: u32 = 16000;

/// Raw result from a captioning/OCR provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisionAnalysis {
    /// Generated caption, if any
    pub caption: Option<String>,
    /// Recognized text lines in reading order
    pub ocr_lines: Vec<String>,
}

impl VisionAnalysis {
    /// Recognized text joined with single spaces.
    pub fn ocr_text(&self) -> String {
        self.ocr_lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// An external captioning/OCR service.
pub trait VisionProvider: Send + Sync {
    /// Analyze encoded image bytes.
    fn analyze(&self, image: &[u8]) -> Result<VisionAnalysis>;

    /// Analyze an image the service fetches itself.
    fn analyze_url(&self, url: &str) -> Result<VisionAnalysis>;
}

/// Describer configuration.
#[derive(Debug, Clone)]
pub struct DescribeOptions {
    /// Smallest accepted width and height
    pub min_dimension: u32,
    /// Largest accepted width and height
    pub max_dimension: u32,
    /// Upper bound on one provider call
    pub timeout: Duration,
    /// Memoized results kept per describer
    pub cache_capacity: usize,
}

impl Default for DescribeOptions {
    fn default() -> Self {
        Self {
            min_dimension: DEFAULT_MIN_DIMENSION,
            max_dimension: DEFAULT_MAX_DIMENSION,
            timeout: Duration::from_secs(30),
            cache_capacity: 256,
        }
    }
}

impl DescribeOptions {
    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the memo table size.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    fn accepts(&self, width: u32, height: u32) -> bool {
        let range = self.min_dimension..=self.max_dimension;
        range.contains(&width) && range.contains(&height)
    }
}

/// Outcome of describing one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Description {
    /// The provider produced a caption and/or text
    Generated(String),
    /// Dimensions were outside the accepted range; the provider was not called
    UnsupportedDimensions,
    /// The provider could not be used
    Unavailable(String),
}

impl Description {
    /// Text to place in the Markdown.
    pub fn text(&self) -> &str {
        match self {
            Description::Generated(text) => text,
            Description::UnsupportedDimensions => UNSUPPORTED_DIMENSIONS_MESSAGE,
            Description::Unavailable(_) => UNAVAILABLE_MESSAGE,
        }
    }

    /// Whether a fallback message was used.
    pub fn is_fallback(&self) -> bool {
        !matches!(self, Description::Generated(_))
    }
}

/// How caption and OCR text are joined.
#[derive(Debug, Clone, Copy)]
enum Joiner {
    Bytes,
    Url,
}

impl Joiner {
    fn combine(self, analysis: &VisionAnalysis) -> Description {
        let caption = analysis
            .caption
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let ocr = analysis.ocr_text();

        match (caption, ocr.is_empty()) {
            (None, true) => Description::Unavailable("provider returned no caption".to_string()),
            (caption, true) => Description::Generated(caption.unwrap_or(UNAVAILABLE_MESSAGE).to_string()),
            (caption, false) => {
                let caption = caption.unwrap_or(UNAVAILABLE_MESSAGE);
                Description::Generated(match self {
                    Joiner::Bytes => format!("{} - {}", caption, ocr),
                    Joiner::Url => format!("{} - OCR: {}", caption, ocr),
                })
            }
        }
    }
}

/// Memoizing adapter over an optional provider.
///
/// Without a provider every in-range image is described as unavailable.
pub struct ImageDescriber {
    provider: Option<Arc<dyn VisionProvider>>,
    options: DescribeOptions,
    by_content: DescriptionCache<Vec<u8>, Description>,
    by_url: DescriptionCache<String, Description>,
}

impl std::fmt::Debug for ImageDescriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageDescriber")
            .field("has_provider", &self.provider.is_some())
            .field("options", &self.options)
            .field("cached", &(self.by_content.len() + self.by_url.len()))
            .finish()
    }
}

impl Default for ImageDescriber {
    fn default() -> Self {
        Self::disabled()
    }
}

impl Clone for ImageDescriber {
    /// Shares the provider; the clone starts with empty caches.
    fn clone(&self) -> Self {
        Self::with_options(self.provider.clone(), self.options.clone())
    }
}

impl ImageDescriber {
    /// Create a describer backed by `provider`.
    pub fn new(provider: Arc<dyn VisionProvider>) -> Self {
        Self::with_options(Some(provider), DescribeOptions::default())
    }

    /// Create a describer with no provider.
    pub fn disabled() -> Self {
        Self::with_options(None, DescribeOptions::default())
    }

    /// Create a describer with explicit options.
    pub fn with_options(provider: Option<Arc<dyn VisionProvider>>, options: DescribeOptions) -> Self {
        Self {
            by_content: DescriptionCache::new(options.cache_capacity),
            by_url: DescriptionCache::new(options.cache_capacity),
            provider,
            options,
        }
    }

    /// Whether a provider is configured.
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Describe encoded image bytes.
    pub fn describe(&mut self, image: &[u8]) -> Description {
        match image_dimensions(image) {
            Ok((width, height)) if !self.options.accepts(width, height) => {
                log::error!(
                    "Image dimensions {}x{} are out of supported range ({}x{} to {}x{})",
                    width,
                    height,
                    self.options.min_dimension,
                    self.options.min_dimension,
                    self.options.max_dimension,
                    self.options.max_dimension
                );
                return Description::UnsupportedDimensions;
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("Cannot read image dimensions: {}", e);
                return Description::Unavailable(e.to_string());
            }
        }

        let key = image.to_vec();
        if let Some(cached) = self.by_content.get(&key) {
            return cached;
        }

        let data = key.clone();
        let description = self.call(Joiner::Bytes, move |provider| provider.analyze(&data));
        self.by_content.insert(key, description.clone());
        description
    }

    /// Describe an image by URL.
    pub fn describe_url(&mut self, url: &str) -> Description {
        let key = url.to_string();
        if let Some(cached) = self.by_url.get(&key) {
            return cached;
        }

        let target = key.clone();
        let description = self.call(Joiner::Url, move |provider| provider.analyze_url(&target));
        self.by_url.insert(key, description.clone());
        description
    }

    /// Run one provider call on a worker thread, bounded by the timeout.
    fn call<F>(&self, joiner: Joiner, request: F) -> Description
    where
        F: FnOnce(&dyn VisionProvider) -> Result<VisionAnalysis> + Send + 'static,
    {
        let Some(provider) = self.provider.clone() else {
            return Description::Unavailable("no provider configured".to_string());
        };

        let (tx, rx) = crossbeam_channel::bounded(1);
        let spawned = std::thread::Builder::new()
            .name("deepdoc-vision".to_string())
            .spawn(move || {
                let _ = tx.send(request(provider.as_ref()));
            });
        if let Err(e) = spawned {
            log::error!("Failed to start vision request: {}", e);
            return Description::Unavailable(e.to_string());
        }

        let outcome = match rx.recv_timeout(self.options.timeout) {
            Ok(result) => result,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => Err(Error::DescriptionUnavailable(
                format!("timed out after {:?}", self.options.timeout),
            )),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => Err(
                Error::DescriptionUnavailable("provider thread exited".to_string()),
            ),
        };

        match outcome {
            Ok(analysis) => joiner.combine(&analysis),
            Err(e) => {
                log::error!("Error generating image description: {}", e);
                Description::Unavailable(e.to_string())
            }
        }
    }
}

/// Read width and height from an encoded image header.
pub fn image_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| Error::DescriptionUnavailable(format!("unreadable image: {}", e)))
}
