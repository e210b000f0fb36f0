//! Parsing options and configuration.

/// Default percentile used as the heading-candidacy cutoff.
pub const DEFAULT_HEADING_PERCENTILE: f32 = 0.8;

/// Default upper bound on heading length, in characters.
pub const DEFAULT_MAX_HEADING_LEN: usize = 100;

/// Options for extracting elements from a document.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Fraction of font sizes that fall at or below the heading cutoff
    pub heading_percentile: f32,

    /// Longest text (in characters) still considered a heading
    pub max_heading_len: usize,

    /// Whether to run the image pass for PDF documents
    pub extract_images: bool,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip pages whose content cannot be decoded).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set the heading percentile, clamped to `0.0..=1.0`.
    pub fn with_heading_percentile(mut self, percentile: f32) -> Self {
        self.heading_percentile = percentile.clamp(0.0, 1.0);
        self
    }

    /// Set the maximum heading length.
    pub fn with_max_heading_len(mut self, len: usize) -> Self {
        self.max_heading_len = len;
        self
    }

    /// Enable or disable the image pass.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            heading_percentile: DEFAULT_HEADING_PERCENTILE,
            max_heading_len: DEFAULT_MAX_HEADING_LEN,
            extract_images: false,
        }
    }
}

/// Error handling mode during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    #[default]
    Strict,
    /// Skip invalid content and continue
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .lenient()
            .with_heading_percentile(1.5)
            .with_max_heading_len(40)
            .with_images(true);

        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert_eq!(options.heading_percentile, 1.0);
        assert_eq!(options.max_heading_len, 40);
        assert!(options.extract_images);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert_eq!(options.heading_percentile, 0.8);
        assert_eq!(options.max_heading_len, 100);
        assert!(!options.extract_images);
    }
}
