//! Text enhancement boundary.
//!
//! An [`Enhancer`] post-processes converted Markdown (typically with a
//! language model). Either step may fail; [`enhance_markdown`] then keeps the
//! input text and records why.

use crate::detect::DocumentType;
use crate::error::Result;

/// Language the translation step targets.
pub const TARGET_LANGUAGE: &str = "en";

/// Post-processes converted Markdown.
pub trait Enhancer: Send + Sync {
    /// Repair malformed or incomplete Markdown.
    fn enhance(&self, markdown: &str, doc_type: DocumentType) -> Result<String>;

    /// Translate text into `language`.
    fn translate(&self, text: &str, language: &str) -> Result<String>;
}

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughEnhancer;

impl Enhancer for PassthroughEnhancer {
    fn enhance(&self, markdown: &str, _doc_type: DocumentType) -> Result<String> {
        Ok(markdown.to_string())
    }

    fn translate(&self, text: &str, _language: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

/// Enhanced text, plus the reason a step fell back if one did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enhanced {
    /// Resulting Markdown
    pub text: String,
    /// Error message of the first step that failed
    pub fallback_reason: Option<String>,
}

impl Enhanced {
    /// Whether any step kept its input because it failed.
    pub fn used_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Run `enhance` then `translate`, keeping the input of any failing step.
pub fn enhance_markdown(enhancer: &dyn Enhancer, markdown: &str, doc_type: DocumentType) -> Enhanced {
    let mut fallback_reason = None;

    let enhanced = match enhancer.enhance(markdown, doc_type) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Enhancement failed, keeping extracted text: {}", e);
            fallback_reason = Some(e.to_string());
            markdown.to_string()
        }
    };

    let text = match enhancer.translate(&enhanced, TARGET_LANGUAGE) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Translation failed, keeping untranslated text: {}", e);
            fallback_reason.get_or_insert(e.to_string());
            enhanced
        }
    };

    Enhanced { text, fallback_reason }
}
