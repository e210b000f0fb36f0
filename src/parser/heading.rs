//! Heading inference for PDF text lines.
//!
//! A line becomes a heading when its font size is above a document-wide
//! percentile cutoff and it is short enough. Its level comes from a section
//! number prefix when one is present (`2.1.3 `, `2.1 `, `2 `), otherwise from
//! how its size ranks against the three largest sizes in the document.

use once_cell::sync::Lazy;
use regex::Regex;

use super::options::ParseOptions;
use crate::model::{Element, TextElement};

static LEVEL3_NUMBERING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+\s+").unwrap());
static LEVEL2_NUMBERING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+\s+").unwrap());
static LEVEL1_NUMBERING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\s+").unwrap());

/// Level given to candidates smaller than the third-largest size.
const FALLBACK_LEVEL: u8 = 4;

/// Font-size statistics a document's headings are judged against.
///
/// Computed once from every text line before any line is classified.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingThresholds {
    /// Percentile cutoff a size must exceed to be a heading candidate
    pub cutoff: f32,
    /// Up to three largest distinct sizes, descending
    pub top_sizes: Vec<f32>,
    /// Longest text still considered a heading
    pub max_len: usize,
}

impl HeadingThresholds {
    /// Compute thresholds from the observed font sizes.
    pub fn from_sizes(sizes: &[f32], percentile: f32, max_len: usize) -> Self {
        Self {
            cutoff: percentile_of(sizes, percentile).unwrap_or(0.0),
            top_sizes: top_distinct(sizes, 3),
            max_len,
        }
    }

    /// Compute thresholds from the sized text elements in `elements`.
    pub fn from_elements(elements: &[Element], options: &ParseOptions) -> Self {
        let sizes: Vec<f32> = elements
            .iter()
            .filter_map(|e| match e {
                Element::Text(t) => t.font_size,
                _ => None,
            })
            .collect();
        Self::from_sizes(&sizes, options.heading_percentile, options.max_heading_len)
    }

    /// Whether a line is a heading candidate.
    pub fn is_candidate(&self, font_size: f32, content: &str) -> bool {
        font_size > self.cutoff && content.chars().count() <= self.max_len
    }

    /// Level for a heading candidate.
    pub fn level(&self, font_size: f32, content: &str) -> u8 {
        if LEVEL3_NUMBERING.is_match(content) {
            return 3;
        }
        if LEVEL2_NUMBERING.is_match(content) {
            return 2;
        }
        if LEVEL1_NUMBERING.is_match(content) {
            return 1;
        }

        self.top_sizes
            .iter()
            .position(|&top| font_size >= top)
            .map(|i| i as u8 + 1)
            .unwrap_or(FALLBACK_LEVEL)
    }

    /// Classify one text line.
    ///
    /// Returns `None` for dash-only artifact lines.
    pub fn classify(&self, text: &TextElement) -> Option<Element> {
        let content = text.content.trim();
        if content == "-" {
            return None;
        }

        match text.font_size {
            Some(size) if self.is_candidate(size, content) => {
                Some(Element::heading(self.level(size, content), content))
            }
            _ => Some(Element::paragraph(content)),
        }
    }
}

/// Replace every text line with a heading or paragraph.
///
/// Non-text elements keep their position.
pub fn classify_headings(elements: Vec<Element>, options: &ParseOptions) -> Vec<Element> {
    let thresholds = HeadingThresholds::from_elements(&elements, options);
    log::debug!(
        "Heading cutoff {:.2}, top sizes {:?}",
        thresholds.cutoff,
        thresholds.top_sizes
    );

    elements
        .into_iter()
        .filter_map(|element| match element {
            Element::Text(text) => thresholds.classify(&text),
            other => Some(other),
        })
        .collect()
}

/// Percentile with linear interpolation between closest ranks.
fn percentile_of(values: &[f32], percentile: f32) -> Option<f32> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let last = sorted.len() - 1;
    let rank = f64::from(percentile.clamp(0.0, 1.0)) * last as f64;
    let lo = (rank.floor() as usize).min(last);
    let hi = (rank.ceil() as usize).min(last);
    let frac = rank - lo as f64;
    let lo_value = f64::from(sorted[lo]);
    let hi_value = f64::from(sorted[hi]);

    Some((lo_value + (hi_value - lo_value) * frac) as f32)
}

fn top_distinct(values: &[f32], n: usize) -> Vec<f32> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted.dedup();
    sorted.truncate(n);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(size: f32, content: &str) -> Element {
        Element::Text(TextElement::new(Some(size), content))
    }

    fn thresholds(sizes: &[f32]) -> HeadingThresholds {
        HeadingThresholds::from_sizes(sizes, 0.8, 100)
    }

    #[test]
    fn test_percentile_interpolation() {
        assert_eq!(percentile_of(&[10.0], 0.8), Some(10.0));
        // rank = 0.8 * 4 = 3.2 -> 4 + 0.2 * (5 - 4)
        let p = percentile_of(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.8).unwrap();
        assert!((p - 4.2).abs() < 1e-5);
        assert_eq!(percentile_of(&[], 0.8), None);
    }

    #[test]
    fn test_percentile_out_of_range_is_clamped() {
        assert_eq!(HeadingThresholds::from_sizes(&[10.0, 12.0], 1.5, 100).cutoff, 12.0);
        assert_eq!(HeadingThresholds::from_sizes(&[10.0, 12.0], -0.5, 100).cutoff, 10.0);

        let mut options = ParseOptions::default();
        options.heading_percentile = 1.5;
        let out = classify_headings(vec![text(10.0, "Body"), text(12.0, "Big")], &options);
        assert!(out.iter().all(|e| matches!(e, Element::Paragraph(_))));
    }

    #[test]
    fn test_top_distinct_sizes() {
        assert_eq!(top_distinct(&[12.0, 24.0, 12.0, 18.0, 24.0, 10.0], 3), vec![24.0, 18.0, 12.0]);
        assert_eq!(top_distinct(&[12.0, 12.0], 3), vec![12.0]);
    }

    #[test]
    fn test_numbering_precedence() {
        let t = thresholds(&[10.0, 10.0, 10.0, 10.0, 20.0, 30.0]);
        assert_eq!(t.level(11.0, "2.1.3 Methods"), 3);
        assert_eq!(t.level(30.0, "2.1 Background"), 2);
        assert_eq!(t.level(11.0, "2 Results"), 1);
        // Numbering needs trailing whitespace
        assert_eq!(t.level(30.0, "2.1.3"), 1);
    }

    #[test]
    fn test_size_ranking() {
        let t = thresholds(&[10.0, 14.0, 18.0, 24.0]);
        assert_eq!(t.level(24.0, "Title"), 1);
        assert_eq!(t.level(18.0, "Section"), 2);
        assert_eq!(t.level(14.0, "Subsection"), 3);
        assert_eq!(t.level(12.0, "Minor"), 4);
    }

    #[test]
    fn test_long_candidate_rejected() {
        let t = thresholds(&[10.0, 10.0, 10.0, 10.0, 20.0]);
        let long = "x".repeat(101);
        assert!(!t.is_candidate(20.0, &long));
        assert!(t.is_candidate(20.0, &"x".repeat(100)));
        assert!(!t.is_candidate(10.0, "Body"));
    }

    #[test]
    fn test_classify_sequence() {
        let elements = vec![
            text(24.0, "Document Title"),
            text(10.0, "Body line one."),
            text(10.0, "-"),
            text(10.0, "Body line two."),
            text(10.0, "Body line three."),
            text(10.0, "Body line four."),
            text(10.0, "Body line five."),
            text(16.0, "1.2 Scope"),
        ];
        let out = classify_headings(elements, &ParseOptions::default());
        assert_eq!(
            out,
            vec![
                Element::heading(1, "Document Title"),
                Element::paragraph("Body line one."),
                Element::paragraph("Body line two."),
                Element::paragraph("Body line three."),
                Element::paragraph("Body line four."),
                Element::paragraph("Body line five."),
                Element::heading(2, "1.2 Scope"),
            ]
        );
    }

    #[test]
    fn test_uniform_sizes_have_no_headings() {
        let elements = vec![text(12.0, "One"), text(12.0, "Two")];
        let out = classify_headings(elements, &ParseOptions::default());
        assert!(out.iter().all(|e| matches!(e, Element::Paragraph(_))));
    }

    #[test]
    fn test_thresholds_unchanged_by_classification() {
        let t = thresholds(&[10.0, 10.0, 10.0, 10.0, 20.0]);
        let before = t.clone();
        let _ = t.classify(&TextElement::new(Some(20.0), "Heading"));
        let _ = t.classify(&TextElement::new(Some(10.0), "Body"));
        assert_eq!(t, before);
    }
}
