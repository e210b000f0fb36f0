//! Text pass: turns a page's content operations into lines and figure marks.
//!
//! Text-showing operators produce positioned spans. Spans are grouped into
//! lines by baseline, in segments delimited by XObject placements (`Do`),
//! so a figure keeps its position relative to the surrounding text.

use unicode_normalization::UnicodeNormalization;

use super::backend::{get_number_from_value, ContentOp, PdfValue};
use crate::model::TextElement;

/// TJ adjustment (in thousandths of text space) treated as a word break.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Default leading used by `T*` when `TL` was never set.
const DEFAULT_LEADING: f32 = 12.0;

/// A text span with position and font size.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Effective font size; `None` if no font was selected
    pub font_size: Option<f32>,
}

/// Spans sharing a baseline, sorted by X position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// The spans in this line
    pub spans: Vec<TextSpan>,
    /// Y position (baseline)
    pub y: f32,
}

impl TextLine {
    /// Create a line from spans, ordering them left to right.
    pub fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.x.total_cmp(&b.x));
        let y = spans.first().map(|s| s.y).unwrap_or(0.0);
        Self { spans, y }
    }

    /// Size of the first span that carries a usable size.
    pub fn font_size(&self) -> Option<f32> {
        self.spans
            .iter()
            .filter_map(|s| s.font_size)
            .find(|size| *size > 0.0)
    }

    /// Combined text of all spans.
    ///
    /// Spans at different X positions are separated by a space unless
    /// both sides are characters of a script written without spaces.
    pub fn text(&self) -> String {
        let mut result = String::new();

        for (i, span) in self.spans.iter().enumerate() {
            if i > 0 {
                let prev = &self.spans[i - 1];
                let gap = span.x - prev.x;
                let prev_last = prev.text.chars().last();
                let curr_first = span.text.chars().next();
                let spaceless = prev_last.map(is_spaceless_script_char).unwrap_or(false)
                    && curr_first.map(is_spaceless_script_char).unwrap_or(false);
                let has_space = prev.text.ends_with(char::is_whitespace)
                    || span.text.starts_with(char::is_whitespace);

                if gap > 0.0 && !spaceless && !has_space {
                    result.push(' ');
                }
            }
            result.push_str(&span.text);
        }

        result
    }

    /// Convert into a text element.
    ///
    /// Lines with no sized span or with only whitespace produce nothing.
    pub fn into_element(self) -> Option<TextElement> {
        let font_size = self.font_size()?;
        let content: String = self.text().trim().nfc().collect();
        if content.is_empty() {
            return None;
        }
        Some(TextElement::new(Some(font_size), content))
    }
}

/// One unit of a page's layout, in content order.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutItem {
    /// A line of text
    Line(TextLine),
    /// An XObject placement
    Figure,
}

/// Walks content operations and produces layout items.
///
/// `decode` maps (font resource name, string bytes) to text.
pub struct LayoutAnalyzer<F>
where
    F: Fn(&[u8], &[u8]) -> String,
{
    decode: F,
    font_name: Vec<u8>,
    font_size: Option<f32>,
    leading: f32,
    matrix: TextMatrix,
    in_text: bool,
    spans: Vec<TextSpan>,
    items: Vec<LayoutItem>,
}

impl<F> LayoutAnalyzer<F>
where
    F: Fn(&[u8], &[u8]) -> String,
{
    /// Create an analyzer using the given text decoder.
    pub fn new(decode: F) -> Self {
        Self {
            decode,
            font_name: Vec::new(),
            font_size: None,
            leading: DEFAULT_LEADING,
            matrix: TextMatrix::default(),
            in_text: false,
            spans: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Process all operations of one page.
    pub fn analyze(mut self, ops: &[ContentOp]) -> Vec<LayoutItem> {
        for op in ops {
            self.apply(op);
        }
        self.flush();
        self.items
    }

    fn apply(&mut self, op: &ContentOp) {
        let num = |i: usize| op.operands.get(i).and_then(get_number_from_value);

        match op.operator.as_str() {
            "BT" => {
                self.in_text = true;
                self.matrix = TextMatrix::default();
            }
            "ET" => {
                self.in_text = false;
            }
            "Tf" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    self.font_name = name.clone();
                }
                self.font_size = num(1);
            }
            "TL" => {
                if let Some(leading) = num(0) {
                    self.leading = leading;
                }
            }
            "Td" => {
                self.matrix.translate(num(0).unwrap_or(0.0), num(1).unwrap_or(0.0));
            }
            "TD" => {
                let ty = num(1).unwrap_or(0.0);
                self.leading = -ty;
                self.matrix.translate(num(0).unwrap_or(0.0), ty);
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    self.matrix.set(
                        num(0).unwrap_or(1.0),
                        num(1).unwrap_or(0.0),
                        num(2).unwrap_or(0.0),
                        num(3).unwrap_or(1.0),
                        num(4).unwrap_or(0.0),
                        num(5).unwrap_or(0.0),
                    );
                }
            }
            "T*" => {
                self.matrix.next_line(self.leading);
            }
            "Tj" => {
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    let text = (self.decode)(&self.font_name, bytes);
                    self.push_span(text);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    let text = self.decode_tj(items);
                    self.push_span(text);
                }
            }
            "'" | "\"" => {
                self.matrix.next_line(self.leading);
                let idx = if op.operator == "\"" { 2 } else { 0 };
                if let Some(PdfValue::Str(bytes)) = op.operands.get(idx) {
                    let text = (self.decode)(&self.font_name, bytes);
                    self.push_span(text);
                }
            }
            "Do" => {
                self.flush();
                self.items.push(LayoutItem::Figure);
            }
            _ => {}
        }
    }

    /// TJ: strings interleaved with positioning adjustments.
    fn decode_tj(&self, items: &[PdfValue]) -> String {
        let mut combined = String::new();
        for item in items {
            match item {
                PdfValue::Str(bytes) => combined.push_str(&(self.decode)(&self.font_name, bytes)),
                other => {
                    // Large negative adjustments move right far enough to be a space
                    let Some(adjustment) = get_number_from_value(other).map(|n| -n) else {
                        continue;
                    };
                    let ends_spaceless = combined
                        .chars()
                        .last()
                        .map(|c| c.is_whitespace() || is_spaceless_script_char(c))
                        .unwrap_or(true);
                    if adjustment > TJ_SPACE_THRESHOLD && !ends_spaceless {
                        combined.push(' ');
                    }
                }
            }
        }
        combined
    }

    fn push_span(&mut self, text: String) {
        if !self.in_text || text.trim().is_empty() {
            return;
        }
        let (x, y) = self.matrix.position();
        let font_size = self.font_size.map(|size| (size * self.matrix.scale()).abs());
        self.spans.push(TextSpan {
            text,
            x,
            y,
            font_size,
        });
    }

    /// Group pending spans into lines and emit them.
    fn flush(&mut self) {
        let spans = std::mem::take(&mut self.spans);
        self.items
            .extend(group_spans_into_lines(spans).into_iter().map(LayoutItem::Line));
    }
}

/// Group spans into lines by baseline, top to bottom.
pub fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    if spans.is_empty() {
        return vec![];
    }

    // PDF Y grows upward
    spans.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let tolerance = span.font_size.unwrap_or(0.0) * 0.3;
        match current_y {
            Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(TextLine::from_spans(std::mem::take(&mut current)));
                }
                current_y = Some(span.y);
                current.push(span);
            }
        }
    }

    if !current.is_empty() {
        lines.push(TextLine::from_spans(current));
    }

    lines
}

/// Text matrix state between BT and ET.
#[derive(Debug, Clone, Copy)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    // Start of the current line
    line_e: f32,
    line_f: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            line_e: 0.0,
            line_f: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        *self = Self {
            a,
            b,
            c,
            d,
            e,
            f,
            line_e: e,
            line_f: f,
        };
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.line_e += tx * self.a + ty * self.c;
        self.line_f += tx * self.b + ty * self.d;
        self.e = self.line_e;
        self.f = self.line_f;
    }

    fn next_line(&mut self, leading: f32) {
        self.translate(0.0, -leading);
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

/// Check if a character belongs to a script written without word spaces.
///
/// Chinese and Japanese don't use spaces between words, but Korean does.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and Extension A
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    // Extensions B-F
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana, Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(operator: &str, operands: Vec<PdfValue>) -> ContentOp {
        ContentOp::new(operator, operands)
    }

    fn name(n: &str) -> PdfValue {
        PdfValue::Name(n.as_bytes().to_vec())
    }

    fn s(text: &str) -> PdfValue {
        PdfValue::Str(text.as_bytes().to_vec())
    }

    fn n(v: i64) -> PdfValue {
        PdfValue::Integer(v)
    }

    fn analyze(ops: &[ContentOp]) -> Vec<LayoutItem> {
        LayoutAnalyzer::new(|_font: &[u8], bytes: &[u8]| String::from_utf8_lossy(bytes).to_string())
            .analyze(ops)
    }

    fn lines(items: &[LayoutItem]) -> Vec<(String, Option<f32>)> {
        items
            .iter()
            .filter_map(|i| match i {
                LayoutItem::Line(l) => Some((l.text(), l.font_size())),
                LayoutItem::Figure => None,
            })
            .collect()
    }

    #[test]
    fn test_lines_with_font_sizes() {
        let items = analyze(&[
            op("BT", vec![]),
            op("Tf", vec![name("F1"), n(24)]),
            op("Td", vec![n(72), n(720)]),
            op("Tj", vec![s("Title")]),
            op("Tf", vec![name("F1"), n(12)]),
            op("Td", vec![n(0), n(-30)]),
            op("Tj", vec![s("Body text")]),
            op("ET", vec![]),
        ]);
        assert_eq!(
            lines(&items),
            vec![("Title".to_string(), Some(24.0)), ("Body text".to_string(), Some(12.0))]
        );
    }

    #[test]
    fn test_spans_on_same_baseline_join() {
        let items = analyze(&[
            op("BT", vec![]),
            op("Tf", vec![name("F1"), n(12)]),
            op("Td", vec![n(72), n(700)]),
            op("Tj", vec![s("Hello,")]),
            op("Td", vec![n(40), n(0)]),
            op("Tj", vec![s("World!")]),
            op("ET", vec![]),
        ]);
        assert_eq!(lines(&items), vec![("Hello, World!".to_string(), Some(12.0))]);
    }

    #[test]
    fn test_tj_spacing() {
        let items = analyze(&[
            op("BT", vec![]),
            op("Tf", vec![name("F1"), n(12)]),
            op("TJ", vec![PdfValue::Array(vec![s("Hel"), n(-20), s("lo"), n(-300), s("there")])]),
            op("ET", vec![]),
        ]);
        assert_eq!(lines(&items), vec![("Hello there".to_string(), Some(12.0))]);
    }

    #[test]
    fn test_text_matrix_scales_font_size() {
        let items = analyze(&[
            op("BT", vec![]),
            op("Tf", vec![name("F1"), n(1)]),
            op("Tm", vec![n(18), n(0), n(0), n(18), n(50), n(600)]),
            op("Tj", vec![s("Scaled")]),
            op("ET", vec![]),
        ]);
        assert_eq!(lines(&items), vec![("Scaled".to_string(), Some(18.0))]);
    }

    #[test]
    fn test_unsized_and_blank_lines_dropped() {
        let items = analyze(&[
            op("BT", vec![]),
            op("Tj", vec![s("No font")]),
            op("Tf", vec![name("F1"), n(12)]),
            op("Td", vec![n(0), n(-20)]),
            op("Tj", vec![s("   ")]),
            op("ET", vec![]),
        ]);
        let elements: Vec<_> = items
            .into_iter()
            .filter_map(|i| match i {
                LayoutItem::Line(l) => l.into_element(),
                LayoutItem::Figure => None,
            })
            .collect();
        assert!(elements.is_empty());
    }

    #[test]
    fn test_figure_splits_segments() {
        let items = analyze(&[
            op("BT", vec![]),
            op("Tf", vec![name("F1"), n(12)]),
            op("Td", vec![n(72), n(700)]),
            op("Tj", vec![s("Before")]),
            op("ET", vec![]),
            op("Do", vec![name("Im1")]),
            op("BT", vec![]),
            op("Tf", vec![name("F1"), n(12)]),
            op("Td", vec![n(72), n(400)]),
            op("Tj", vec![s("After")]),
            op("ET", vec![]),
        ]);
        assert_eq!(items.len(), 3);
        assert!(matches!(&items[0], LayoutItem::Line(l) if l.text() == "Before"));
        assert_eq!(items[1], LayoutItem::Figure);
        assert!(matches!(&items[2], LayoutItem::Line(l) if l.text() == "After"));
    }

    #[test]
    fn test_next_line_uses_leading() {
        let items = analyze(&[
            op("BT", vec![]),
            op("Tf", vec![name("F1"), n(10)]),
            op("TL", vec![n(14)]),
            op("Td", vec![n(72), n(700)]),
            op("Tj", vec![s("One")]),
            op("T*", vec![]),
            op("Tj", vec![s("Two")]),
            op("ET", vec![]),
        ]);
        let text: Vec<_> = lines(&items).into_iter().map(|(t, _)| t).collect();
        assert_eq!(text, vec!["One", "Two"]);
    }

    #[test]
    fn test_nfc_normalization() {
        let line = TextLine::from_spans(vec![TextSpan {
            text: "Cafe\u{0301}".to_string(),
            x: 0.0,
            y: 0.0,
            font_size: Some(12.0),
        }]);
        assert_eq!(line.into_element().unwrap().content, "Caf\u{00E9}");
    }

    #[test]
    fn test_spaceless_script() {
        assert!(is_spaceless_script_char('中'));
        assert!(is_spaceless_script_char('あ'));
        assert!(!is_spaceless_script_char('한'));
        assert!(!is_spaceless_script_char('a'));
    }
}
