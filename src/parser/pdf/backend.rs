//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for PDF operations, isolating
//! the concrete PDF library (lopdf) from the layout and image passes.

use std::collections::{BTreeMap, HashSet};

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use super::images::{encode_png, ColorKind};
use crate::error::{Error, Result};

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Nesting limit when following form XObjects during the image pass.
const MAX_FORM_DEPTH: usize = 8;

/// A value from a PDF content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    /// Create an operation.
    pub fn new(operator: impl Into<String>, operands: Vec<PdfValue>) -> Self {
        Self {
            operator: operator.into(),
            operands,
        }
    }
}

/// Abstract interface for PDF document access.
///
/// Implementations provide page enumeration, content stream decoding,
/// text decoding and raster image extraction without exposing any
/// concrete PDF library types.
pub trait PdfBackend {
    /// Return all pages as (page_number → PageId).
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Return the raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Decode a text byte sequence using the font's encoding on the given page.
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;

    /// Return the page's raster images in resource enumeration order.
    fn page_images(&self, page: PageId) -> Result<Vec<Vec<u8>>>;
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// LopdfBackend
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        if doc.is_encrypted() {
            log::warn!("PDF is encrypted; text may not decode");
        }
        Ok(Self { doc })
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Resolve an object that may be a reference to a dictionary.
    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match obj {
            Object::Reference(r) => self.doc.get_dictionary(*r).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Find the resource dictionary for a page, following `Parent` links.
    fn page_resources(&self, page: PageId) -> Option<&Dictionary> {
        let mut node = self.doc.get_dictionary(page).ok()?;
        let mut seen = HashSet::new();
        loop {
            if let Some(res) = node.get(b"Resources").ok().and_then(|o| self.resolve_dict(o)) {
                return Some(res);
            }
            let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
            if !seen.insert(parent) {
                return None;
            }
            node = self.doc.get_dictionary(parent).ok()?;
        }
    }

    /// Collect images from a resource dictionary's XObjects.
    fn collect_xobject_images(
        &self,
        resources: &Dictionary,
        depth: usize,
        visited: &mut HashSet<ObjectId>,
        out: &mut Vec<Vec<u8>>,
    ) {
        let Some(xobjects) = resources.get(b"XObject").ok().and_then(|o| self.resolve_dict(o))
        else {
            return;
        };

        for (_, obj) in xobjects.iter() {
            let Ok(obj_ref) = obj.as_reference() else {
                continue;
            };
            if !visited.insert(obj_ref) {
                continue;
            }
            let Ok(Object::Stream(stream)) = self.doc.get_object(obj_ref) else {
                continue;
            };

            match stream.dict.get(b"Subtype").and_then(|s| s.as_name()) {
                Ok(b"Image") => {
                    if let Some(data) = image_payload(stream) {
                        out.push(data);
                    }
                }
                Ok(b"Form") if depth < MAX_FORM_DEPTH => {
                    if let Some(res) = stream
                        .dict
                        .get(b"Resources")
                        .ok()
                        .and_then(|o| self.resolve_dict(o))
                    {
                        self.collect_xobject_images(res, depth + 1, visited, out);
                    }
                }
                _ => {}
            }
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id)?;

        let contents = match page_dict.get(b"Contents") {
            Ok(c) => c,
            // A page without content is blank
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r)? {
                Object::Stream(s) => Ok(stream_bytes(s)),
                Object::Array(arr) => Ok(self.concat_streams(arr)),
                _ => Err(Error::PdfParse("Invalid content stream".to_string())),
            },
            Object::Array(arr) => Ok(self.concat_streams(arr)),
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content = lopdf::content::Content::decode(data)?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        if let Ok(lopdf_fonts) = self.doc.get_page_fonts(page) {
            if let Some(font_dict) = lopdf_fonts.get(font_name) {
                if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                    if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                        return text;
                    }
                }
            }
        }
        decode_text_simple(bytes)
    }

    fn page_images(&self, page: PageId) -> Result<Vec<Vec<u8>>> {
        let mut images = Vec::new();
        if let Some(resources) = self.page_resources(page) {
            let mut visited = HashSet::new();
            self.collect_xobject_images(resources, 0, &mut visited, &mut images);
        }
        Ok(images)
    }
}

/// Decoded stream data; unfiltered streams are returned as stored.
fn stream_bytes(stream: &Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

impl LopdfBackend {
    fn concat_streams(&self, arr: &[Object]) -> Vec<u8> {
        let mut content = Vec::new();
        for obj in arr {
            if let Object::Reference(r) = obj {
                if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                    content.extend_from_slice(&stream_bytes(s));
                    content.push(b' ');
                }
            }
        }
        content
    }
}

/// Turn an image XObject into bytes an image decoder can read.
///
/// JPEG streams pass through once any filters ahead of `DCTDecode` are
/// undone. Unfiltered or Flate/LZW/ASCII85-encoded 8-bit RGB or grayscale
/// samples are re-encoded as PNG. Anything else is returned raw.
fn image_payload(stream: &Stream) -> Option<Vec<u8>> {
    let dict = &stream.dict;
    let width = dict.get(b"Width").and_then(|w| w.as_i64()).ok()?;
    let height = dict.get(b"Height").and_then(|h| h.as_i64()).ok()?;
    let filters = filter_names(dict);

    match filters.split_last() {
        Some((last, leading)) if last.as_slice() == b"DCTDecode" || last.as_slice() == b"JPXDecode" => {
            if leading.is_empty() {
                return Some(stream.content.clone());
            }
            let decoded = decode_leading(stream, leading);
            if decoded.is_none() {
                log::debug!("Could not undo filters ahead of {}", String::from_utf8_lossy(last));
            }
            decoded.or_else(|| Some(stream.content.clone()))
        }
        _ => {
            let samples = if filters.is_empty() {
                Some(stream.content.clone())
            } else {
                stream.decompressed_content().ok()
            };
            let bits = dict
                .get(b"BitsPerComponent")
                .and_then(|b| b.as_i64())
                .unwrap_or(8);
            let color = dict.get(b"ColorSpace").ok().and_then(color_kind);

            match (bits, color, samples) {
                (8, Some(kind), Some(data)) => u32::try_from(width)
                    .ok()
                    .zip(u32::try_from(height).ok())
                    .and_then(|(w, h)| encode_png(w, h, kind, data))
                    .or_else(|| Some(stream.content.clone())),
                _ => Some(stream.content.clone()),
            }
        }
    }
}

/// Stream filters in decoding order; empty when there is no `Filter`.
fn filter_names(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => vec![n.clone()],
        Ok(Object::Array(arr)) => arr
            .iter()
            .filter_map(|o| o.as_name().ok())
            .map(<[u8]>::to_vec)
            .collect(),
        _ => Vec::new(),
    }
}

/// Apply only the `leading` filters of a chain, leaving the final encoding.
fn decode_leading(stream: &Stream, leading: &[Vec<u8>]) -> Option<Vec<u8>> {
    let mut dict = stream.dict.clone();
    dict.set(
        "Filter",
        Object::Array(leading.iter().cloned().map(Object::Name).collect()),
    );
    if let Ok(Object::Array(params)) = stream.dict.get(b"DecodeParms") {
        match params.first() {
            Some(first @ Object::Dictionary(_)) if leading.len() == 1 => dict.set("DecodeParms", first.clone()),
            _ => {
                dict.remove(b"DecodeParms");
            }
        }
    }
    Stream::new(dict, stream.content.clone()).decompressed_content().ok()
}

fn color_kind(obj: &Object) -> Option<ColorKind> {
    match obj.as_name().ok()? {
        b"DeviceRGB" => Some(ColorKind::Rgb),
        b"DeviceGray" => Some(ColorKind::Gray),
        _ => None,
    }
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

/// Helper: extract a number from a [`PdfValue`].
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(r) => Some(*r),
        _ => None,
    }
}
