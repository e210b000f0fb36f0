//! Image pass: raster images in page order, and their placement queue.

use std::collections::VecDeque;
use std::io::Cursor;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::backend::PdfBackend;
use crate::error::Result;

/// Pixel layout of a decoded image stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorKind {
    /// 3 bytes per pixel
    Rgb,
    /// 1 byte per pixel
    Gray,
}

impl ColorKind {
    fn channels(&self) -> usize {
        match self {
            ColorKind::Rgb => 3,
            ColorKind::Gray => 1,
        }
    }

    fn extended(&self) -> ExtendedColorType {
        match self {
            ColorKind::Rgb => ExtendedColorType::Rgb8,
            ColorKind::Gray => ExtendedColorType::L8,
        }
    }
}

/// An image found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// Zero-based page index
    pub page: u32,
    /// Encoded payload
    pub data: Vec<u8>,
}

/// Encode raw 8-bit samples as PNG.
///
/// Returns `None` if the buffer is too short for the given dimensions.
pub fn encode_png(width: u32, height: u32, kind: ColorKind, mut data: Vec<u8>) -> Option<Vec<u8>> {
    let expected = (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(kind.channels())?;
    if expected == 0 || data.len() < expected {
        return None;
    }
    data.truncate(expected);

    let mut out = Cursor::new(Vec::new());
    PngEncoder::new(&mut out)
        .write_image(&data, width, height, kind.extended())
        .map_err(|e| log::debug!("PNG encoding failed: {}", e))
        .ok()?;
    Some(out.into_inner())
}

/// Collect every page's images in page order, then per-page order.
pub fn collect_images<B: PdfBackend>(backend: &B) -> Result<Vec<PageImage>> {
    let mut images = Vec::new();
    for (index, (_, page_id)) in backend.pages().into_iter().enumerate() {
        let page = index as u32;
        let found = backend.page_images(page_id)?;
        log::debug!("Page {}: {} images", page, found.len());
        images.extend(found.into_iter().map(|data| PageImage { page, data }));
    }
    Ok(images)
}

/// Images waiting to be placed at figure positions.
///
/// Only the head of the queue is ever considered. A figure on a page whose
/// index differs from the head image's page places nothing.
#[derive(Debug, Default)]
pub struct ImageQueue {
    pending: VecDeque<PageImage>,
}

impl ImageQueue {
    /// Create a queue in extraction order.
    pub fn new(images: Vec<PageImage>) -> Self {
        Self {
            pending: images.into(),
        }
    }

    /// Take the next image if it belongs to `page`.
    pub fn take_for_page(&mut self, page: u32) -> Option<PageImage> {
        if self.pending.front()?.page == page {
            self.pending.pop_front()
        } else {
            None
        }
    }

    /// Number of images not yet placed.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(page: u32, tag: u8) -> PageImage {
        PageImage {
            page,
            data: vec![tag],
        }
    }

    #[test]
    fn test_queue_matches_head_only() {
        let mut queue = ImageQueue::new(vec![image(0, 1), image(1, 2), image(1, 3)]);
        assert_eq!(queue.take_for_page(0).map(|i| i.data), Some(vec![1]));
        // Next image belongs to page 1
        assert_eq!(queue.take_for_page(0), None);
        assert_eq!(queue.take_for_page(1).map(|i| i.data), Some(vec![2]));
        assert_eq!(queue.take_for_page(1).map(|i| i.data), Some(vec![3]));
        assert_eq!(queue.take_for_page(1), None);
        assert_eq!(queue.remaining(), 0);
    }

    #[test]
    fn test_queue_does_not_skip_ahead() {
        // An unmatched head blocks later images
        let mut queue = ImageQueue::new(vec![image(0, 1), image(2, 2)]);
        assert_eq!(queue.take_for_page(1), None);
        assert_eq!(queue.take_for_page(2), None);
        assert_eq!(queue.remaining(), 2);
    }

    #[test]
    fn test_encode_png_rgb() {
        let pixels = vec![200u8; 60 * 60 * 3];
        let png = encode_png(60, 60, ColorKind::Rgb, pixels).unwrap();
        assert!(png.starts_with(b"\x89PNG"));
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (60, 60));
    }

    #[test]
    fn test_encode_png_short_buffer() {
        assert!(encode_png(10, 10, ColorKind::Gray, vec![0; 50]).is_none());
        assert!(encode_png(0, 10, ColorKind::Gray, vec![]).is_none());
    }
}
