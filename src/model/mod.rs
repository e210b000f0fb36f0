//! Document model types.
//!
//! This module defines the intermediate representation that bridges
//! per-format extraction and Markdown assembly. Every extractor produces
//! an ordered `Vec<Element>`; position in that vector is position in the
//! final document.

mod document;
mod element;

pub use document::{Document, FileInfo};
pub use element::{
    Element, ImageElement, ImageSource, ListItemElement, TableElement, TextElement,
};
