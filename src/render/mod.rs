//! Rendering module for converting extracted elements to Markdown.

mod markdown;
mod table;

pub use markdown::{render_image, to_markdown, MarkdownRenderer};
pub use table::{render_list_item, render_table};
