//! Table and list conversion to Markdown.

use crate::error::{Error, Result};
use crate::model::{ListItemElement, TableElement};

/// Render a table as a pipe table.
///
/// Row 0 is the header; the separator row has one `---` per header column.
/// Data rows are written as-is, so rows wider or narrower than the header
/// produce an irregular table.
pub fn render_table(table: &TableElement) -> Result<String> {
    let header = table.rows.first().ok_or(Error::EmptyTable)?;

    let mut lines = Vec::with_capacity(table.rows.len() + 1);
    lines.push(render_row(header));
    lines.push(separator(header.len()));
    for row in &table.rows[1..] {
        lines.push(render_row(row));
    }

    Ok(lines.join("\n"))
}

/// Render a list item with its indent and marker.
///
/// Nested items are indented two spaces per level below the first.
/// Ordered items use their level as the marker number.
pub fn render_list_item(item: &ListItemElement) -> String {
    let level = item.level.max(1);
    let indent = "  ".repeat(usize::from(level - 1));
    if item.ordered {
        format!("{}{}. {}", indent, level, item.text)
    } else {
        format!("{}- {}", indent, item.text)
    }
}

fn render_row(cells: &[String]) -> String {
    let mut out = String::from("|");
    for cell in cells {
        // Keep the row on one line
        let content = cell.trim().replace('\n', " ");
        out.push_str(&format!(" {} |", content));
    }
    out
}

fn separator(columns: usize) -> String {
    let mut out = String::from("|");
    for _ in 0..columns {
        out.push_str(" --- |");
    }
    out
}
