//! CSV reader.
//!
//! The first record is the header. Records may be ragged; they are kept as
//! read and the table renderer sizes its separator to the header.

use crate::error::Result;
use crate::model::TableElement;

/// A parsed CSV table and its shape.
#[derive(Debug, Clone, Default)]
pub struct CsvContent {
    /// All records, header first
    pub table: TableElement,
    /// Data rows, header excluded
    pub row_count: usize,
    /// Header columns
    pub col_count: usize,
}

/// Read comma-separated records.
pub fn parse_csv(data: &[u8]) -> Result<CsvContent> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(data);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        // Blank lines are not rows
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let col_count = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != col_count) {
        log::warn!("CSV rows have inconsistent column counts");
    }

    let table = TableElement::new(rows);
    Ok(CsvContent {
        row_count: table.row_count().saturating_sub(1),
        col_count,
        table,
    })
}
