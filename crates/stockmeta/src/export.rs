//! CSV report export and byte-size formatting.
//!
//! Layout: an unquoted header row, then one row per record with every field
//! wrapped in double quotes and embedded quotes doubled. Rows are separated
//! by `\n` with no trailing newline.

use std::path::Path;

use tracing::info;

use crate::error::ExportError;
use crate::pipeline::ResultRecord;
use crate::sanitize;

pub const CSV_HEADERS: [&str; 7] = [
    "Filename",
    "Description",
    "Keywords",
    "Categories",
    "Editorial",
    "Mature",
    "Illustration",
];

fn escape(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn row(record: &ResultRecord) -> String {
    let meta = &record.metadata;
    [
        record.filename.as_str(),
        meta.description.as_str(),
        meta.keywords.as_str(),
        meta.categories.as_str(),
        meta.editorial.as_str(),
        meta.mature_content.as_str(),
        meta.illustration.as_str(),
    ]
    .iter()
    .map(|field| escape(field))
    .collect::<Vec<_>>()
    .join(",")
}

/// Renders the report for `records` in run order.
pub fn to_csv(records: &[ResultRecord]) -> String {
    std::iter::once(CSV_HEADERS.join(","))
        .chain(records.iter().map(row))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes the report to `path`. An empty result set is refused.
pub fn write_csv<P: AsRef<Path>>(records: &[ResultRecord], path: P) -> Result<(), ExportError> {
    if records.is_empty() {
        return Err(ExportError::Empty);
    }

    let path = path.as_ref();
    std::fs::write(path, to_csv(records)).map_err(|e| ExportError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!(
        "Wrote {} rows to {}",
        records.len(),
        sanitize::redact_path(path)
    );
    Ok(())
}

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable size with 1024-based units and up to two decimals,
/// trailing zeros dropped (`1536` -> `1.5 KB`, `0` -> `0 Bytes`).
pub fn format_bytes(bytes: i64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let sign = if bytes < 0 { "-" } else { "" };
    let magnitude = bytes.unsigned_abs() as f64;

    let mut unit = 0;
    let mut value = magnitude;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{}{} {}", sign, trimmed, UNITS[unit])
}
