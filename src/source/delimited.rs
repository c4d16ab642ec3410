//! Delimited text reader for the forecast export.

use std::path::Path;

use super::table::{Cell, SourceRow, SourceTable, TableOrigin};
use crate::domain::SourceKind;
use crate::error::LoadError;
use crate::utils::decode_text;

/// Candidate separators in tie-break order.
const DELIMITER_CANDIDATES: &[u8] = b";,\t|";

/// Pick the separator that occurs most often in the header line.
pub fn sniff_delimiter(header_line: &str) -> u8 {
    let mut best = (b',', 0usize);
    for &candidate in DELIMITER_CANDIDATES {
        let count = header_line.bytes().filter(|&b| b == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

/// Read a delimited file into a [`SourceTable`] of text cells.
pub fn read_delimited(
    kind: SourceKind,
    path: &Path,
    delimiter: Option<char>,
    encoding: Option<&str>,
) -> Result<SourceTable, LoadError> {
    if !path.is_file() {
        return Err(LoadError::SourceMissing { kind, path: path.to_path_buf() });
    }

    let bytes = std::fs::read(path).map_err(|e| LoadError::unreadable(kind, path, e))?;
    let decoded = decode_text(&bytes, encoding).ok_or_else(|| {
        LoadError::unreadable(
            kind,
            path,
            format!("unknown encoding '{}'", encoding.unwrap_or_default()),
        )
    })?;

    let header_line = decoded.content.lines().find(|line| !line.trim().is_empty()).ok_or_else(
        || LoadError::unreadable(kind, path, "file is empty"),
    )?;

    let delimiter = match delimiter {
        Some(c) if c.is_ascii() => c as u8,
        Some(c) => {
            return Err(LoadError::invalid(
                "forecast delimiter",
                format!("'{}' is not a single-byte character", c),
            ))
        }
        None => sniff_delimiter(header_line),
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(decoded.content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LoadError::unreadable(kind, path, format!("header: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        // csv errors carry their own position
        let record = record.map_err(|e| LoadError::unreadable(kind, path, e))?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        let row = SourceRow::new(line, record.iter().map(Cell::text).collect());
        if !row.is_blank() {
            rows.push(row);
        }
    }

    tracing::debug!(
        "Read {} rows from {} (encoding {}, delimiter {:?})",
        rows.len(),
        path.display(),
        decoded.encoding,
        delimiter as char
    );

    Ok(SourceTable {
        kind,
        path: path.to_path_buf(),
        origin: TableOrigin::Delimited { encoding: decoded.encoding, delimiter },
        headers,
        rows,
    })
}
