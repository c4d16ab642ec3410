//! In-memory tabular representation shared by all readers.

use chrono::NaiveDate;
use std::path::PathBuf;

use crate::domain::SourceKind;
use crate::error::LoadError;
use crate::utils::{excel_serial_to_date, parse_date_text};

/// A single typed cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
}

impl Cell {
    /// Build a text cell, mapping blank strings to [`Cell::Empty`].
    pub fn text(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    /// Identifier form of the cell, used for Cella keys.
    ///
    /// Whole numbers render without a fractional part so `613.0` keys as `613`.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Date(d) => Some(d.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => parse_number(s),
            _ => None,
        }
    }

    /// Date value of the cell. Bare numbers are read as Excel serials.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::Number(n) => excel_serial_to_date(*n),
            Cell::Text(s) => parse_date_text(s),
            _ => None,
        }
    }
}

/// Parse a number as written in regional exports: `1 234,5`, `12.5`, `-3`.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String =
        text.chars().filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}').collect();
    if cleaned.is_empty() {
        return None;
    }
    let normalized = if cleaned.contains(',') && !cleaned.contains('.') {
        cleaned.replace(',', ".")
    } else {
        cleaned.replace(',', "")
    };
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Normalize a header for comparison: lowercase, `ё` → `е`, whitespace removed.
pub fn normalize_column_name(name: &str) -> String {
    name.to_lowercase().replace('ё', "е").chars().filter(|c| !c.is_whitespace()).collect()
}

/// Where a table was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOrigin {
    Workbook { sheet: String, sheets: Vec<String> },
    Delimited { encoding: String, delimiter: u8 },
}

/// One data row and where it sits in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    /// 1-based sheet row or text line.
    pub line: usize,
    pub cells: Vec<Cell>,
}

static EMPTY_CELL: Cell = Cell::Empty;

impl SourceRow {
    pub fn new(line: usize, cells: Vec<Cell>) -> Self {
        Self { line, cells }
    }

    /// Cell at `idx`, or an empty cell for short rows.
    pub fn cell(&self, idx: usize) -> &Cell {
        self.cells.get(idx).unwrap_or(&EMPTY_CELL)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| *c == Cell::Empty)
    }
}

/// Header plus ordered data rows loaded from one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    pub kind: SourceKind,
    pub path: PathBuf,
    pub origin: TableOrigin,
    pub headers: Vec<String>,
    pub rows: Vec<SourceRow>,
}

impl SourceTable {
    /// Index of the column whose normalized name equals `name`'s.
    pub fn column(&self, name: &str) -> Result<usize, LoadError> {
        let wanted = normalize_column_name(name);
        self.find_column(|normalized| normalized == wanted).ok_or_else(|| self.missing_column(name))
    }

    /// First column whose normalized header satisfies `pred`.
    pub fn find_column(&self, mut pred: impl FnMut(&str) -> bool) -> Option<usize> {
        self.headers.iter().position(|header| pred(&normalize_column_name(header)))
    }

    pub fn missing_column(&self, name: &str) -> LoadError {
        LoadError::MissingColumn {
            kind: self.kind,
            path: self.path.clone(),
            column: name.to_string(),
            available: self.headers.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str]) -> SourceTable {
        SourceTable {
            kind: SourceKind::Partial,
            path: PathBuf::from("report.xlsx"),
            origin: TableOrigin::Workbook { sheet: "Sheet1".into(), sheets: vec!["Sheet1".into()] },
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    #[test]
    fn normalizes_case_yo_and_spaces() {
        assert_eq!(normalize_column_name(" Ожидаётся "), "ожидается");
        assert_eq!(normalize_column_name("Плановая дата\tпоставки"), "плановаядатапоставки");
    }

    #[test]
    fn resolves_columns_on_normalized_name() {
        let t = table(&["Номер", "CELLA", "Плановая  дата поставки"]);
        assert_eq!(t.column("Cella").expect("cella"), 1);
        assert_eq!(t.column("плановая дата поставки").expect("date"), 2);
    }

    #[test]
    fn missing_column_lists_headers() {
        let t = table(&["A", "B"]);
        let err = t.column("Cella").expect_err("must fail");
        let message = err.to_string();
        assert!(message.contains("'Cella'"));
        assert!(message.contains("A, B"));
    }

    #[test]
    fn parses_regional_numbers() {
        assert_eq!(parse_number("1 234,5"), Some(1234.5));
        assert_eq!(parse_number("2.5"), Some(2.5));
        assert_eq!(parse_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("  "), None);
    }

    #[test]
    fn whole_number_keys_drop_fraction() {
        assert_eq!(Cell::Number(613.0).as_key().as_deref(), Some("613"));
        assert_eq!(Cell::text("  Cella613 ").as_key().as_deref(), Some("Cella613"));
        assert_eq!(Cell::text("   "), Cell::Empty);
        assert_eq!(Cell::Empty.as_key(), None);
    }
}
