//! Workbook reader for the partial and full reports.

use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

use super::table::{Cell, SourceRow, SourceTable, TableOrigin};
use crate::domain::SourceKind;
use crate::error::LoadError;
use crate::utils::parse_date_text;

/// Read one sheet of a workbook into a [`SourceTable`].
///
/// `header_row` counts from the first non-empty row of the sheet.
pub fn read_spreadsheet(
    kind: SourceKind,
    path: &Path,
    sheet: Option<&str>,
    header_row: usize,
) -> Result<SourceTable, LoadError> {
    if !path.is_file() {
        return Err(LoadError::SourceMissing { kind, path: path.to_path_buf() });
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| LoadError::unreadable(kind, path, e))?;
    let sheets = workbook.sheet_names();

    let sheet_name = match sheet {
        Some(name) => sheets
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| {
                LoadError::unreadable(
                    kind,
                    path,
                    format!("sheet '{}' not found (sheets: {})", name, sheets.join(", ")),
                )
            })?,
        None => sheets
            .first()
            .cloned()
            .ok_or_else(|| LoadError::unreadable(kind, path, "workbook has no sheets"))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| LoadError::unreadable(kind, path, format!("sheet '{}': {}", sheet_name, e)))?;

    // 1-based sheet row of the range's first row
    let first_line = range.start().map_or(1, |(row, _)| row as usize + 1);
    let mut rows = range.rows().enumerate().skip(header_row);
    let (_, header) = rows.next().ok_or_else(|| {
        LoadError::unreadable(
            kind,
            path,
            format!("header row {} is past the end of sheet '{}'", header_row, sheet_name),
        )
    })?;
    let headers: Vec<String> =
        header.iter().map(|c| convert_cell(c).as_key().unwrap_or_default()).collect();

    let data_rows: Vec<SourceRow> = rows
        .map(|(idx, row)| SourceRow::new(first_line + idx, row.iter().map(convert_cell).collect()))
        .filter(|row| !row.is_blank())
        .collect();

    tracing::debug!(
        "Read {} data rows from sheet '{}' of {}",
        data_rows.len(),
        sheet_name,
        path.display()
    );

    Ok(SourceTable {
        kind,
        path: path.to_path_buf(),
        origin: TableOrigin::Workbook { sheet: sheet_name, sheets },
        headers,
        rows: data_rows,
    })
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::String(s) => Cell::text(s),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => Cell::Empty,
        Data::DateTime(dt) => dt.as_datetime().map_or(Cell::Empty, |d| Cell::Date(d.date())),
        Data::DateTimeIso(s) => parse_date_text(s).map_or_else(|| Cell::text(s), Cell::Date),
        Data::DurationIso(s) => Cell::text(s),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};
    use chrono::NaiveDate;
    use rust_xlsxwriter::Workbook;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }
    use tempfile::TempDir;

    fn write_report(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("report.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Orders").expect("name");
        sheet.write_string(0, 0, "Cella").expect("write");
        sheet.write_string(0, 1, "Плановая дата поставки").expect("write");
        sheet.write_string(1, 0, "Cella613").expect("write");
        sheet.write_string(1, 1, "14.10.2026").expect("write");
        sheet.write_number(2, 0, 614.0).expect("write");
        sheet.write_number(2, 1, 45_000.0).expect("write");
        workbook.save(&path).expect("save");
        path
    }

    #[test]
    fn reads_first_sheet_with_typed_cells() {
        let tmp = TempDir::new().expect("tmp");
        let path = write_report(tmp.path());

        let table = read_spreadsheet(SourceKind::Partial, &path, None, 0).expect("read");
        assert_eq!(table.headers, vec!["Cella", "Плановая дата поставки"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cell(0), &Cell::Text("Cella613".into()));
        assert_eq!(table.rows[1].cell(0).as_key().as_deref(), Some("614"));
        assert_eq!(table.rows[1].cell(1).as_date(), NaiveDate::from_ymd_opt(2023, 3, 15));
        assert!(matches!(table.origin, TableOrigin::Workbook { ref sheet, .. } if sheet == "Orders"));
    }

    #[test]
    fn rows_carry_sheet_line_numbers() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("report.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Выгрузка за день").expect("write");
        sheet.write_string(1, 0, "Cella").expect("write");
        sheet.write_string(2, 0, "Cella613").expect("write");
        sheet.write_string(4, 0, "Cella614").expect("write");
        workbook.save(&path).expect("save");

        let table = read_spreadsheet(SourceKind::Partial, &path, None, 1).expect("read");
        assert_eq!(table.headers, vec!["Cella"]);
        let lines: Vec<usize> = table.rows.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![3, 5]);
    }

    #[test]
    fn date_cells_honour_the_1904_date_system() {
        // 2026-10-14 is serial 46309 in the 1900 system and 44847 in the 1904 one.
        let dt = ExcelDateTime::new(44_847.0, ExcelDateTimeType::DateTime, true);
        assert_eq!(convert_cell(&Data::DateTime(dt)), Cell::Date(date(2026, 10, 14)));

        let dt = ExcelDateTime::new(46_309.0, ExcelDateTimeType::DateTime, false);
        assert_eq!(convert_cell(&Data::DateTime(dt)), Cell::Date(date(2026, 10, 14)));
    }

    #[test]
    fn duration_cells_are_not_dates() {
        let dt = ExcelDateTime::new(1.5, ExcelDateTimeType::TimeDelta, false);
        assert_eq!(convert_cell(&Data::DateTime(dt)), Cell::Empty);
    }

    #[test]
    fn unknown_sheet_is_a_read_error() {
        let tmp = TempDir::new().expect("tmp");
        let path = write_report(tmp.path());

        let err = read_spreadsheet(SourceKind::Full, &path, Some("Missing"), 0)
            .expect_err("must fail");
        assert!(err.to_string().contains("sheet 'Missing' not found"));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn header_row_past_end_is_a_read_error() {
        let tmp = TempDir::new().expect("tmp");
        let path = write_report(tmp.path());

        let err = read_spreadsheet(SourceKind::Full, &path, None, 10).expect_err("must fail");
        assert!(err.to_string().contains("header row 10"));
    }

    #[test]
    fn missing_file_is_reported_as_missing() {
        let tmp = TempDir::new().expect("tmp");
        let err = read_spreadsheet(SourceKind::Partial, &tmp.path().join("nope.xls"), None, 0)
            .expect_err("must fail");
        assert!(matches!(err, LoadError::SourceMissing { .. }));
    }

    #[test]
    fn garbage_file_is_unreadable() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("broken.xlsx");
        std::fs::write(&path, b"this is not a workbook").expect("write");

        let err = read_spreadsheet(SourceKind::Partial, &path, None, 0).expect_err("must fail");
        assert!(matches!(err, LoadError::SourceUnreadable { .. }));
    }
}
