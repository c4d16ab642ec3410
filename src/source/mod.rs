//! Source readers: load input files and aggregate values per Cella.

use chrono::NaiveDate;
use std::path::Path;

use crate::config::{ForecastInput, ReportInput};
use crate::domain::{SourceKind, SourceValues};
use crate::error::LoadError;

pub mod delimited;
pub mod extract;
pub mod spreadsheet;
pub mod table;

pub use delimited::read_delimited;
pub use extract::{extract_forecast, extract_report_counts, ReportColumns};
pub use spreadsheet::read_spreadsheet;
pub use table::{normalize_column_name, Cell, SourceRow, SourceTable, TableOrigin};

/// Read a report workbook and count its rows per Cella for `stats_date`.
pub fn load_report(
    input: &ReportInput,
    stats_date: NaiveDate,
) -> Result<SourceValues<i64>, LoadError> {
    tracing::info!("Reading {} from {}", input.kind, input.path.display());
    let table =
        read_spreadsheet(input.kind, &input.path, input.sheet.as_deref(), input.header_row)?;
    let columns = ReportColumns {
        cella: &input.cella_column,
        date: input.date_column.as_deref(),
        count: input.count_column.as_deref(),
    };
    extract_report_counts(&table, columns, stats_date)
}

/// Read the forecast export and sum its expected values per Cella.
pub fn load_forecast(input: &ForecastInput) -> Result<SourceValues<f64>, LoadError> {
    tracing::info!("Reading {} from {}", SourceKind::Forecast, input.path.display());
    let table = read_delimited(
        SourceKind::Forecast,
        &input.path,
        input.delimiter,
        input.encoding.as_deref(),
    )?;
    extract_forecast(&table, &input.cella_column, input.expected_column.as_deref())
}

/// Whether `path` should be read as delimited text rather than a workbook.
pub fn is_delimited_path(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    matches!(ext.as_str(), "csv" | "tsv" | "txt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn delimited_paths_by_extension() {
        assert!(is_delimited_path(Path::new("Почасовой прогноз.CSV")));
        assert!(is_delimited_path(Path::new("export.tsv")));
        assert!(!is_delimited_path(Path::new("Частично.xls")));
        assert!(!is_delimited_path(Path::new("no_extension")));
    }

    #[test]
    fn load_forecast_uses_configured_columns() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("forecast.csv");
        std::fs::write(&path, "Ячейка,plan\nCella613,4\nCella613,1.5\n").expect("write");

        let input = ForecastInput {
            path: PathBuf::from(&path),
            cella_column: "ячейка".to_string(),
            expected_column: Some("plan".to_string()),
            delimiter: None,
            encoding: None,
        };
        let values = load_forecast(&input).expect("load");
        assert_eq!(values.values.get("Cella613"), Some(&5.5));
        assert_eq!(values.kind, SourceKind::Forecast);
    }
}
