//! Per-Cella aggregation of loaded tables.
//!
//! Rows that cannot contribute (blank Cella, bad date, non-numeric value) are
//! skipped and counted, never fatal. Repeated Cellas within one source are
//! summed: a report counts its order rows, the forecast adds its hourly values.

use chrono::NaiveDate;

use super::table::SourceTable;
use crate::domain::{ExtractStats, SkipReason, SourceValues};
use crate::error::LoadError;

/// Exact normalized names accepted for the forecast "expected" column.
const EXPECTED_EXACT: &[&str] = &["ожидается", "expected"];
/// Fallback substrings for the forecast "expected" column.
const EXPECTED_PARTIAL: &[&str] = &["ожид", "expect"];

/// Column choices for a partial or full report.
#[derive(Debug, Clone, Copy)]
pub struct ReportColumns<'a> {
    pub cella: &'a str,
    /// When set, only rows dated on the stats date count.
    pub date: Option<&'a str>,
    /// When set, rows carry a count in this column instead of counting as one.
    pub count: Option<&'a str>,
}

/// Count report rows per Cella for `stats_date`.
pub fn extract_report_counts(
    table: &SourceTable,
    columns: ReportColumns<'_>,
    stats_date: NaiveDate,
) -> Result<SourceValues<i64>, LoadError> {
    let cella_idx = table.column(columns.cella)?;
    let date_idx = columns.date.map(|name| table.column(name)).transpose()?;
    let count_idx = columns.count.map(|name| table.column(name)).transpose()?;

    let mut out = SourceValues::new(table.kind);
    for row in &table.rows {
        out.stats.rows_read += 1;

        let Some(cella) = row.cell(cella_idx).as_key() else {
            skip(&mut out.stats, table, row.line, SkipReason::EmptyCella);
            continue;
        };

        if let Some(idx) = date_idx {
            match row.cell(idx).as_date() {
                None => {
                    skip(&mut out.stats, table, row.line, SkipReason::InvalidDate);
                    continue;
                }
                Some(date) if date != stats_date => {
                    out.stats.skip(SkipReason::OtherDate);
                    continue;
                }
                Some(_) => {}
            }
        }

        let value = match count_idx {
            Some(idx) => match row.cell(idx).as_number().and_then(whole_number) {
                Some(v) => v,
                None => {
                    skip(&mut out.stats, table, row.line, SkipReason::InvalidValue);
                    continue;
                }
            },
            None => 1,
        };

        *out.values.entry(cella).or_insert(0) += value;
        out.stats.rows_used += 1;
    }

    log_summary(table, &out);
    Ok(out)
}

/// Sum forecast "expected" values per Cella.
pub fn extract_forecast(
    table: &SourceTable,
    cella_column: &str,
    expected_column: Option<&str>,
) -> Result<SourceValues<f64>, LoadError> {
    let cella_idx = table.column(cella_column)?;
    let expected_idx = resolve_expected_column(table, expected_column)?;
    tracing::debug!(
        "Forecast expected column: '{}'",
        table.headers.get(expected_idx).map(String::as_str).unwrap_or_default()
    );

    let mut out = SourceValues::new(table.kind);
    for row in &table.rows {
        out.stats.rows_read += 1;

        let Some(cella) = row.cell(cella_idx).as_key() else {
            skip(&mut out.stats, table, row.line, SkipReason::EmptyCella);
            continue;
        };
        let Some(value) = row.cell(expected_idx).as_number() else {
            skip(&mut out.stats, table, row.line, SkipReason::InvalidValue);
            continue;
        };

        *out.values.entry(cella).or_insert(0.0) += value;
        out.stats.rows_used += 1;
    }

    log_summary(table, &out);
    Ok(out)
}

/// Locate the forecast "expected" column.
///
/// A configured name must match exactly (normalized). Otherwise the first
/// exact well-known name wins, then the first header containing a well-known stem.
pub fn resolve_expected_column(
    table: &SourceTable,
    configured: Option<&str>,
) -> Result<usize, LoadError> {
    if let Some(name) = configured {
        return table.column(name);
    }
    table
        .find_column(|h| EXPECTED_EXACT.contains(&h))
        .or_else(|| table.find_column(|h| EXPECTED_PARTIAL.iter().any(|stem| h.contains(stem))))
        .ok_or_else(|| table.missing_column("Ожидается"))
}

fn whole_number(value: f64) -> Option<i64> {
    (value.fract() == 0.0 && value.abs() < 9.0e15).then_some(value as i64)
}

fn skip(stats: &mut ExtractStats, table: &SourceTable, line: usize, reason: SkipReason) {
    stats.skip(reason);
    tracing::debug!(
        "Skipping {} line {} of {}: {}",
        table.kind,
        line,
        table.path.display(),
        reason.as_str()
    );
}

fn log_summary<T>(table: &SourceTable, values: &SourceValues<T>) {
    tracing::info!(
        "{}: {} rows read, {} used, {} skipped, {} cellas",
        table.kind,
        values.stats.rows_read,
        values.stats.rows_used,
        values.stats.rows_skipped(),
        values.values.len()
    );
}
