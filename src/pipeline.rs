//! The linear load run: read, merge, write.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::RunConfig;
use crate::domain::{CellaRecord, ExtractStats, MergedBatch, SkipReason, SourceKind, SourceValues};
use crate::error::LoadError;
use crate::merge::merge_sources;
use crate::source::{load_forecast, load_report};
use crate::store::{StatsStore, WriteMode, WriteSummary};

/// Per-source part of a [`RunReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub kind: SourceKind,
    pub path: PathBuf,
    pub rows_read: usize,
    pub rows_used: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    pub cellas: usize,
}

impl SourceReport {
    fn new<T>(path: PathBuf, values: &SourceValues<T>) -> Self {
        let ExtractStats { rows_read, rows_used, skipped } = values.stats.clone();
        Self { kind: values.kind, path, rows_read, rows_used, skipped, cellas: values.values.len() }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub stats_date: NaiveDate,
    pub target: String,
    pub write_mode: WriteMode,
    pub sources: Vec<SourceReport>,
    pub records: Vec<CellaRecord>,
    pub unmatched_filter: Vec<String>,
    /// `None` for dry runs.
    pub written: Option<WriteSummary>,
}

/// Read all three sources and merge them.
pub fn build_batch(config: &RunConfig) -> Result<(MergedBatch, Vec<SourceReport>), LoadError> {
    let partial = load_report(&config.partial, config.stats_date)?;
    let full = load_report(&config.full, config.stats_date)?;
    let forecast = load_forecast(&config.forecast)?;

    let batch =
        merge_sources(config.stats_date, &partial, &full, &forecast, config.filter.as_ref());
    tracing::info!("Merged {} cella records for {}", batch.records.len(), batch.stats_date);

    let sources = vec![
        SourceReport::new(config.partial.path.clone(), &partial),
        SourceReport::new(config.full.path.clone(), &full),
        SourceReport::new(config.forecast.path.clone(), &forecast),
    ];
    Ok((batch, sources))
}

/// Run the load. Without a store nothing is written.
pub fn run(config: &RunConfig, store: Option<&mut dyn StatsStore>) -> Result<RunReport, LoadError> {
    let (batch, sources) = build_batch(config)?;

    let written = match store {
        Some(store) => {
            tracing::info!(
                "Writing {} rows to {} on {} ({} mode)",
                batch.records.len(),
                config.target,
                store.describe(),
                config.write_mode
            );
            Some(store.write_batch(&config.target, &batch, config.write_mode)?)
        }
        None => None,
    };

    Ok(RunReport {
        stats_date: batch.stats_date,
        target: config.target.to_string(),
        write_mode: config.write_mode,
        sources,
        records: batch.records,
        unmatched_filter: batch.unmatched_filter,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::store::SqliteStore;
    use rust_xlsxwriter::Workbook;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_report(path: &Path, rows: &[(&str, &str)]) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Cella").expect("write");
        sheet.write_string(0, 1, "Плановая дата поставки").expect("write");
        for (idx, (cella, date)) in rows.iter().enumerate() {
            let row = idx as u32 + 1;
            sheet.write_string(row, 0, *cella).expect("write");
            sheet.write_string(row, 1, *date).expect("write");
        }
        workbook.save(path).expect("save");
    }

    fn config(dir: &Path) -> RunConfig {
        let partial = dir.join("partial.xlsx");
        let full = dir.join("full.xlsx");
        let forecast = dir.join("forecast.csv");
        write_report(
            &partial,
            &[("A", "14.10.2026"), ("A", "14.10.2026"), ("B", "14.10.2026"), ("C", "13.10.2026")],
        );
        write_report(&full, &[("A", "2026-10-14")]);
        std::fs::write(&forecast, "cella;Ожидается\nB;2,5\n").expect("write");

        let mut settings = Settings::default();
        settings.partial.path = Some(partial);
        settings.full.path = Some(full);
        settings.forecast.path = Some(forecast);
        settings.stats_date = NaiveDate::from_ymd_opt(2026, 10, 14);
        RunConfig::resolve(settings).expect("resolve")
    }

    #[test]
    fn dry_run_merges_without_writing() {
        let tmp = TempDir::new().expect("tmp");
        let cfg = config(tmp.path());

        let report = run(&cfg, None).expect("run");
        assert!(report.written.is_none());
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].partial_count, Some(2));
        assert_eq!(report.records[0].full_count, Some(1));
        assert_eq!(report.records[1].forecast_expected, Some(2.5));
        assert_eq!(report.sources[0].skipped[&SkipReason::OtherDate], 1);
        assert_eq!(report.target, "REPORT.execution-of-orders");
    }

    #[test]
    fn run_writes_batch_through_store() {
        let tmp = TempDir::new().expect("tmp");
        let cfg = config(tmp.path());
        let db = tmp.path().join("out.sqlite");
        let mut store = SqliteStore::open(&db).expect("open");

        let report = run(&cfg, Some(&mut store)).expect("run");
        assert_eq!(report.written, Some(WriteSummary { deleted: 0, written: 2 }));

        let conn = rusqlite::Connection::open(&db).expect("open");
        let full_for_b: Option<i64> = conn
            .query_row(
                "SELECT full_count FROM \"REPORT.execution-of-orders\" WHERE cella = 'B'",
                [],
                |r| r.get(0),
            )
            .expect("row for B");
        assert_eq!(full_for_b, None);
    }

    #[test]
    fn missing_source_aborts_before_writing() {
        let tmp = TempDir::new().expect("tmp");
        let mut cfg = config(tmp.path());
        cfg.forecast.path = tmp.path().join("absent.csv");
        let db = tmp.path().join("out.sqlite");
        let mut store = SqliteStore::open(&db).expect("open");

        let err = run(&cfg, Some(&mut store)).expect_err("must fail");
        assert_eq!(err.exit_code(), 3);

        let conn = rusqlite::Connection::open(&db).expect("open");
        let tables: i64 = conn
            .query_row("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'", [], |r| r.get(0))
            .expect("count");
        assert_eq!(tables, 0);
    }
}
