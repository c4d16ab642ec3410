//! SQLite target for local runs.
//!
//! SQLite has no schemas, so the table lives in the main database under the
//! single identifier `"<schema>.<table>"`.

use rusqlite::{params, Connection, Transaction};
use std::path::{Path, PathBuf};

use super::sql::{self, Placeholder};
use super::{missing_columns, to_integer_column, StatsStore, TableRef, WriteMode, WriteSummary};
use crate::domain::MergedBatch;
use crate::error::LoadError;

pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                LoadError::invalid("sqlite path", format!("{}: {}", parent.display(), e))
            })?;
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn, path: path.to_path_buf() })
    }

    /// Name of the table backing `target`.
    pub fn table_name(target: &TableRef) -> String {
        format!("{}.{}", target.schema, target.table)
    }
}

impl StatsStore for SqliteStore {
    fn describe(&self) -> String {
        format!("sqlite {}", self.path.display())
    }

    fn write_batch(
        &mut self,
        target: &TableRef,
        batch: &MergedBatch,
        mode: WriteMode,
    ) -> Result<WriteSummary, LoadError> {
        let table = Self::table_name(target);
        let qualified = sql::quote_ident(&table);

        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql::create_table(&qualified))?;
        ensure_layout(&tx, &table)?;

        let deleted = match mode {
            WriteMode::Replace => tx.execute(&sql::delete_all(&qualified), [])? as u64,
            WriteMode::Upsert => 0,
        };

        let stats_date = batch.stats_date.format("%Y-%m-%d").to_string();
        let mut written = 0u64;
        {
            let mut stmt = tx.prepare(&sql::insert(&qualified, mode, Placeholder::Question))?;
            for record in &batch.records {
                let partial = to_integer_column("partial_count", &record.cella, record.partial_count)?;
                let full = to_integer_column("full_count", &record.cella, record.full_count)?;
                written += stmt.execute(params![
                    record.cella,
                    stats_date,
                    partial,
                    full,
                    record.forecast_expected
                ])? as u64;
            }
        }

        tx.commit()?;
        tracing::debug!("Committed {} rows to {} ({} deleted)", written, table, deleted);
        Ok(WriteSummary { deleted, written })
    }
}

fn ensure_layout(tx: &Transaction<'_>, table: &str) -> Result<(), LoadError> {
    let mut stmt = tx.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let existing: Vec<String> =
        stmt.query_map([table], |row| row.get(0))?.collect::<Result<_, _>>()?;
    let missing = missing_columns(&existing);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoadError::SchemaMismatch { table: table.to_string(), missing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CellaRecord;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn target() -> TableRef {
        TableRef::new("REPORT", "execution-of-orders").expect("target")
    }

    fn batch(day: u32, records: Vec<CellaRecord>) -> MergedBatch {
        MergedBatch {
            stats_date: NaiveDate::from_ymd_opt(2026, 10, day).expect("date"),
            records,
            unmatched_filter: Vec::new(),
        }
    }

    fn record(
        cella: &str,
        partial: Option<i64>,
        full: Option<i64>,
        expected: Option<f64>,
    ) -> CellaRecord {
        CellaRecord {
            cella: cella.to_string(),
            partial_count: partial,
            full_count: full,
            forecast_expected: expected,
        }
    }

    fn rows(path: &Path) -> Vec<(String, String, Option<i64>, Option<i64>, Option<f64>)> {
        let conn = Connection::open(path).expect("open");
        let mut stmt = conn
            .prepare(
                "SELECT cella, stats_date, partial_count, full_count, forecast_expected \
                 FROM \"REPORT.execution-of-orders\" ORDER BY stats_date, cella",
            )
            .expect("prepare");
        let rows = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)))
            .expect("query")
            .collect::<Result<_, _>>()
            .expect("rows");
        rows
    }

    #[test]
    fn creates_table_and_writes_nulls() {
        let tmp = TempDir::new().expect("tmp");
        let db = tmp.path().join("nested/stats.sqlite");
        let mut store = SqliteStore::open(&db).expect("open");

        let summary = store
            .write_batch(
                &target(),
                &batch(
                    14,
                    vec![record("A", Some(5), Some(10), None), record("B", Some(3), None, Some(2.5))],
                ),
                WriteMode::Replace,
            )
            .expect("write");
        assert_eq!(summary, WriteSummary { deleted: 0, written: 2 });

        assert_eq!(
            rows(&db),
            vec![
                ("A".to_string(), "2026-10-14".to_string(), Some(5), Some(10), None),
                ("B".to_string(), "2026-10-14".to_string(), Some(3), None, Some(2.5)),
            ]
        );
    }

    #[test]
    fn replace_mode_is_idempotent_and_drops_old_rows() {
        let tmp = TempDir::new().expect("tmp");
        let db = tmp.path().join("stats.sqlite");
        let mut store = SqliteStore::open(&db).expect("open");

        let old = batch(13, vec![record("OLD", Some(1), None, None)]);
        store.write_batch(&target(), &old, WriteMode::Replace).expect("first");
        let day = batch(14, vec![record("A", Some(5), None, None)]);
        store.write_batch(&target(), &day, WriteMode::Replace).expect("second");
        let before = rows(&db);
        let summary = store.write_batch(&target(), &day, WriteMode::Replace).expect("third");

        assert_eq!(summary.deleted, 1);
        assert_eq!(rows(&db), before);
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].0, "A");
    }

    #[test]
    fn upsert_mode_keeps_other_dates_and_updates_same_key() {
        let tmp = TempDir::new().expect("tmp");
        let db = tmp.path().join("stats.sqlite");
        let mut store = SqliteStore::open(&db).expect("open");

        let runs = [
            batch(13, vec![record("A", Some(1), None, None)]),
            batch(14, vec![record("A", Some(2), None, None)]),
            batch(14, vec![record("A", Some(3), Some(4), None)]),
        ];
        for run in &runs {
            store.write_batch(&target(), run, WriteMode::Upsert).expect("upsert");
        }

        let all = rows(&db);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].2, Some(1));
        assert_eq!(all[1], ("A".to_string(), "2026-10-14".to_string(), Some(3), Some(4), None));
    }

    #[test]
    fn mismatched_existing_table_is_rejected_and_rolled_back() {
        let tmp = TempDir::new().expect("tmp");
        let db = tmp.path().join("stats.sqlite");
        {
            let conn = Connection::open(&db).expect("open");
            conn.execute_batch(
                "CREATE TABLE \"REPORT.execution-of-orders\" (cella TEXT, stats_date DATE, qty INTEGER);\
                 INSERT INTO \"REPORT.execution-of-orders\" VALUES ('X', '2026-10-01', 9);",
            )
            .expect("seed");
        }

        let mut store = SqliteStore::open(&db).expect("open");
        let day = batch(14, vec![record("A", Some(1), None, None)]);
        let err = store.write_batch(&target(), &day, WriteMode::Replace).expect_err("must fail");
        assert!(matches!(err, LoadError::SchemaMismatch { ref missing, .. } if missing.len() == 3));

        let conn = Connection::open(&db).expect("open");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM \"REPORT.execution-of-orders\"", [], |r| r.get(0))
            .expect("count");
        assert_eq!(count, 1);
    }
}
