//! Persistence of merged batches.
//!
//! Both backends run the same sequence inside one transaction: create the
//! table if needed, verify its columns, clear it (replace mode), insert or
//! upsert every record, commit.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Connection;
use crate::domain::MergedBatch;
use crate::error::LoadError;

pub mod postgres;
pub mod sql;
pub mod sqlite;

pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

/// Columns every target table must have.
pub const COLUMNS: [&str; 5] =
    ["cella", "stats_date", "partial_count", "full_count", "forecast_expected"];

/// How a batch replaces what is already in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Delete every row, then insert the batch.
    #[default]
    Replace,
    /// Insert, updating rows with the same Cella and stats date.
    Upsert,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WriteMode::Replace => "replace",
            WriteMode::Upsert => "upsert",
        })
    }
}

/// Schema-qualified target table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: &str, table: &str) -> Result<Self, LoadError> {
        let schema = validate_identifier("schema", schema)?;
        let table = validate_identifier("table", table)?;
        Ok(Self { schema, table })
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

fn validate_identifier(setting: &'static str, value: &str) -> Result<String, LoadError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LoadError::invalid(setting, "must not be empty"));
    }
    if value.contains('\0') {
        return Err(LoadError::invalid(setting, "must not contain NUL characters"));
    }
    Ok(value.to_string())
}

/// Row counts touched by a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub deleted: u64,
    pub written: u64,
}

/// A database that can persist a merged batch atomically.
pub trait StatsStore {
    /// Human-readable location, without credentials.
    fn describe(&self) -> String;

    fn write_batch(
        &mut self,
        target: &TableRef,
        batch: &MergedBatch,
        mode: WriteMode,
    ) -> Result<WriteSummary, LoadError>;
}

/// Open the store named by `connection`.
pub fn open_store(connection: &Connection) -> Result<Box<dyn StatsStore>, LoadError> {
    match connection {
        Connection::Postgres(settings) => Ok(Box::new(PostgresStore::connect(settings)?)),
        Connection::Sqlite { path } => Ok(Box::new(SqliteStore::open(path)?)),
    }
}

/// Expected columns absent from `existing`, compared case-insensitively.
pub(crate) fn missing_columns(existing: &[String]) -> Vec<String> {
    COLUMNS
        .iter()
        .filter(|wanted| !existing.iter().any(|have| have.eq_ignore_ascii_case(wanted)))
        .map(|c| c.to_string())
        .collect()
}

/// Convert a count for an INTEGER column.
pub(crate) fn to_integer_column(
    column: &'static str,
    cella: &str,
    value: Option<i64>,
) -> Result<Option<i32>, LoadError> {
    value
        .map(|v| {
            i32::try_from(v).map_err(|_| LoadError::ValueOutOfRange {
                column,
                cella: cella.to_string(),
                value: v.to_string(),
            })
        })
        .transpose()
}
