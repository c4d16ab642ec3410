//! Validated, immutable configuration for one run.

use chrono::NaiveDate;
use chrono_tz::Tz;
use std::collections::BTreeSet;
use std::path::PathBuf;

use super::settings::{
    Backend, DatabaseSettings, Settings, DEFAULT_FORECAST_PATH, DEFAULT_FULL_PATH,
    DEFAULT_PARTIAL_PATH,
};
use crate::domain::SourceKind;
use crate::error::LoadError;
use crate::store::{TableRef, WriteMode};
use crate::utils::{default_stats_date, today_in};

/// A report workbook to read.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportInput {
    pub kind: SourceKind,
    pub path: PathBuf,
    pub sheet: Option<String>,
    pub header_row: usize,
    pub cella_column: String,
    pub date_column: Option<String>,
    pub count_column: Option<String>,
}

/// The forecast export to read.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastInput {
    pub path: PathBuf,
    pub cella_column: String,
    pub expected_column: Option<String>,
    pub delimiter: Option<char>,
    pub encoding: Option<String>,
}

/// Where the batch is written.
#[derive(Debug, Clone, PartialEq)]
pub enum Connection {
    Postgres(DatabaseSettings),
    Sqlite { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub partial: ReportInput,
    pub full: ReportInput,
    pub forecast: ForecastInput,
    pub connection: Connection,
    pub target: TableRef,
    pub write_mode: WriteMode,
    pub stats_date: NaiveDate,
    /// `None` loads every Cella.
    pub filter: Option<BTreeSet<String>>,
}

impl RunConfig {
    /// Validate `settings`, taking "today" from the configured timezone.
    pub fn resolve(settings: Settings) -> Result<Self, LoadError> {
        Self::resolve_at(settings, today_in)
    }

    /// Validate `settings` with an injected clock.
    pub fn resolve_at(
        settings: Settings,
        today: impl FnOnce(Tz) -> NaiveDate,
    ) -> Result<Self, LoadError> {
        let timezone: Tz = settings.timezone.trim().parse().map_err(|_| {
            LoadError::invalid("timezone", format!("unknown zone '{}'", settings.timezone))
        })?;
        let stats_date = settings.stats_date.unwrap_or_else(|| default_stats_date(today(timezone)));

        let filter: BTreeSet<String> = settings
            .cella
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        let target = TableRef::new(&settings.database.schema, &settings.database.table)?;

        let report = |kind: SourceKind, s: super::settings::ReportSettings, default: &str| {
            ReportInput {
                kind,
                path: s.path.unwrap_or_else(|| PathBuf::from(default)),
                sheet: s.sheet,
                header_row: s.header_row,
                cella_column: s.cella_column,
                date_column: s.date_filter.then_some(s.date_column),
                count_column: s.count_column,
            }
        };

        let connection = match settings.database.backend {
            Backend::Postgres => Connection::Postgres(settings.database),
            Backend::Sqlite => Connection::Sqlite { path: settings.database.sqlite_path },
        };

        Ok(Self {
            partial: report(SourceKind::Partial, settings.partial, DEFAULT_PARTIAL_PATH),
            full: report(SourceKind::Full, settings.full, DEFAULT_FULL_PATH),
            forecast: ForecastInput {
                path: settings.forecast.path.unwrap_or_else(|| PathBuf::from(DEFAULT_FORECAST_PATH)),
                cella_column: settings.forecast.cella_column,
                expected_column: settings.forecast.expected_column,
                delimiter: settings.forecast.delimiter,
                encoding: settings.forecast.encoding,
            },
            connection,
            target,
            write_mode: settings.write_mode,
            stats_date,
            filter: (!filter.is_empty()).then_some(filter),
        })
    }
}
