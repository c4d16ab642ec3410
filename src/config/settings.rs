//! Raw settings as read from defaults, config files and the command line.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::store::WriteMode;

pub const DEFAULT_PARTIAL_PATH: &str = "Частично.xls";
pub const DEFAULT_FULL_PATH: &str = "Целиком.xls";
pub const DEFAULT_FORECAST_PATH: &str = "Почасовой прогноз прихода заказов на склад.csv";
pub const DEFAULT_REPORT_CELLA_COLUMN: &str = "Cella";
pub const DEFAULT_DATE_COLUMN: &str = "Плановая дата поставки";
pub const DEFAULT_FORECAST_CELLA_COLUMN: &str = "cella";
pub const DEFAULT_TIMEZONE: &str = "Europe/Moscow";

/// Database backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Postgres,
    Sqlite,
}

/// Settings for a partial or full report workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSettings {
    /// Falls back to the report's well-known file name.
    pub path: Option<PathBuf>,
    /// First sheet when unset.
    pub sheet: Option<String>,
    pub header_row: usize,
    pub cella_column: String,
    pub date_column: String,
    pub date_filter: bool,
    pub count_column: Option<String>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            path: None,
            sheet: None,
            header_row: 0,
            cella_column: DEFAULT_REPORT_CELLA_COLUMN.to_string(),
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            date_filter: true,
            count_column: None,
        }
    }
}

/// Settings for the forecast export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastSettings {
    pub path: Option<PathBuf>,
    pub cella_column: String,
    /// Auto-detected when unset.
    pub expected_column: Option<String>,
    /// Sniffed from the header line when unset.
    pub delimiter: Option<char>,
    /// Detected when unset.
    pub encoding: Option<String>,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            path: None,
            cella_column: DEFAULT_FORECAST_CELLA_COLUMN.to_string(),
            expected_column: None,
            delimiter: None,
            encoding: None,
        }
    }
}

/// Connection and target table settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSettings {
    pub backend: Backend,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub schema: String,
    pub table: String,
    pub sqlite_path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Postgres,
            host: "localhost".to_string(),
            port: 5432,
            name: "postgres".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            schema: "REPORT".to_string(),
            table: "execution-of-orders".to_string(),
            sqlite_path: PathBuf::from("cella-stats.sqlite"),
        }
    }
}

// Hand-written so the password never reaches logs.
impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("schema", &self.schema)
            .field("table", &self.table)
            .field("sqlite_path", &self.sqlite_path)
            .finish()
    }
}

/// Complete settings before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub partial: ReportSettings,
    pub full: ReportSettings,
    pub forecast: ForecastSettings,
    pub database: DatabaseSettings,
    /// Cella filter; a comma-separated string or a list.
    #[serde(deserialize_with = "deserialize_list")]
    pub cella: Vec<String>,
    pub stats_date: Option<NaiveDate>,
    pub timezone: String,
    pub write_mode: WriteMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            partial: ReportSettings::default(),
            full: ReportSettings::default(),
            forecast: ForecastSettings::default(),
            database: DatabaseSettings::default(),
            cella: Vec::new(),
            stats_date: None,
            timezone: DEFAULT_TIMEZONE.to_string(),
            write_mode: WriteMode::default(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

fn deserialize_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => s.split(',').map(str::to_string).collect(),
        StringOrList::Many(items) => items,
    };
    Ok(raw.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
}
