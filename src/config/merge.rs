//! Layer command-line and environment values over file settings.

use chrono::NaiveDate;
use std::path::PathBuf;

use super::settings::{Backend, Settings};
use crate::store::WriteMode;

/// Values supplied by flags or their environment variables.
///
/// `None` leaves the underlying setting untouched.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub partial_path: Option<PathBuf>,
    pub full_path: Option<PathBuf>,
    pub forecast_path: Option<PathBuf>,
    pub cella: Option<Vec<String>>,
    pub stats_date: Option<NaiveDate>,
    pub timezone: Option<String>,
    pub report_cella_column: Option<String>,
    pub date_column: Option<String>,
    pub date_filter: Option<bool>,
    pub forecast_cella_column: Option<String>,
    pub expected_column: Option<String>,
    pub backend: Option<Backend>,
    pub sqlite_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub schema: Option<String>,
    pub table: Option<String>,
    pub write_mode: Option<WriteMode>,
}

/// Apply `overrides` on top of `settings`.
///
/// Report column overrides apply to both the partial and the full report.
pub fn merge_cli_with_config(mut settings: Settings, overrides: CliOverrides) -> Settings {
    fn set<T>(target: &mut T, value: Option<T>) {
        if let Some(value) = value {
            *target = value;
        }
    }

    if overrides.partial_path.is_some() {
        settings.partial.path = overrides.partial_path;
    }
    if overrides.full_path.is_some() {
        settings.full.path = overrides.full_path;
    }
    if overrides.forecast_path.is_some() {
        settings.forecast.path = overrides.forecast_path;
    }

    for report in [&mut settings.partial, &mut settings.full] {
        set(&mut report.cella_column, overrides.report_cella_column.clone());
        set(&mut report.date_column, overrides.date_column.clone());
        set(&mut report.date_filter, overrides.date_filter);
    }
    set(&mut settings.forecast.cella_column, overrides.forecast_cella_column);
    if overrides.expected_column.is_some() {
        settings.forecast.expected_column = overrides.expected_column;
    }

    set(&mut settings.cella, overrides.cella);
    if overrides.stats_date.is_some() {
        settings.stats_date = overrides.stats_date;
    }
    set(&mut settings.timezone, overrides.timezone);
    set(&mut settings.write_mode, overrides.write_mode);

    let db = &mut settings.database;
    set(&mut db.backend, overrides.backend);
    set(&mut db.sqlite_path, overrides.sqlite_path);
    set(&mut db.host, overrides.host);
    set(&mut db.port, overrides.port);
    set(&mut db.name, overrides.database);
    set(&mut db.user, overrides.user);
    set(&mut db.password, overrides.password);
    set(&mut db.schema, overrides.schema);
    set(&mut db.table, overrides.table);

    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_overrides_keep_settings() {
        let settings = Settings::default();
        let merged = merge_cli_with_config(settings.clone(), CliOverrides::default());
        assert_eq!(merged, settings);
    }

    #[test]
    fn flags_beat_file_values() {
        let mut file = Settings::default();
        file.database.host = "file-host".to_string();
        file.database.port = 6543;
        file.cella = vec!["FromFile".to_string()];
        file.partial.sheet = Some("TDSheet".to_string());

        let merged = merge_cli_with_config(
            file,
            CliOverrides {
                host: Some("flag-host".to_string()),
                cella: Some(vec!["Cella613".to_string()]),
                write_mode: Some(WriteMode::Upsert),
                ..CliOverrides::default()
            },
        );

        assert_eq!(merged.database.host, "flag-host");
        assert_eq!(merged.database.port, 6543);
        assert_eq!(merged.cella, vec!["Cella613"]);
        assert_eq!(merged.write_mode, WriteMode::Upsert);
        assert_eq!(merged.partial.sheet.as_deref(), Some("TDSheet"));
    }

    #[test]
    fn report_column_overrides_apply_to_both_reports() {
        let merged = merge_cli_with_config(
            Settings::default(),
            CliOverrides {
                report_cella_column: Some("Ячейка".to_string()),
                date_filter: Some(false),
                ..CliOverrides::default()
            },
        );
        assert_eq!(merged.partial.cella_column, "Ячейка");
        assert_eq!(merged.full.cella_column, "Ячейка");
        assert!(!merged.partial.date_filter);
        assert!(!merged.full.date_filter);
        assert_eq!(merged.forecast.cella_column, "cella");
    }
}
