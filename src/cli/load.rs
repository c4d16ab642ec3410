//! Load command implementation

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use super::utils::parse_csv;
use crate::config::{load_config, merge_cli_with_config, Backend, CliOverrides, RunConfig};
use crate::pipeline::{self, RunReport};
use crate::store::{open_store, WriteMode};

/// Run summary format on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct LoadArgs {
    /// Config file (TOML or YAML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Partial report workbook
    #[arg(long, value_name = "FILE", env = "PARTIAL_XLS")]
    pub partial: Option<PathBuf>,

    /// Full report workbook
    #[arg(long, value_name = "FILE", env = "FULL_XLS")]
    pub full: Option<PathBuf>,

    /// Hourly forecast CSV
    #[arg(long, value_name = "FILE", env = "FORECAST_CSV")]
    pub forecast: Option<PathBuf>,

    /// Only load these Cellas (comma-separated)
    #[arg(long, value_name = "LIST", env = "CELLA")]
    pub cella: Option<String>,

    /// Statistics date (YYYY-MM-DD); defaults to the previous working day
    #[arg(long, value_name = "DATE", env = "STATS_DATE")]
    pub stats_date: Option<NaiveDate>,

    /// IANA timezone used to compute the default date
    #[arg(long, value_name = "TZ", env = "STATS_TZ")]
    pub timezone: Option<String>,

    /// Cella column in both reports
    #[arg(long, value_name = "NAME", env = "CELLA_COL")]
    pub cella_column: Option<String>,

    /// Planned delivery date column in both reports
    #[arg(long, value_name = "NAME", env = "DATE_COL")]
    pub date_column: Option<String>,

    /// Count every report row regardless of its date
    #[arg(long)]
    pub no_date_filter: bool,

    /// Cella column in the forecast
    #[arg(long, value_name = "NAME", env = "CSV_CELLA_COL")]
    pub csv_cella_column: Option<String>,

    /// Expected-value column in the forecast (auto-detected when unset)
    #[arg(long, value_name = "NAME", env = "EXPECTED_COL")]
    pub expected_column: Option<String>,

    /// Database backend
    #[arg(long, value_enum, env = "DB_BACKEND")]
    pub backend: Option<Backend>,

    /// SQLite database file (sqlite backend)
    #[arg(long, value_name = "FILE", env = "SQLITE_PATH")]
    pub sqlite_path: Option<PathBuf>,

    /// PostgreSQL host
    #[arg(long, value_name = "HOST", env = "PGHOST")]
    pub pg_host: Option<String>,

    /// PostgreSQL port
    #[arg(long, value_name = "PORT", env = "PGPORT")]
    pub pg_port: Option<u16>,

    /// PostgreSQL database
    #[arg(long, value_name = "NAME", env = "PGDATABASE")]
    pub pg_database: Option<String>,

    /// PostgreSQL user
    #[arg(long, value_name = "USER", env = "PGUSER")]
    pub pg_user: Option<String>,

    /// PostgreSQL password
    #[arg(long, value_name = "PASSWORD", env = "PGPASSWORD", hide_env_values = true)]
    pub pg_password: Option<String>,

    /// Target schema
    #[arg(long, value_name = "NAME", env = "SCHEMA")]
    pub schema: Option<String>,

    /// Target table
    #[arg(long, value_name = "NAME", env = "TABLE")]
    pub table: Option<String>,

    /// How existing rows are treated
    #[arg(long, value_enum, env = "WRITE_MODE")]
    pub write_mode: Option<WriteMode>,

    /// Merge and print the batch without touching the database
    #[arg(long)]
    pub dry_run: bool,

    /// Summary format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl LoadArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            partial_path: self.partial.clone(),
            full_path: self.full.clone(),
            forecast_path: self.forecast.clone(),
            cella: parse_csv(&self.cella),
            stats_date: self.stats_date,
            timezone: self.timezone.clone(),
            report_cella_column: self.cella_column.clone(),
            date_column: self.date_column.clone(),
            date_filter: if self.no_date_filter { Some(false) } else { None },
            forecast_cella_column: self.csv_cella_column.clone(),
            expected_column: self.expected_column.clone(),
            backend: self.backend,
            sqlite_path: self.sqlite_path.clone(),
            host: self.pg_host.clone(),
            port: self.pg_port,
            database: self.pg_database.clone(),
            user: self.pg_user.clone(),
            password: self.pg_password.clone(),
            schema: self.schema.clone(),
            table: self.table.clone(),
            write_mode: self.write_mode,
        }
    }
}

pub fn run(args: LoadArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let file_config = load_config(&cwd, args.config.as_deref())?;
    let merged = merge_cli_with_config(file_config, args.overrides());
    let config = RunConfig::resolve(merged).context("Invalid configuration")?;
    tracing::info!("Loading statistics for {} into {}", config.stats_date, config.target);

    let report = if args.dry_run {
        pipeline::run(&config, None)?
    } else {
        let mut store = open_store(&config.connection)?;
        pipeline::run(&config, Some(store.as_mut()))
            .with_context(|| format!("Load into {} failed", config.target))?
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_text(&report),
    }
    Ok(())
}

fn print_text(report: &RunReport) {
    println!("Stats date: {}", report.stats_date);
    println!("Target: {} ({} mode)", report.target, report.write_mode);
    for source in &report.sources {
        let skipped: usize = source.skipped.values().sum();
        let mut line = format!(
            "  {}: {} rows read, {} used, {} skipped",
            source.kind, source.rows_read, source.rows_used, skipped
        );
        if skipped > 0 {
            let reasons: Vec<String> = source
                .skipped
                .iter()
                .map(|(reason, count)| format!("{}: {}", reason.as_str(), count))
                .collect();
            line.push_str(&format!(" ({})", reasons.join(", ")));
        }
        line.push_str(&format!(", {} cellas [{}]", source.cellas, source.path.display()));
        println!("{line}");
    }
    println!("Records: {}", report.records.len());
    if !report.unmatched_filter.is_empty() {
        println!("Not found in any source: {}", report.unmatched_filter.join(", "));
    }

    match &report.written {
        Some(summary) => {
            println!("Written: {} rows ({} deleted)", summary.written, summary.deleted);
        }
        None => {
            println!("Dry run: nothing written");
            for record in &report.records {
                println!(
                    "  {}\t{}\t{}\t{}",
                    record.cella,
                    display_or_null(record.partial_count),
                    display_or_null(record.full_count),
                    display_or_null(record.forecast_expected)
                );
            }
        }
    }
}

fn display_or_null<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "NULL".to_string(), |v| v.to_string())
}
