//! Error taxonomy for a load run.
//!
//! Every failure is fatal. The variants fall into three kinds (configuration,
//! source read, database) which decide the process exit code.

use std::fmt;
use std::path::PathBuf;

use crate::domain::SourceKind;

/// Broad category of a [`LoadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    SourceRead,
    Database,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            // 2 is left to clap usage errors
            ErrorKind::Configuration => 5,
            ErrorKind::SourceRead => 3,
            ErrorKind::Database => 4,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration error",
            ErrorKind::SourceRead => "source read error",
            ErrorKind::Database => "database error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A setting has a value that cannot be used.
    #[error("invalid {setting}: {message}")]
    InvalidSetting { setting: &'static str, message: String },

    /// Config file could not be read or parsed.
    #[error("invalid config file {path}: {message}")]
    ConfigFile { path: PathBuf, message: String },

    /// Input file does not exist.
    #[error("{kind} file not found: {path}")]
    SourceMissing { kind: SourceKind, path: PathBuf },

    /// Input file exists but could not be parsed in its expected format.
    #[error("failed to read {kind} file {path}: {message}")]
    SourceUnreadable { kind: SourceKind, path: PathBuf, message: String },

    /// Expected column is not in the header row.
    #[error("column '{column}' not found in {kind} file {path} (available: {available})")]
    MissingColumn { kind: SourceKind, path: PathBuf, column: String, available: String },

    #[error("postgres: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Existing target table lacks columns the loader writes.
    #[error("table {table} does not match the expected layout, missing columns: {}", missing.join(", "))]
    SchemaMismatch { table: String, missing: Vec<String> },

    /// Value cannot be stored in its target column.
    #[error("value out of range for column {column} (cella {cella}): {value}")]
    ValueOutOfRange { column: &'static str, cella: String, value: String },

    /// Database runtime could not be started.
    #[error("database runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::InvalidSetting { .. } | LoadError::ConfigFile { .. } => {
                ErrorKind::Configuration
            }
            LoadError::SourceMissing { .. }
            | LoadError::SourceUnreadable { .. }
            | LoadError::MissingColumn { .. } => ErrorKind::SourceRead,
            LoadError::Postgres(_)
            | LoadError::Sqlite(_)
            | LoadError::SchemaMismatch { .. }
            | LoadError::ValueOutOfRange { .. }
            | LoadError::Runtime(_) => ErrorKind::Database,
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }

    pub(crate) fn invalid(setting: &'static str, message: impl Into<String>) -> Self {
        LoadError::InvalidSetting { setting, message: message.into() }
    }

    pub(crate) fn unreadable(
        kind: SourceKind,
        path: impl Into<PathBuf>,
        message: impl fmt::Display,
    ) -> Self {
        LoadError::SourceUnreadable { kind, path: path.into(), message: message.to_string() }
    }
}

/// Exit code for an error surfaced at the top of the CLI.
///
/// Walks the `anyhow` chain for a [`LoadError`]; anything else exits with 1.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain().find_map(|cause| cause.downcast_ref::<LoadError>()).map_or(1, LoadError::exit_code)
}
