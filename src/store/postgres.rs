//! PostgreSQL target.
//!
//! The pipeline is synchronous; this store owns a current-thread runtime that
//! drives its single connection.

use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Postgres, Transaction};
use tokio::runtime::{Builder, Runtime};

use super::sql::{self, Placeholder};
use super::{missing_columns, to_integer_column, StatsStore, TableRef, WriteMode, WriteSummary};
use crate::config::DatabaseSettings;
use crate::domain::MergedBatch;
use crate::error::LoadError;

pub struct PostgresStore {
    // Dropped before the runtime that drives it.
    conn: PgConnection,
    runtime: Runtime,
    location: String,
}

/// Connection options for `settings`.
pub fn connect_options(settings: &DatabaseSettings) -> PgConnectOptions {
    let mut options = PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .database(&settings.name)
        .username(&settings.user)
        .application_name("cella-stats");
    if !settings.password.is_empty() {
        options = options.password(&settings.password);
    }
    options
}

impl PostgresStore {
    pub fn connect(settings: &DatabaseSettings) -> Result<Self, LoadError> {
        let runtime =
            Builder::new_current_thread().enable_all().build().map_err(LoadError::Runtime)?;
        let location = format!(
            "postgres {}@{}:{}/{}",
            settings.user, settings.host, settings.port, settings.name
        );
        tracing::info!("Connecting to {}", location);
        let conn = runtime.block_on(PgConnection::connect_with(&connect_options(settings)))?;
        Ok(Self { conn, runtime, location })
    }
}

impl StatsStore for PostgresStore {
    fn describe(&self) -> String {
        self.location.clone()
    }

    fn write_batch(
        &mut self,
        target: &TableRef,
        batch: &MergedBatch,
        mode: WriteMode,
    ) -> Result<WriteSummary, LoadError> {
        let Self { conn, runtime, .. } = self;
        runtime.block_on(write_batch(conn, target, batch, mode))
    }
}

async fn write_batch(
    conn: &mut PgConnection,
    target: &TableRef,
    batch: &MergedBatch,
    mode: WriteMode,
) -> Result<WriteSummary, LoadError> {
    let qualified =
        format!("{}.{}", sql::quote_ident(&target.schema), sql::quote_ident(&target.table));

    let mut tx = conn.begin().await?;

    let create_schema = sql::create_schema(&target.schema);
    tracing::debug!("{}", create_schema);
    sqlx::raw_sql(&create_schema).execute(&mut *tx).await?;
    let create_table = sql::create_table(&qualified);
    tracing::debug!("{}", create_table);
    sqlx::raw_sql(&create_table).execute(&mut *tx).await?;

    ensure_layout(&mut tx, target).await?;

    let deleted = match mode {
        WriteMode::Replace => {
            sqlx::raw_sql(&sql::delete_all(&qualified)).execute(&mut *tx).await?.rows_affected()
        }
        WriteMode::Upsert => 0,
    };

    let insert = sql::insert(&qualified, mode, Placeholder::Dollar);
    let mut written = 0u64;
    for record in &batch.records {
        let partial = to_integer_column("partial_count", &record.cella, record.partial_count)?;
        let full = to_integer_column("full_count", &record.cella, record.full_count)?;
        written += sqlx::query(&insert)
            .bind(&record.cella)
            .bind(batch.stats_date)
            .bind(partial)
            .bind(full)
            .bind(record.forecast_expected)
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }

    tx.commit().await?;
    tracing::debug!("Committed {} rows to {} ({} deleted)", written, qualified, deleted);
    Ok(WriteSummary { deleted, written })
}

async fn ensure_layout(
    tx: &mut Transaction<'_, Postgres>,
    target: &TableRef,
) -> Result<(), LoadError> {
    let existing: Vec<String> = sqlx::query_scalar(
        "SELECT column_name::text FROM information_schema.columns \
         WHERE table_schema = $1 AND table_name = $2",
    )
    .bind(&target.schema)
    .bind(&target.table)
    .fetch_all(&mut **tx)
    .await?;

    let missing = missing_columns(&existing);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoadError::SchemaMismatch { table: target.to_string(), missing })
    }
}
