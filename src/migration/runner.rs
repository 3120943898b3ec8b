//! Applies pending migrations against a connection pool.
//!
//! # Responsibilities
//! - Create and read the schema history table
//! - Validate checksums of already-applied versions
//! - Apply each pending version in its own transaction with its history row
//!
//! # Design Decisions
//! - A failed script rolls back alone; earlier versions of the same run stay committed
//! - Scripts are executed verbatim (no placeholder expansion)
//! - History table name is interpolated into SQL, so it must be a plain identifier

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use sqlx::{AnyConnection, Executor};

use crate::config::MigrationConfig;
use crate::migration::error::MigrationError;
use crate::migration::source::{Migration, MigrationSource};
use crate::migration::{is_valid_identifier, DEFAULT_HISTORY_TABLE};
use crate::observability::metrics;
use crate::pool::{ConnectionPool, DatabaseBackend, PoolError, PoolResource};

/// Knobs for a single `migrate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOptions {
    pub enabled: bool,
    /// Defaults to `schema_history`.
    pub history_table: Option<String>,
    /// Must stay `false`.
    pub placeholder_replacement: bool,
    pub validate_checksums: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            history_table: None,
            placeholder_replacement: false,
            validate_checksums: true,
        }
    }
}

impl MigrationOptions {
    pub fn from_config(config: &MigrationConfig) -> Self {
        Self {
            enabled: config.enabled,
            history_table: config.history_table.clone(),
            placeholder_replacement: false,
            validate_checksums: config.validate_checksums,
        }
    }

    pub fn history_table(&self) -> &str {
        self.history_table.as_deref().unwrap_or(DEFAULT_HISTORY_TABLE)
    }
}

/// Outcome of a `migrate` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationResult {
    /// Versions applied by this call, ascending.
    pub applied: Vec<i64>,
    /// Highest version recorded in history after the call.
    pub current_version: Option<i64>,
    /// True when migrations were disabled.
    pub skipped: bool,
}

impl MigrationResult {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Applies schema migrations to a pool of type `P`.
#[async_trait]
pub trait SchemaMigrator<P: PoolResource>: Send + Sync {
    async fn migrate(&self, pool: &P, options: &MigrationOptions) -> Result<MigrationResult, MigrationError>;
}

/// Versioned migration runner over a [`MigrationSource`].
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    source: MigrationSource,
}

impl MigrationRunner {
    pub fn new(source: MigrationSource) -> Self {
        Self { source }
    }

    /// Runner over the `V*.sql` files in `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, MigrationError> {
        Ok(Self::new(MigrationSource::from_dir(dir)?))
    }

    pub fn source(&self) -> &MigrationSource {
        &self.source
    }

    /// Apply every pending migration in ascending version order.
    pub async fn migrate(
        &self,
        pool: &ConnectionPool,
        options: &MigrationOptions,
    ) -> Result<MigrationResult, MigrationError> {
        if !options.enabled {
            tracing::info!("Schema migrations disabled, skipping");
            return Ok(MigrationResult::skipped());
        }
        if options.placeholder_replacement {
            return Err(MigrationError::PlaceholderReplacement);
        }
        let table = options.history_table();
        if !is_valid_identifier(table) {
            return Err(MigrationError::InvalidTableName(table.to_string()));
        }
        if pool.is_closed() {
            return Err(PoolError::Closed.into());
        }

        let backend = pool.backend();
        sqlx::raw_sql(&create_history_sql(backend, table))
            .execute(pool.pool())
            .await
            .map_err(MigrationError::History)?;

        let rows: Vec<(i64, String)> =
            sqlx::query_as(&format!("SELECT version, checksum FROM {} ORDER BY version", table))
                .fetch_all(pool.pool())
                .await
                .map_err(MigrationError::History)?;
        let recorded: BTreeMap<i64, String> = rows.into_iter().collect();

        for (version, applied) in &recorded {
            match self.source.get(*version) {
                Some(migration) if options.validate_checksums && migration.checksum != *applied => {
                    return Err(MigrationError::ChecksumMismatch {
                        version: *version,
                        applied: applied.clone(),
                        resolved: migration.checksum.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    tracing::warn!(version = *version, "Applied migration not found in source");
                }
            }
        }

        let pending: Vec<&Migration> = self
            .source
            .iter()
            .filter(|m| !recorded.contains_key(&m.version))
            .collect();

        tracing::info!(
            history_table = %table,
            recorded = recorded.len(),
            pending = pending.len(),
            "Schema history read"
        );

        let insert = insert_history_sql(backend, table);
        let mut applied = Vec::with_capacity(pending.len());
        for migration in pending {
            apply_one(pool, migration, &insert).await?;
            applied.push(migration.version);
        }

        let current_version = recorded
            .keys()
            .next_back()
            .copied()
            .into_iter()
            .chain(applied.last().copied())
            .max();

        if applied.is_empty() {
            tracing::info!(current_version = ?current_version, "Schema is up to date");
        } else {
            tracing::info!(
                applied = applied.len(),
                current_version = ?current_version,
                "Schema migrations applied"
            );
        }

        Ok(MigrationResult {
            applied,
            current_version,
            skipped: false,
        })
    }
}

#[async_trait]
impl SchemaMigrator<ConnectionPool> for MigrationRunner {
    async fn migrate(
        &self,
        pool: &ConnectionPool,
        options: &MigrationOptions,
    ) -> Result<MigrationResult, MigrationError> {
        MigrationRunner::migrate(self, pool, options).await
    }
}

async fn apply_one(pool: &ConnectionPool, migration: &Migration, insert: &str) -> Result<(), MigrationError> {
    let failed = |source: sqlx::Error| MigrationError::Failed {
        version: migration.version,
        description: migration.description.clone(),
        source,
    };

    tracing::info!(
        version = migration.version,
        description = %migration.description,
        "Applying migration"
    );
    let started = Instant::now();

    // Dropping the transaction on any early return rolls it back.
    let mut tx = pool.pool().begin().await.map_err(failed)?;
    let conn: &mut AnyConnection = &mut tx;
    // Unprepared execution, so multi-statement scripts run as-is.
    Executor::execute(&mut *conn, migration.sql.as_str())
        .await
        .map_err(failed)?;

    let elapsed_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
    let installed_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0);
    sqlx::query(insert)
        .bind(migration.version)
        .bind(migration.description.clone())
        .bind(migration.checksum.clone())
        .bind(installed_at)
        .bind(elapsed_ms)
        .execute(&mut *conn)
        .await
        .map_err(failed)?;
    tx.commit().await.map_err(failed)?;

    metrics::record_migration_applied(migration.version);
    tracing::debug!(version = migration.version, elapsed_ms, "Migration committed");
    Ok(())
}

fn create_history_sql(backend: DatabaseBackend, table: &str) -> String {
    let description = match backend {
        DatabaseBackend::Sqlite => "TEXT",
        DatabaseBackend::MySql | DatabaseBackend::Postgres => "VARCHAR(200)",
    };
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\
         version BIGINT NOT NULL PRIMARY KEY, \
         description {description} NOT NULL, \
         checksum VARCHAR(64) NOT NULL, \
         installed_at BIGINT NOT NULL, \
         execution_time_ms BIGINT NOT NULL)"
    )
}

fn insert_history_sql(backend: DatabaseBackend, table: &str) -> String {
    let params: Vec<String> = (1..=5).map(|i| backend.placeholder(i)).collect();
    format!(
        "INSERT INTO {} (version, description, checksum, installed_at, execution_time_ms) VALUES ({})",
        table,
        params.join(", ")
    )
}
