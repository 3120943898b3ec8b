//! Managed connection pool handle.
//!
//! # Responsibilities
//! - Own the sqlx pool and its maintenance thread
//! - Enforce the one-way `Open → Closed` transition
//! - Close best-effort: bounded wait for checked-out connections
//!
//! # Design Decisions
//! - Cheap to clone; all clones share one state
//! - `close` is idempotent and safe on a pool that never became healthy
//! - The maintenance thread only reads pool counters, it never touches the runtime

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use sqlx::any::AnyPoolOptions;
use sqlx::pool::PoolConnection;
use sqlx::{Any, AnyPool, Executor};

use crate::migration::is_valid_identifier;
use crate::observability::metrics;
use crate::pool::error::{PoolError, PoolResult};
use crate::pool::settings::{DatabaseBackend, PoolSettings};
use crate::pool::threads::MaintenanceThreadFactory;

/// Point-in-time pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Open connections (idle + in use).
    pub size: u32,
    /// Connections waiting in the pool.
    pub idle: u32,
    /// Configured upper bound.
    pub max: u32,
}

impl PoolStats {
    fn read(pool: &AnyPool, max: u32) -> Self {
        let idle = u32::try_from(pool.num_idle()).unwrap_or(u32::MAX);
        Self {
            size: pool.size(),
            idle,
            max,
        }
    }

    /// Connections currently checked out.
    pub fn in_use(&self) -> u32 {
        self.size.saturating_sub(self.idle)
    }
}

struct MaintenanceWorker {
    stop: mpsc::Sender<()>,
    thread: JoinHandle<()>,
    daemon: bool,
}

struct PoolInner {
    pool: AnyPool,
    settings: PoolSettings,
    closed: AtomicBool,
    maintenance: Mutex<Option<MaintenanceWorker>>,
}

/// A managed, reusable set of database connections.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Connect eagerly so unreachable endpoints and bad credentials fail here.
    pub async fn open(settings: PoolSettings) -> PoolResult<Self> {
        sqlx::any::install_default_drivers();

        let connect_url = settings.connect_url()?;
        let statements = Arc::new(settings.backend.session_statements(settings.isolation, settings.autocommit));

        tracing::info!(
            url = %settings.redacted_url(),
            max_pool_size = settings.max_pool_size,
            min_idle = settings.min_idle,
            isolation = ?settings.isolation,
            autocommit = settings.autocommit,
            "Opening connection pool"
        );

        let pool = AnyPoolOptions::new()
            .max_connections(settings.max_pool_size)
            .min_connections(settings.min_idle)
            .max_lifetime(settings.max_lifetime)
            .idle_timeout(settings.idle_timeout)
            .acquire_timeout(settings.acquire_timeout)
            .test_before_acquire(true)
            .after_connect(move |conn, _meta| {
                let statements = Arc::clone(&statements);
                Box::pin(async move {
                    for statement in statements.iter() {
                        conn.execute(statement.as_str()).await?;
                    }
                    Ok(())
                })
            })
            .connect(&connect_url)
            .await
            .map_err(|source| PoolError::Initialization {
                url: settings.redacted_url(),
                source,
            })?;

        let factory = MaintenanceThreadFactory::new(&settings.maintenance);
        let (stop, stop_rx) = mpsc::channel();
        let watched = pool.clone();
        let max = settings.max_pool_size;
        let interval = settings.maintenance.interval;
        let maintenance = match factory.spawn(move || maintenance_loop(watched, max, interval, stop_rx)) {
            Ok(thread) => Some(MaintenanceWorker {
                stop,
                thread,
                daemon: factory.is_daemon(),
            }),
            Err(e) => {
                // The pool is usable without upkeep reporting.
                tracing::warn!(error = %e, "Failed to spawn pool maintenance thread");
                None
            }
        };

        let handle = Self {
            inner: Arc::new(PoolInner {
                pool,
                settings,
                closed: AtomicBool::new(false),
                maintenance: Mutex::new(maintenance),
            }),
        };
        metrics::record_pool_stats(&handle.stats());
        Ok(handle)
    }

    /// Settings this pool was opened with.
    pub fn settings(&self) -> &PoolSettings {
        &self.inner.settings
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.inner.settings.backend
    }

    pub fn max_pool_size(&self) -> u32 {
        self.inner.settings.max_pool_size
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats::read(&self.inner.pool, self.inner.settings.max_pool_size)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Underlying sqlx pool for query execution.
    pub fn pool(&self) -> &AnyPool {
        &self.inner.pool
    }

    /// Check out a connection, honoring the acquire timeout.
    pub async fn acquire(&self) -> PoolResult<PoolConnection<Any>> {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }
        self.inner.pool.acquire().await.map_err(|e| match e {
            sqlx::Error::PoolClosed => PoolError::Closed,
            other => PoolError::Acquire(other),
        })
    }

    /// Close the pool. Later calls are no-ops.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("Connection pool already closed");
            return;
        }

        let worker = self.inner.maintenance.lock().ok().and_then(|mut w| w.take());
        if let Some(worker) = worker {
            drop(worker.stop);
            if !worker.daemon {
                let _ = tokio::task::spawn_blocking(move || worker.thread.join()).await;
            }
        }

        let stats = self.stats();
        let timeout = self.inner.settings.close_timeout;
        if tokio::time::timeout(timeout, self.inner.pool.close()).await.is_err() {
            tracing::warn!(
                in_use = stats.in_use(),
                timeout_secs = timeout.as_secs(),
                "Connections still checked out after close timeout; abandoning them"
            );
        }

        tracing::info!(url = %self.inner.settings.redacted_url(), "Connection pool closed");
    }

    /// Delete all rows from every user table except those in `keep`.
    ///
    /// Test support: resets a migrated schema between cases.
    pub async fn reset_data(&self, keep: &[&str]) -> PoolResult<usize> {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }
        let backend = self.backend();
        let tables: Vec<String> = sqlx::query_scalar(list_tables_sql(backend))
            .fetch_all(&self.inner.pool)
            .await
            .map_err(PoolError::Query)?;
        let targets: Vec<&String> = tables
            .iter()
            .filter(|t| is_valid_identifier(t) && !keep.iter().any(|k| k.eq_ignore_ascii_case(t)))
            .collect();

        let mut tx = self.inner.pool.begin().await.map_err(PoolError::Query)?;
        match backend {
            DatabaseBackend::Sqlite => {
                (&mut *tx).execute("PRAGMA defer_foreign_keys = ON").await.map_err(PoolError::Query)?;
            }
            DatabaseBackend::MySql => {
                (&mut *tx).execute("SET FOREIGN_KEY_CHECKS = 0").await.map_err(PoolError::Query)?;
            }
            DatabaseBackend::Postgres => {}
        }
        for table in &targets {
            let sql = match backend {
                DatabaseBackend::Postgres => format!("TRUNCATE TABLE {} CASCADE", table),
                _ => format!("DELETE FROM {}", table),
            };
            (&mut *tx).execute(sql.as_str()).await.map_err(PoolError::Query)?;
        }
        if backend == DatabaseBackend::MySql {
            (&mut *tx).execute("SET FOREIGN_KEY_CHECKS = 1").await.map_err(PoolError::Query)?;
        }
        tx.commit().await.map_err(PoolError::Query)?;

        tracing::info!(tables = targets.len(), "Reset table data");
        Ok(targets.len())
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("url", &self.inner.settings.redacted_url())
            .field("max_pool_size", &self.inner.settings.max_pool_size)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn list_tables_sql(backend: DatabaseBackend) -> &'static str {
    match backend {
        DatabaseBackend::Sqlite => {
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'"
        }
        DatabaseBackend::MySql => {
            "SELECT CAST(table_name AS CHAR) FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE'"
        }
        DatabaseBackend::Postgres => {
            "SELECT tablename::text FROM pg_tables WHERE schemaname = current_schema()"
        }
    }
}

fn maintenance_loop(pool: AnyPool, max: u32, interval: Duration, stop: mpsc::Receiver<()>) {
    loop {
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                if pool.is_closed() {
                    break;
                }
                let stats = PoolStats::read(&pool, max);
                metrics::record_pool_stats(&stats);
                if stats.idle == 0 && stats.size >= stats.max {
                    tracing::warn!(size = stats.size, max = stats.max, "Connection pool saturated");
                } else {
                    tracing::trace!(size = stats.size, idle = stats.idle, "Pool health check");
                }
            }
            // Stop requested or every pool handle dropped.
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::debug!("Pool maintenance thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_use_never_underflows() {
        let stats = PoolStats { size: 1, idle: 3, max: 4 };
        assert_eq!(stats.in_use(), 0);
        let stats = PoolStats { size: 4, idle: 1, max: 4 };
        assert_eq!(stats.in_use(), 3);
    }
}
