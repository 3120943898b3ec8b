//! Connection pool errors.

use thiserror::Error;

/// Errors that can occur while building, opening or using the pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Settings violate a sizing or format invariant.
    #[error("invalid pool configuration: {0}")]
    InvalidConfiguration(String),

    /// Endpoint unreachable or credentials rejected.
    #[error("failed to initialize pool for {url}: {source}")]
    Initialization {
        /// Redacted connection URL.
        url: String,
        #[source]
        source: sqlx::Error,
    },

    /// The pool has been closed.
    #[error("connection pool is closed")]
    Closed,

    /// No connection became available.
    #[error("failed to acquire connection: {0}")]
    Acquire(#[source] sqlx::Error),

    /// A pool-level maintenance query failed.
    #[error("pool query failed: {0}")]
    Query(#[source] sqlx::Error),
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
