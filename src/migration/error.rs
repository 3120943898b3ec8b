//! Migration errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::pool::PoolError;

/// Errors raised while loading or applying migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A script failed; its transaction was rolled back.
    #[error("migration V{version} ({description}) failed: {source}")]
    Failed {
        version: i64,
        description: String,
        #[source]
        source: sqlx::Error,
    },

    /// An applied script no longer matches its source file.
    #[error("checksum mismatch for V{version}: applied {applied}, resolved {resolved}")]
    ChecksumMismatch {
        version: i64,
        applied: String,
        resolved: String,
    },

    #[error("duplicate migration version V{0}")]
    DuplicateVersion(i64),

    #[error("invalid history table name '{0}'")]
    InvalidTableName(String),

    #[error("placeholder replacement is not supported; scripts are applied verbatim")]
    PlaceholderReplacement,

    /// The migration directory or a file in it could not be read.
    #[error("invalid migration source {path}: {reason}")]
    Source { path: PathBuf, reason: String },

    /// Reading or creating the history table failed.
    #[error("schema history query failed: {0}")]
    History(#[source] sqlx::Error),

    #[error(transparent)]
    Pool(#[from] PoolError),
}
