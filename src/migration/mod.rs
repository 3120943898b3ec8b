//! Versioned schema migrations.
//!
//! # Data Flow
//! ```text
//! migrations/V<n>__<desc>.sql
//!     → source.rs (MigrationSource: parse names, checksum, order)
//!     → runner.rs (MigrationRunner: read history, validate, apply pending)
//!     → <history table> (one row per applied version)
//! ```

pub mod error;
pub mod runner;
pub mod source;

pub use error::MigrationError;
pub use runner::{MigrationOptions, MigrationResult, MigrationRunner, SchemaMigrator};
pub use source::{checksum, Migration, MigrationSource};

/// History table used when none is configured.
pub const DEFAULT_HISTORY_TABLE: &str = "schema_history";

/// True for `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
