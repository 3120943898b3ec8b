//! Versioned migration scripts.
//!
//! # Responsibilities
//! - Parse `V<version>__<description>.sql` file names
//! - Checksum script contents (lowercase hex SHA-256)
//! - Keep migrations ordered by version, rejecting duplicates

use std::collections::BTreeMap;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::migration::error::MigrationError;

/// A single versioned schema change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub version: i64,
    pub description: String,
    pub sql: String,
    pub checksum: String,
}

impl Migration {
    pub fn new(version: i64, description: impl Into<String>, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        Self {
            version,
            description: description.into(),
            checksum: checksum(&sql),
            sql,
        }
    }
}

/// Lowercase hex SHA-256 of a script.
pub fn checksum(sql: &str) -> String {
    let digest = Sha256::digest(sql.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Split a Flyway-style file name into version and description.
///
/// Returns `Ok(None)` for files that are not versioned migrations.
pub fn parse_file_name(name: &str) -> Result<Option<(i64, String)>, String> {
    let Some(stem) = name.strip_suffix(".sql") else {
        return Ok(None);
    };
    let Some(rest) = stem.strip_prefix('V') else {
        return Ok(None);
    };
    let (version, description) = rest
        .split_once("__")
        .ok_or_else(|| format!("'{}' is missing the '__' separator", name))?;
    if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{}' has a non-numeric version", name));
    }
    let version: i64 = version
        .parse()
        .map_err(|e| format!("'{}' has an unusable version: {}", name, e))?;
    if description.is_empty() {
        return Err(format!("'{}' has an empty description", name));
    }
    Ok(Some((version, description.replace('_', " "))))
}

/// An ordered set of migrations keyed by version.
#[derive(Debug, Clone, Default)]
pub struct MigrationSource {
    migrations: BTreeMap<i64, Migration>,
}

impl MigrationSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from in-code migrations.
    pub fn from_migrations<I>(migrations: I) -> Result<Self, MigrationError>
    where
        I: IntoIterator<Item = Migration>,
    {
        let mut source = Self::new();
        for migration in migrations {
            source.add(migration)?;
        }
        Ok(source)
    }

    /// Load every `V<version>__<description>.sql` file in `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, MigrationError> {
        let dir = dir.as_ref();
        let source_err = |reason: String| MigrationError::Source {
            path: dir.to_path_buf(),
            reason,
        };

        let entries = std::fs::read_dir(dir).map_err(|e| source_err(e.to_string()))?;
        let mut source = Self::new();
        for entry in entries {
            let entry = entry.map_err(|e| source_err(e.to_string()))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some((version, description)) = parse_file_name(name).map_err(source_err)? else {
                tracing::trace!(file = %name, "Skipping non-migration file");
                continue;
            };
            let sql = std::fs::read_to_string(&path).map_err(|e| MigrationError::Source {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            source.add(Migration::new(version, description, sql))?;
        }

        tracing::debug!(location = %dir.display(), count = source.len(), "Loaded migrations");
        Ok(source)
    }

    pub fn add(&mut self, migration: Migration) -> Result<(), MigrationError> {
        if self.migrations.contains_key(&migration.version) {
            return Err(MigrationError::DuplicateVersion(migration.version));
        }
        self.migrations.insert(migration.version, migration);
        Ok(())
    }

    pub fn get(&self, version: i64) -> Option<&Migration> {
        self.migrations.get(&version)
    }

    /// Migrations in ascending version order.
    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.values()
    }

    pub fn latest_version(&self) -> Option<i64> {
        self.migrations.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}
