//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (pool sizing, timeouts > 0, addresses parse)
//! - Reject identifiers that end up interpolated into SQL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BootstrapConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::BootstrapConfig;
use crate::migration::is_valid_identifier;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human readable reason.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a parsed configuration.
pub fn validate_config(config: &BootstrapConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than 0"));
    }

    let db = &config.database;
    if db.url.trim().is_empty() {
        errors.push(ValidationError::new("database.url", "must not be empty"));
    }
    if db.max_pool_size == 0 {
        errors.push(ValidationError::new("database.max_pool_size", "must be at least 1"));
    }
    if db.min_idle > db.max_pool_size {
        errors.push(ValidationError::new(
            "database.min_idle",
            format!("{} exceeds max_pool_size {}", db.min_idle, db.max_pool_size),
        ));
    }
    if db.connection_timeout_secs == 0 {
        errors.push(ValidationError::new("database.connection_timeout_secs", "must be greater than 0"));
    }
    if db.health_check_interval_secs == 0 {
        errors.push(ValidationError::new("database.health_check_interval_secs", "must be greater than 0"));
    }
    if db.thread_name_prefix.trim().is_empty() {
        errors.push(ValidationError::new("database.thread_name_prefix", "must not be empty"));
    }

    if let Some(table) = &config.migrations.history_table {
        if !is_valid_identifier(table) {
            errors.push(ValidationError::new(
                "migrations.history_table",
                format!("'{}' is not a plain SQL identifier", table),
            ));
        }
    }

    if let Some(secret_id) = &config.secrets.secret_id {
        if secret_id.trim().is_empty() {
            errors.push(ValidationError::new("secrets.secret_id", "must not be empty when set"));
        }
    }

    if let Some(endpoint) = &config.seed.endpoint {
        if url::Url::parse(endpoint).is_err() {
            errors.push(ValidationError::new(
                "seed.endpoint",
                format!("'{}' is not a valid URL", endpoint),
            ));
        }
    }
    if config.seed.sample_name.trim().is_empty() {
        errors.push(ValidationError::new("seed.sample_name", "must not be empty"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&BootstrapConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = BootstrapConfig::default();
        config.server.bind_address = "nope".into();
        config.database.max_pool_size = 2;
        config.database.min_idle = 3;
        config.migrations.history_table = Some("history; DROP TABLE x".into());
        config.seed.endpoint = Some("not a url".into());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "server.bind_address",
                "database.min_idle",
                "migrations.history_table",
                "seed.endpoint",
            ]
        );
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = BootstrapConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "observability.metrics_address");
    }

    #[test]
    fn zero_pool_size_rejected() {
        let mut config = BootstrapConfig::default();
        config.database.max_pool_size = 0;
        config.database.min_idle = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "database.max_pool_size: must be at least 1");
    }
}
