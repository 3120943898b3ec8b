//! Top-level error for the bootstrap binary.

use thiserror::Error;

use crate::config::ConfigError;
use crate::lifecycle::LifecycleError;
use crate::migration::MigrationError;
use crate::observability::LoggingError;
use crate::provision::ProvisionError;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("failed to load migrations: {0}")]
    Migrations(#[from] MigrationError),

    #[error("provisioning failed: {0}")]
    Provision(#[from] ProvisionError),

    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),
}
