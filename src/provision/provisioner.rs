//! Ordered, all-or-nothing resource provisioning.
//!
//! # Responsibilities
//! - Secret pre-check according to `SecretPolicy`
//! - Build pool settings, open the pool, run migrations
//! - Close the pool exactly once when any later step fails
//!
//! # Design Decisions
//! - Steps are awaited one after another; no internal concurrency
//! - No overall deadline; wrap `provision` in `tokio::time::timeout` if needed

use std::time::Instant;

use thiserror::Error;

use crate::config::{BootstrapConfig, SecretPolicy, SecretsConfig};
use crate::migration::{MigrationError, MigrationOptions, SchemaMigrator};
use crate::observability::metrics;
use crate::pool::{PoolConfigBuilder, PoolConnector, PoolError, PoolResource};
use crate::provision::guard::PoolGuard;
use crate::secrets::{DatabaseCredentials, SecretError, SecretResolver};

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Secret(#[from] SecretError),

    /// A secret id is configured but the provisioner has no store.
    #[error("secret '{0}' is configured but no secret store is available")]
    NoSecretStore(String),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Migration(#[from] MigrationError),
}

/// Brings the database resource online: secret, pool, schema.
pub struct ResourceProvisioner<C, M> {
    connector: C,
    migrator: M,
    secrets: Option<SecretResolver>,
}

impl<C, M> ResourceProvisioner<C, M>
where
    C: PoolConnector,
    M: SchemaMigrator<C::Pool>,
{
    pub fn new(connector: C, migrator: M) -> Self {
        Self {
            connector,
            migrator,
            secrets: None,
        }
    }

    pub fn with_secret_resolver(mut self, resolver: SecretResolver) -> Self {
        self.secrets = Some(resolver);
        self
    }

    /// Run the full sequence. On error no pool is left open.
    pub async fn provision(&self, config: &BootstrapConfig) -> Result<C::Pool, ProvisionError> {
        let started = Instant::now();
        let result = self.run(config).await;
        let outcome = if result.is_ok() { "success" } else { "failure" };
        metrics::record_provisioning(outcome, started.elapsed());
        if let Err(e) = &result {
            tracing::error!(error = %e, "Provisioning failed");
        }
        result
    }

    async fn run(&self, config: &BootstrapConfig) -> Result<C::Pool, ProvisionError> {
        let credentials = self.resolve_credentials(&config.secrets).await?;

        let mut settings = PoolConfigBuilder::build(&config.database)?;
        if let Some(credentials) = credentials {
            settings = PoolConfigBuilder::with_credentials(settings, credentials);
        }

        let guard = PoolGuard::new(self.connector.open(&settings).await?);
        tracing::info!(
            url = %guard.pool().settings().redacted_url(),
            max_pool_size = guard.pool().settings().max_pool_size,
            "Connection pool ready"
        );

        let options = MigrationOptions::from_config(&config.migrations);
        match self.migrator.migrate(guard.pool(), &options).await {
            Ok(result) => {
                tracing::info!(
                    applied = result.applied.len(),
                    current_version = ?result.current_version,
                    skipped = result.skipped,
                    "Provisioning complete"
                );
                Ok(guard.disarm())
            }
            Err(e) => {
                guard.close().await;
                Err(e.into())
            }
        }
    }

    /// Secret pre-check. Returns credentials only when they should replace
    /// the configured ones.
    async fn resolve_credentials(
        &self,
        config: &SecretsConfig,
    ) -> Result<Option<DatabaseCredentials>, ProvisionError> {
        let Some(secret_id) = config.secret_id.as_deref() else {
            return Ok(None);
        };

        let Some(resolver) = &self.secrets else {
            return match config.policy {
                SecretPolicy::Require => Err(ProvisionError::NoSecretStore(secret_id.to_string())),
                SecretPolicy::Ignore => {
                    tracing::warn!(secret_id = %secret_id, "No secret store available, skipping lookup");
                    Ok(None)
                }
            };
        };

        match resolver.fetch(secret_id).await {
            Ok(value) if config.apply_to_credentials => {
                tracing::info!(secret_id = %secret_id, "Using resolved secret as database credentials");
                Ok(Some(DatabaseCredentials::from_secret(&value)))
            }
            Ok(_) => {
                tracing::debug!(secret_id = %secret_id, "Secret pre-check passed");
                Ok(None)
            }
            Err(e) => match config.policy {
                SecretPolicy::Require => Err(e.into()),
                SecretPolicy::Ignore => {
                    tracing::warn!(
                        secret_id = %secret_id,
                        kind = ?e.kind(),
                        "Secret unavailable, continuing with configured credentials"
                    );
                    Ok(None)
                }
            },
        }
    }
}
