//! Bootstrap server.
//!
//! ```text
//! config → logging → provision (secret, pool, migrations)
//!        → lifecycle.start (listener, hooks) → signal → stop → pool.close
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use server_bootstrap::config::{self, BootstrapConfig, ConfigError};
use server_bootstrap::http::health_router;
use server_bootstrap::lifecycle::{
    wait_for_shutdown_signal, MetricsExporterHook, SampleSeederHook, ServiceLifecycle,
};
use server_bootstrap::migration::{MigrationRunner, MigrationSource};
use server_bootstrap::observability::init_logging;
use server_bootstrap::pool::{ConnectionPool, SqlxConnector};
use server_bootstrap::provision::ResourceProvisioner;
use server_bootstrap::secrets::SecretResolver;
use server_bootstrap::seed::SampleSeeder;
use server_bootstrap::BootstrapError;

#[derive(Parser)]
#[command(name = "bootstrap-server")]
#[command(about = "Provision the database and serve", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener address, e.g. 0.0.0.0:8080.
    #[arg(long)]
    bind: Option<String>,

    /// Create the sample workflow after startup.
    #[arg(long)]
    load_sample: bool,

    /// Serve Prometheus metrics.
    #[arg(long)]
    enable_metrics: bool,

    #[arg(long)]
    log_level: Option<String>,

    /// Apply migrations and exit without serving.
    #[arg(long)]
    migrations_only: bool,
}

impl Cli {
    fn apply(&self, config: &mut BootstrapConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind_address = bind.clone();
        }
        if self.load_sample {
            config.seed.load_sample = true;
        }
        if self.enable_metrics {
            config.observability.metrics_enabled = true;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path).map_err(BootstrapError::from)?,
        None => BootstrapConfig::default(),
    };
    cli.apply(&mut config);
    config::validate_config(&config)
        .map_err(|errors| BootstrapError::from(ConfigError::Validation(errors)))?;

    init_logging(&config.observability).map_err(BootstrapError::from)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "bootstrap-server starting");

    let pool = provision(&config).await?;

    if cli.migrations_only {
        tracing::info!("Migrations applied, exiting");
        pool.close().await;
        return Ok(());
    }

    let lifecycle = build_lifecycle(&config, &pool);
    if let Err(e) = lifecycle.start().await {
        pool.close().await;
        return Err(BootstrapError::from(e).into());
    }

    wait_for_shutdown_signal().await;

    let stopped = lifecycle.stop().await;
    pool.close().await;
    stopped.map_err(BootstrapError::from)?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn provision(config: &BootstrapConfig) -> Result<ConnectionPool, BootstrapError> {
    let source = if config.migrations.enabled {
        MigrationSource::from_dir(&config.migrations.location)?
    } else {
        MigrationSource::new()
    };
    tracing::info!(
        location = %config.migrations.location,
        count = source.len(),
        latest = ?source.latest_version(),
        "Migration source loaded"
    );

    let mut provisioner = ResourceProvisioner::new(SqlxConnector, MigrationRunner::new(source));
    if let Some(resolver) = secret_resolver(config).await {
        provisioner = provisioner.with_secret_resolver(resolver);
    }
    Ok(provisioner.provision(config).await?)
}

#[cfg(feature = "aws")]
async fn secret_resolver(config: &BootstrapConfig) -> Option<SecretResolver> {
    use server_bootstrap::secrets::AwsSecretsManagerStore;

    if config.secrets.secret_id.is_none() {
        return None;
    }
    let store = AwsSecretsManagerStore::from_env(config.secrets.region.clone()).await;
    Some(SecretResolver::new(Arc::new(store)))
}

#[cfg(not(feature = "aws"))]
async fn secret_resolver(_config: &BootstrapConfig) -> Option<SecretResolver> {
    None
}

fn build_lifecycle(config: &BootstrapConfig, pool: &ConnectionPool) -> ServiceLifecycle {
    let mut lifecycle = ServiceLifecycle::new(config.server.clone(), health_router(Some(pool.clone())));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                lifecycle = lifecycle.with_hook(Arc::new(MetricsExporterHook::new(addr)));
            }
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    if config.seed.load_sample {
        match SampleSeeder::new(&config.seed) {
            Ok(seeder) => {
                let hook = SampleSeederHook::new(seeder, config.seed.endpoint.clone(), config.seed.sample_name.clone());
                lifecycle = lifecycle.with_hook(Arc::new(hook));
            }
            Err(e) => tracing::error!(error = %e, "Sample seeding disabled"),
        }
    }

    lifecycle
}
