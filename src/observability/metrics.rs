//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bootstrap_migrations_applied_total` (counter): applied migration scripts
//! - `bootstrap_migration_version` (gauge): last applied version
//! - `bootstrap_pool_connections` (gauge): open connections by state
//! - `bootstrap_pool_max_connections` (gauge): configured pool size
//! - `bootstrap_provisioning_total` (counter): provisioning attempts by outcome
//! - `bootstrap_provisioning_duration_seconds` (histogram)
//! - `bootstrap_seed_total` (counter): seeding attempts by outcome
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Exporter is installed at most once per process

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::pool::PoolStats;

/// Install the Prometheus exporter with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_migration_applied(version: i64) {
    counter!("bootstrap_migrations_applied_total").increment(1);
    gauge!("bootstrap_migration_version").set(version as f64);
}

pub fn record_pool_stats(stats: &PoolStats) {
    gauge!("bootstrap_pool_connections", "state" => "idle").set(f64::from(stats.idle));
    gauge!("bootstrap_pool_connections", "state" => "in_use").set(f64::from(stats.in_use()));
    gauge!("bootstrap_pool_max_connections").set(f64::from(stats.max));
}

pub fn record_provisioning(outcome: &'static str, duration: Duration) {
    counter!("bootstrap_provisioning_total", "outcome" => outcome).increment(1);
    histogram!("bootstrap_provisioning_duration_seconds").record(duration.as_secs_f64());
}

pub fn record_seed(outcome: &'static str) {
    counter!("bootstrap_seed_total", "outcome" => outcome).increment(1);
}
