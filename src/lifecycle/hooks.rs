//! Best-effort actions run once the listener is live.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::observability::metrics;
use crate::seed::{SampleSeeder, SeedOutcome};

pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Runs after a successful `start`. Errors are logged, never propagated.
#[async_trait]
pub trait PostStartHook: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, address: SocketAddr) -> Result<(), HookError>;
}

/// Installs the Prometheus exporter on first start.
pub struct MetricsExporterHook {
    address: SocketAddr,
    installed: AtomicBool,
}

impl MetricsExporterHook {
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            installed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl PostStartHook for MetricsExporterHook {
    fn name(&self) -> &'static str {
        "metrics-exporter"
    }

    async fn run(&self, _address: SocketAddr) -> Result<(), HookError> {
        // The exporter outlives stop/start cycles.
        if self.installed.load(Ordering::SeqCst) {
            return Ok(());
        }
        metrics::init_metrics(self.address)?;
        self.installed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Seeds the sample dataset through the service's metadata API.
pub struct SampleSeederHook {
    seeder: SampleSeeder,
    endpoint: Option<String>,
    sample_name: String,
}

impl SampleSeederHook {
    /// `endpoint` defaults to `/api` on the bound listener, via loopback when
    /// it is bound to an unspecified address.
    pub fn new(seeder: SampleSeeder, endpoint: Option<String>, sample_name: impl Into<String>) -> Self {
        Self {
            seeder,
            endpoint,
            sample_name: sample_name.into(),
        }
    }

    fn endpoint_for(&self, address: SocketAddr) -> String {
        self.endpoint.clone().unwrap_or_else(|| {
            let target = match address.ip() {
                IpAddr::V4(ip) if ip.is_unspecified() => SocketAddr::new(Ipv4Addr::LOCALHOST.into(), address.port()),
                IpAddr::V6(ip) if ip.is_unspecified() => SocketAddr::new(Ipv6Addr::LOCALHOST.into(), address.port()),
                _ => address,
            };
            format!("http://{}/api", target)
        })
    }
}

#[async_trait]
impl PostStartHook for SampleSeederHook {
    fn name(&self) -> &'static str {
        "sample-seeder"
    }

    async fn run(&self, address: SocketAddr) -> Result<(), HookError> {
        let endpoint = self.endpoint_for(address);
        match self.seeder.ensure(&endpoint, &self.sample_name).await {
            Ok(SeedOutcome::AlreadyPresent) => {
                metrics::record_seed("present");
                Ok(())
            }
            Ok(SeedOutcome::Created { .. }) => {
                metrics::record_seed("created");
                Ok(())
            }
            Err(e) => {
                metrics::record_seed("failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedConfig;

    #[test]
    fn seeder_endpoint_defaults_to_bound_port() {
        let seeder = SampleSeeder::new(&SeedConfig::default()).unwrap();
        let hook = SampleSeederHook::new(seeder, None, "kitchensink");
        let addr: SocketAddr = "0.0.0.0:8123".parse().unwrap();
        assert_eq!(hook.endpoint_for(addr), "http://127.0.0.1:8123/api");
        let addr: SocketAddr = "[::]:8123".parse().unwrap();
        assert_eq!(hook.endpoint_for(addr), "http://[::1]:8123/api");
    }

    #[test]
    fn seeder_endpoint_follows_specific_bind_address() {
        let seeder = SampleSeeder::new(&SeedConfig::default()).unwrap();
        let hook = SampleSeederHook::new(seeder, None, "kitchensink");
        let addr: SocketAddr = "10.1.2.3:8123".parse().unwrap();
        assert_eq!(hook.endpoint_for(addr), "http://10.1.2.3:8123/api");
    }

    #[test]
    fn explicit_seeder_endpoint_wins() {
        let seeder = SampleSeeder::new(&SeedConfig::default()).unwrap();
        let hook = SampleSeederHook::new(seeder, Some("http://conductor:8080/api".into()), "kitchensink");
        let addr: SocketAddr = "0.0.0.0:8123".parse().unwrap();
        assert_eq!(hook.endpoint_for(addr), "http://conductor:8080/api");
    }
}
