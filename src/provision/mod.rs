//! Resource provisioning.
//!
//! # Data Flow
//! ```text
//! BootstrapConfig
//!     → SecretResolver (optional pre-check, may yield credentials)
//!     → PoolConfigBuilder (PoolSettings)
//!     → PoolConnector::open (pool, held by PoolGuard)
//!     → SchemaMigrator::migrate
//!     → ready pool, or error with the pool closed
//! ```

pub mod guard;
pub mod provisioner;

pub use guard::PoolGuard;
pub use provisioner::{ProvisionError, ResourceProvisioner};
