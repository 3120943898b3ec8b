//! Service bootstrap and resource provisioning.
//!
//! Brings a stateful server online in order: resolve secrets, open a pooled
//! database resource, apply versioned schema migrations, start the HTTP
//! listener, then optionally seed sample data.

// Configuration
pub mod config;

// Resources
pub mod migration;
pub mod pool;
pub mod provision;
pub mod secrets;

// Serving
pub mod http;
pub mod lifecycle;
pub mod seed;

// Cross-cutting concerns
pub mod error;
pub mod observability;

pub use config::BootstrapConfig;
pub use error::BootstrapError;
pub use lifecycle::ServiceLifecycle;
pub use pool::ConnectionPool;
pub use provision::ResourceProvisioner;
