//! Database connection pool subsystem.
//!
//! # Data Flow
//! ```text
//! DatabaseConfig
//!     → settings.rs (PoolConfigBuilder: validate, normalize URL, derive settings)
//!     → resource.rs (PoolConnector opens a PoolResource)
//!     → handle.rs (ConnectionPool: sqlx AnyPool + Open/Closed state)
//!     → threads.rs (named maintenance thread reporting pool occupancy)
//! ```
//!
//! # Design Decisions
//! - Settings building is pure; all I/O happens in `ConnectionPool::open`
//! - Provisioning depends on the traits, not the sqlx pool, so tests can count closes
//! - Isolation and autocommit are applied per connection in `after_connect`

pub mod error;
pub mod handle;
pub mod resource;
pub mod settings;
pub mod threads;

pub use error::{PoolError, PoolResult};
pub use handle::{ConnectionPool, PoolStats};
pub use resource::{PoolConnector, PoolResource, SqlxConnector};
pub use settings::{
    redact_url, DatabaseBackend, MaintenanceThreadSettings, PoolConfigBuilder, PoolSettings,
};
pub use threads::MaintenanceThreadFactory;
