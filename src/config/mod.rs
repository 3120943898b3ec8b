//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BootstrapConfig (validated, immutable)
//!     → CLI flags override selected fields (main.rs)
//!     → handed to provisioning and lifecycle
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    BootstrapConfig, DatabaseConfig, IsolationLevel, LogFormat, MigrationConfig,
    ObservabilityConfig, SecretPolicy, SecretsConfig, SeedConfig, ServerConfig,
};
pub use validation::{validate_config, ValidationError};
