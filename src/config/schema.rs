//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! bootstrap sequence. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the server bootstrap.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Network listener settings.
    pub server: ServerConfig,

    /// Database endpoint and pool sizing.
    pub database: DatabaseConfig,

    /// Schema migration settings.
    pub migrations: MigrationConfig,

    /// Secret store lookup.
    pub secrets: SecretsConfig,

    /// Sample data seeding.
    pub seed: SeedConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// How long `stop` waits for in-flight requests before aborting.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            shutdown_timeout_secs: 10,
        }
    }
}

/// Transaction isolation applied to every pooled connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    ReadUncommitted,
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// SQL spelling used in `SET ... TRANSACTION ISOLATION LEVEL`.
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Database endpoint and connection pool configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL (`sqlite:`, `mysql://`, `postgres://`, optionally `jdbc:` prefixed).
    pub url: String,

    /// Database principal. Overrides any user in the URL.
    pub username: Option<String>,

    /// Database credential.
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Maximum number of pooled connections.
    pub max_pool_size: u32,

    /// Minimum number of idle connections kept warm.
    pub min_idle: u32,

    /// Maximum lifetime of a single connection in seconds.
    pub max_lifetime_secs: u64,

    /// Idle connection timeout in seconds.
    pub idle_timeout_secs: u64,

    /// Connection acquire timeout in seconds.
    pub connection_timeout_secs: u64,

    /// Transaction isolation level.
    pub isolation: IsolationLevel,

    /// Whether sessions run in autocommit mode.
    pub autocommit: bool,

    /// Upper bound on how long `close` waits for checked-out connections.
    pub close_timeout_secs: u64,

    /// Interval of the background pool health check.
    pub health_check_interval_secs: u64,

    /// Name prefix for pool maintenance threads.
    pub thread_name_prefix: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://bootstrap.db?mode=rwc".to_string(),
            username: None,
            password: None,
            max_pool_size: 10,
            min_idle: 2,
            max_lifetime_secs: 1800,
            idle_timeout_secs: 600,
            connection_timeout_secs: 30,
            isolation: IsolationLevel::ReadCommitted,
            autocommit: false,
            close_timeout_secs: 5,
            health_check_interval_secs: 30,
            thread_name_prefix: "db-pool-maintenance".to_string(),
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &crate::pool::redact_url(&self.url))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("max_pool_size", &self.max_pool_size)
            .field("min_idle", &self.min_idle)
            .field("isolation", &self.isolation)
            .field("autocommit", &self.autocommit)
            .finish_non_exhaustive()
    }
}

/// Schema migration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Run migrations at startup.
    pub enabled: bool,

    /// Directory holding `V<version>__<description>.sql` scripts.
    pub location: String,

    /// Custom history table name.
    pub history_table: Option<String>,

    /// Fail when an applied script no longer matches its recorded checksum.
    pub validate_checksums: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            location: "migrations".to_string(),
            history_table: None,
            validate_checksums: true,
        }
    }
}

/// What provisioning does when the configured secret cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecretPolicy {
    /// Log the failure and keep provisioning with configured credentials.
    #[default]
    Ignore,
    /// Abort provisioning before any pool is opened.
    Require,
}

/// Secret store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SecretsConfig {
    /// Secret identifier (name or ARN). No lookup happens when unset.
    pub secret_id: Option<String>,

    /// Region of the secret store. Falls back to the SDK environment chain.
    pub region: Option<String>,

    /// Failure policy for the lookup.
    pub policy: SecretPolicy,

    /// Use the resolved secret as the database principal/credential.
    pub apply_to_credentials: bool,
}

/// Sample data seeding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Create the sample workflow after startup.
    pub load_sample: bool,

    /// Base URL of the metadata API. Derived from the bound port when unset.
    pub endpoint: Option<String>,

    /// Workflow definition name that marks the sample as present.
    pub sample_name: String,

    /// Path listing workflow definitions.
    pub definitions_path: String,

    /// Path accepting task definitions.
    pub taskdefs_path: String,

    /// Path accepting a workflow definition.
    pub workflow_path: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            load_sample: false,
            endpoint: None,
            sample_name: "kitchensink".to_string(),
            definitions_path: "metadata/workflow".to_string(),
            taskdefs_path: "metadata/taskdefs".to_string(),
            workflow_path: "metadata/workflow".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus exporter after startup.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
