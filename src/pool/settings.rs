//! Pool settings and the pure config → settings translation.
//!
//! # Responsibilities
//! - Validate sizing and timeouts before any connection is attempted
//! - Normalize the connection URL (strip `jdbc:`, detect backend)
//! - Carry credentials without exposing them in `Debug`
//! - Describe the maintenance threads the pool will spawn

use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

use crate::config::{DatabaseConfig, IsolationLevel};
use crate::pool::error::{PoolError, PoolResult};
use crate::secrets::DatabaseCredentials;

/// Database engine behind a connection URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Sqlite,
    MySql,
    Postgres,
}

impl DatabaseBackend {
    /// Detect the backend from a normalized URL.
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?.to_ascii_lowercase();
        match scheme.as_str() {
            "sqlite" => Some(DatabaseBackend::Sqlite),
            "mysql" | "mariadb" => Some(DatabaseBackend::MySql),
            "postgres" | "postgresql" => Some(DatabaseBackend::Postgres),
            _ => None,
        }
    }

    /// Statements run on every new connection to apply isolation and autocommit.
    pub fn session_statements(&self, isolation: IsolationLevel, autocommit: bool) -> Vec<String> {
        match self {
            DatabaseBackend::MySql => vec![
                format!("SET SESSION TRANSACTION ISOLATION LEVEL {}", isolation.as_sql()),
                format!("SET autocommit = {}", if autocommit { 1 } else { 0 }),
            ],
            // Postgres has no server-side autocommit switch.
            DatabaseBackend::Postgres => vec![format!(
                "SET SESSION CHARACTERISTICS AS TRANSACTION ISOLATION LEVEL {}",
                isolation.as_sql()
            )],
            // SQLite is serializable unless shared-cache dirty reads are requested.
            DatabaseBackend::Sqlite => match isolation {
                IsolationLevel::ReadUncommitted => vec!["PRAGMA read_uncommitted = 1".to_string()],
                _ => Vec::new(),
            },
        }
    }

    /// Positional bind placeholder for this backend (1-based).
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            DatabaseBackend::Postgres => format!("${}", index),
            _ => "?".to_string(),
        }
    }
}

/// Settings for the pool's background maintenance threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceThreadSettings {
    /// Threads are named `{name_prefix}-{n}`.
    pub name_prefix: String,
    /// Detached threads are never joined and never hold up process exit.
    pub daemon: bool,
    /// How often the maintenance loop inspects the pool.
    pub interval: Duration,
}

/// Concrete connection pool settings.
#[derive(Clone)]
pub struct PoolSettings {
    /// Normalized URL without credentials.
    pub url: String,
    pub backend: DatabaseBackend,
    pub username: Option<String>,
    pub password: Option<Zeroizing<String>>,
    pub max_pool_size: u32,
    pub min_idle: u32,
    /// `None` disables the lifetime cap.
    pub max_lifetime: Option<Duration>,
    /// `None` keeps idle connections forever.
    pub idle_timeout: Option<Duration>,
    pub acquire_timeout: Duration,
    pub isolation: IsolationLevel,
    pub autocommit: bool,
    pub close_timeout: Duration,
    pub maintenance: MaintenanceThreadSettings,
}

impl PoolSettings {
    /// URL handed to the driver, with principal and credential injected.
    pub fn connect_url(&self) -> PoolResult<String> {
        if self.backend == DatabaseBackend::Sqlite
            || (self.username.is_none() && self.password.is_none())
        {
            return Ok(self.url.clone());
        }

        let mut url = Url::parse(&self.url)
            .map_err(|e| PoolError::InvalidConfiguration(format!("unparseable database url: {}", e)))?;
        if let Some(username) = &self.username {
            url.set_username(username)
                .map_err(|_| PoolError::InvalidConfiguration("url cannot carry a username".into()))?;
        }
        if let Some(password) = &self.password {
            url.set_password(Some(password.as_str()))
                .map_err(|_| PoolError::InvalidConfiguration("url cannot carry a password".into()))?;
        }
        Ok(url.to_string())
    }

    /// URL safe for logs and error messages.
    pub fn redacted_url(&self) -> String {
        redact_url(&self.url)
    }
}

impl std::fmt::Debug for PoolSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolSettings")
            .field("url", &self.redacted_url())
            .field("backend", &self.backend)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("max_pool_size", &self.max_pool_size)
            .field("min_idle", &self.min_idle)
            .field("max_lifetime", &self.max_lifetime)
            .field("idle_timeout", &self.idle_timeout)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("isolation", &self.isolation)
            .field("autocommit", &self.autocommit)
            .field("close_timeout", &self.close_timeout)
            .field("maintenance", &self.maintenance)
            .finish()
    }
}

/// Replace any password in a URL with `***`.
pub fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        Ok(_) => raw.to_string(),
        Err(_) => "<unparseable url>".to_string(),
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then_some(Duration::from_secs(secs))
}

/// Translates [`DatabaseConfig`] into [`PoolSettings`].
pub struct PoolConfigBuilder;

impl PoolConfigBuilder {
    /// Build validated pool settings. Performs no I/O.
    pub fn build(config: &DatabaseConfig) -> PoolResult<PoolSettings> {
        let url = config.url.trim();
        let url = url.strip_prefix("jdbc:").unwrap_or(url);
        if url.is_empty() {
            return Err(PoolError::InvalidConfiguration("database url is empty".into()));
        }
        let backend = DatabaseBackend::from_url(url).ok_or_else(|| {
            PoolError::InvalidConfiguration(format!("unsupported database url '{}'", redact_url(url)))
        })?;

        if config.max_pool_size < 1 {
            return Err(PoolError::InvalidConfiguration("max_pool_size must be at least 1".into()));
        }
        if config.min_idle > config.max_pool_size {
            return Err(PoolError::InvalidConfiguration(format!(
                "min_idle {} exceeds max_pool_size {}",
                config.min_idle, config.max_pool_size
            )));
        }
        if config.connection_timeout_secs == 0 {
            return Err(PoolError::InvalidConfiguration(
                "connection_timeout_secs must be greater than 0".into(),
            ));
        }
        if config.health_check_interval_secs == 0 {
            return Err(PoolError::InvalidConfiguration(
                "health_check_interval_secs must be greater than 0".into(),
            ));
        }

        // sqlx registers MariaDB under the mysql scheme.
        let url = match url.strip_prefix("mariadb:") {
            Some(rest) => format!("mysql:{}", rest),
            None => url.to_string(),
        };

        Ok(PoolSettings {
            url,
            backend,
            username: config.username.clone(),
            password: config.password.clone().map(Zeroizing::new),
            max_pool_size: config.max_pool_size,
            min_idle: config.min_idle,
            max_lifetime: non_zero_secs(config.max_lifetime_secs),
            idle_timeout: non_zero_secs(config.idle_timeout_secs),
            acquire_timeout: Duration::from_secs(config.connection_timeout_secs),
            isolation: config.isolation,
            autocommit: config.autocommit,
            close_timeout: Duration::from_secs(config.close_timeout_secs),
            maintenance: MaintenanceThreadSettings {
                name_prefix: config.thread_name_prefix.clone(),
                daemon: true,
                interval: Duration::from_secs(config.health_check_interval_secs),
            },
        })
    }

    /// Replace principal and credential with ones resolved from a secret.
    pub fn with_credentials(mut settings: PoolSettings, credentials: DatabaseCredentials) -> PoolSettings {
        if credentials.username.is_some() {
            settings.username = credentials.username;
        }
        settings.password = Some(credentials.password);
        settings
    }
}
