//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use server_bootstrap::config::{BootstrapConfig, DatabaseConfig};
use server_bootstrap::migration::{MigrationError, MigrationOptions, MigrationResult, SchemaMigrator};
use server_bootstrap::pool::{PoolConfigBuilder, PoolConnector, PoolError, PoolResource, PoolResult, PoolSettings};

/// Config pointing at a fresh SQLite file inside `dir`.
pub fn sqlite_config(dir: &Path) -> BootstrapConfig {
    let mut config = BootstrapConfig::default();
    config.database.url = format!("sqlite://{}?mode=rwc", dir.join("bootstrap.db").display());
    config.database.max_pool_size = 4;
    config.database.min_idle = 1;
    config.database.connection_timeout_secs = 5;
    config.database.close_timeout_secs = 1;
    config.server.bind_address = "127.0.0.1:0".to_string();
    config
}

// ---------------------------------------------------------------------------
// Fake pool resources
// ---------------------------------------------------------------------------

/// Pool that only counts closes.
#[derive(Debug, Clone)]
pub struct FakePool {
    settings: Arc<PoolSettings>,
    closes: Arc<AtomicUsize>,
}

impl FakePool {
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PoolResource for FakePool {
    fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    fn is_closed(&self) -> bool {
        self.close_count() > 0
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Connector handing out [`FakePool`]s. Clones share the record of opened
/// pools, so tests keep one clone to inspect after `provision`.
#[derive(Clone, Default)]
pub struct FakeConnector {
    pub fail: bool,
    opened: Arc<Mutex<Vec<FakePool>>>,
}

impl FakeConnector {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn opened(&self) -> Vec<FakePool> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl PoolConnector for FakeConnector {
    type Pool = FakePool;

    async fn open(&self, settings: &PoolSettings) -> PoolResult<FakePool> {
        if self.fail {
            return Err(PoolError::Initialization {
                url: settings.redacted_url(),
                source: sqlx::Error::PoolTimedOut,
            });
        }
        let pool = FakePool {
            settings: Arc::new(settings.clone()),
            closes: Arc::new(AtomicUsize::new(0)),
        };
        self.opened.lock().unwrap().push(pool.clone());
        Ok(pool)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigratorBehavior {
    Succeed,
    Fail,
    Panic,
}

pub struct FakeMigrator {
    pub behavior: MigratorBehavior,
    pub calls: AtomicUsize,
}

impl FakeMigrator {
    pub fn new(behavior: MigratorBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SchemaMigrator<FakePool> for FakeMigrator {
    async fn migrate(&self, _pool: &FakePool, options: &MigrationOptions) -> Result<MigrationResult, MigrationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !options.enabled {
            return Ok(MigrationResult::skipped());
        }
        match self.behavior {
            MigratorBehavior::Succeed => Ok(MigrationResult {
                applied: vec![1],
                current_version: Some(1),
                skipped: false,
            }),
            MigratorBehavior::Fail => Err(MigrationError::Failed {
                version: 2,
                description: "broken".into(),
                source: sqlx::Error::Protocol("syntax error".into()),
            }),
            MigratorBehavior::Panic => panic!("migrator exploded"),
        }
    }
}

pub fn fake_settings() -> PoolSettings {
    PoolConfigBuilder::build(&DatabaseConfig::default()).unwrap()
}

// ---------------------------------------------------------------------------
// Mock metadata API
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MetadataState {
    pub workflows: Mutex<Vec<Value>>,
    pub taskdefs: Mutex<Vec<Value>>,
    pub list_calls: AtomicUsize,
    pub post_calls: AtomicUsize,
    /// When set, creation endpoints answer with this status.
    pub fail_status: Option<u16>,
}

/// Serve a minimal `/api/metadata` API on an ephemeral port.
pub async fn start_metadata_api(existing: &[&str], fail_status: Option<u16>) -> (SocketAddr, Arc<MetadataState>) {
    let state = Arc::new(MetadataState {
        workflows: Mutex::new(existing.iter().map(|n| json!({ "name": n, "version": 1 })).collect()),
        fail_status,
        ..MetadataState::default()
    });

    let app = Router::new()
        .route("/api/metadata/workflow", get(list_workflows).post(create_workflow))
        .route("/api/metadata/taskdefs", post(create_taskdefs))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn list_workflows(State(state): State<Arc<MetadataState>>) -> Json<Vec<Value>> {
    state.list_calls.fetch_add(1, Ordering::SeqCst);
    Json(state.workflows.lock().unwrap().clone())
}

async fn create_workflow(State(state): State<Arc<MetadataState>>, Json(body): Json<Value>) -> StatusCode {
    state.post_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(status) = state.fail_status {
        return StatusCode::from_u16(status).unwrap();
    }
    state.workflows.lock().unwrap().push(body);
    StatusCode::NO_CONTENT
}

async fn create_taskdefs(State(state): State<Arc<MetadataState>>, Json(body): Json<Vec<Value>>) -> StatusCode {
    state.post_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(status) = state.fail_status {
        return StatusCode::from_u16(status).unwrap();
    }
    state.taskdefs.lock().unwrap().extend(body);
    StatusCode::NO_CONTENT
}
