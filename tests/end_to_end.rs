//! Full provisioning and serving against SQLite.

use axum::http::StatusCode;

use server_bootstrap::http::health_router;
use server_bootstrap::lifecycle::ServiceLifecycle;
use server_bootstrap::migration::MigrationRunner;
use server_bootstrap::pool::{PoolError, SqlxConnector};
use server_bootstrap::provision::ResourceProvisioner;

mod common;

fn bundled_runner() -> MigrationRunner {
    MigrationRunner::from_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/migrations")).unwrap()
}

#[tokio::test]
async fn provisioned_pool_reports_size_and_refuses_after_close() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = common::sqlite_config(dir.path());
    config.database.max_pool_size = 8;
    config.database.min_idle = 2;
    config.migrations.enabled = true;

    let provisioner = ResourceProvisioner::new(SqlxConnector, bundled_runner());
    let pool = provisioner.provision(&config).await.unwrap();

    assert_eq!(pool.max_pool_size(), 8);
    assert!(!pool.is_closed());
    let conn = pool.acquire().await.unwrap();
    drop(conn);

    pool.close().await;
    assert!(pool.is_closed());
    assert!(matches!(pool.acquire().await, Err(PoolError::Closed)));

    // Closing twice is a no-op.
    pool.close().await;
}

#[tokio::test]
async fn reprovisioning_a_migrated_database_applies_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::sqlite_config(dir.path());

    let first = ResourceProvisioner::new(SqlxConnector, bundled_runner())
        .provision(&config)
        .await
        .unwrap();
    let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_history")
        .fetch_one(first.pool())
        .await
        .unwrap();
    first.close().await;

    let runner = bundled_runner();
    let expected = runner.source().len() as i64;
    let second = ResourceProvisioner::new(SqlxConnector, runner)
        .provision(&config)
        .await
        .unwrap();
    let after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_history")
        .fetch_one(second.pool())
        .await
        .unwrap();
    assert_eq!(versions, expected);
    assert_eq!(after, expected);
    second.close().await;
}

#[tokio::test]
async fn health_reflects_pool_state() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::sqlite_config(dir.path());
    let pool = ResourceProvisioner::new(SqlxConnector, bundled_runner())
        .provision(&config)
        .await
        .unwrap();

    let lifecycle = ServiceLifecycle::new(config.server.clone(), health_router(Some(pool.clone())));
    let addr = lifecycle.start().await.unwrap();
    let client = reqwest::Client::builder().pool_max_idle_per_host(0).build().unwrap();
    let url = format!("http://{}/health", addr);

    let body: serde_json::Value = client.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["pool"]["max"], 4);

    pool.close().await;
    let status = client.get(&url).send().await.unwrap().status();
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    lifecycle.stop().await.unwrap();
}

#[tokio::test]
async fn unreachable_database_fails_provisioning() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = common::sqlite_config(dir.path());
    // mode=ro on a missing file cannot open.
    config.database.url = format!("sqlite://{}?mode=ro", dir.path().join("missing.db").display());

    let err = ResourceProvisioner::new(SqlxConnector, bundled_runner())
        .provision(&config)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("failed to initialize pool"));
}
