//! Listener lifecycle state machine tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;

use server_bootstrap::config::ServerConfig;
use server_bootstrap::http::health_router;
use server_bootstrap::lifecycle::{HookError, LifecycleError, PostStartHook, ServiceLifecycle};

fn lifecycle() -> ServiceLifecycle {
    let config = ServerConfig {
        bind_address: "127.0.0.1:0".into(),
        shutdown_timeout_secs: 2,
        ..ServerConfig::default()
    };
    ServiceLifecycle::new(config, health_router(None))
}

fn client() -> reqwest::Client {
    // No keep-alive so stop does not wait on idle connections.
    reqwest::Client::builder().pool_max_idle_per_host(0).build().unwrap()
}

struct CountingHook {
    runs: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl PostStartHook for CountingHook {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn run(&self, _address: SocketAddr) -> Result<(), HookError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err("hook failed on purpose".into())
        } else {
            Ok(())
        }
    }
}

#[tokio::test]
async fn start_serves_health_before_returning() {
    let lifecycle = lifecycle();
    let addr = lifecycle.start().await.unwrap();

    let response = client()
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    lifecycle.stop().await.unwrap();
}

#[tokio::test]
async fn start_while_running_is_rejected() {
    let lifecycle = lifecycle();
    lifecycle.start().await.unwrap();

    let err = lifecycle.start().await.unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyRunning));
    assert!(lifecycle.is_running().await);

    lifecycle.stop().await.unwrap();
}

#[tokio::test]
async fn stop_while_stopped_is_rejected() {
    let lifecycle = lifecycle();
    assert!(matches!(lifecycle.stop().await, Err(LifecycleError::NotRunning)));

    lifecycle.start().await.unwrap();
    lifecycle.stop().await.unwrap();
    assert!(matches!(lifecycle.stop().await, Err(LifecycleError::NotRunning)));
}

#[tokio::test]
async fn start_stop_start_succeeds() {
    let lifecycle = lifecycle();

    let first = lifecycle.start().await.unwrap();
    lifecycle.stop().await.unwrap();
    assert!(!lifecycle.is_running().await);
    assert_eq!(lifecycle.local_addr().await, None);

    let second = lifecycle.start().await.unwrap();
    assert_eq!(lifecycle.local_addr().await, Some(second));
    let status = client()
        .get(format!("http://{}/health", second))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, StatusCode::OK);
    lifecycle.stop().await.unwrap();
    assert_ne!(first.port(), 0);
}

#[tokio::test]
async fn concurrent_starts_yield_one_winner() {
    let lifecycle = Arc::new(lifecycle());
    let a = tokio::spawn({
        let lifecycle = lifecycle.clone();
        async move { lifecycle.start().await }
    });
    let b = tokio::spawn({
        let lifecycle = lifecycle.clone();
        async move { lifecycle.start().await }
    });

    let results = [a.await.unwrap(), b.await.unwrap()];
    let ok = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(LifecycleError::AlreadyRunning)))
        .count();
    assert_eq!((ok, rejected), (1, 1));

    lifecycle.stop().await.unwrap();
}

#[tokio::test]
async fn failing_hook_does_not_unwind_start() {
    let failing = Arc::new(CountingHook {
        runs: AtomicUsize::new(0),
        fail: true,
    });
    let after = Arc::new(CountingHook {
        runs: AtomicUsize::new(0),
        fail: false,
    });
    let lifecycle = lifecycle().with_hook(failing.clone()).with_hook(after.clone());

    lifecycle.start().await.unwrap();
    assert!(lifecycle.is_running().await);
    assert_eq!(failing.runs.load(Ordering::SeqCst), 1);
    assert_eq!(after.runs.load(Ordering::SeqCst), 1);

    lifecycle.stop().await.unwrap();
}

#[tokio::test]
async fn bind_failure_leaves_lifecycle_stopped() {
    let holder = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let taken = holder.local_addr().unwrap();
    let config = ServerConfig {
        bind_address: taken.to_string(),
        ..ServerConfig::default()
    };
    let lifecycle = ServiceLifecycle::new(config, health_router(None));

    let err = lifecycle.start().await.unwrap_err();
    assert!(matches!(err, LifecycleError::Bind { .. }));
    assert!(!lifecycle.is_running().await);
}
