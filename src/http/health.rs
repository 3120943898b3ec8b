//! Health endpoint.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use crate::pool::ConnectionPool;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pool: Option<PoolHealth>,
}

#[derive(Debug, Serialize)]
struct PoolHealth {
    size: u32,
    idle: u32,
    max: u32,
}

/// `GET /health`. Reports pool occupancy when a pool is attached and
/// answers 503 once that pool is closed.
pub fn health_router(pool: Option<ConnectionPool>) -> Router {
    Router::new().route("/health", get(health)).with_state(pool)
}

async fn health(State(pool): State<Option<ConnectionPool>>) -> impl IntoResponse {
    let Some(pool) = pool else {
        return (StatusCode::OK, Json(HealthResponse { status: "ok", pool: None }));
    };
    let stats = pool.stats();
    let body = |status| HealthResponse {
        status,
        pool: Some(PoolHealth {
            size: stats.size,
            idle: stats.idle,
            max: stats.max,
        }),
    };
    if pool.is_closed() {
        (StatusCode::SERVICE_UNAVAILABLE, Json(body("unavailable")))
    } else {
        (StatusCode::OK, Json(body("ok")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_without_pool_is_ok() {
        let response = health_router(None)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let response = health_router(None)
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
