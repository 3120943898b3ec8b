//! Seams between provisioning and the concrete pool implementation.

use async_trait::async_trait;

use crate::pool::error::PoolResult;
use crate::pool::handle::ConnectionPool;
use crate::pool::settings::PoolSettings;

/// A pooled resource with an explicit, one-way close.
#[async_trait]
pub trait PoolResource: Clone + Send + Sync + 'static {
    /// Settings the resource was opened with.
    fn settings(&self) -> &PoolSettings;

    /// True once `close` has been called.
    fn is_closed(&self) -> bool;

    /// Release all connections. Must be idempotent.
    async fn close(&self);
}

/// Opens a [`PoolResource`] from settings.
#[async_trait]
pub trait PoolConnector: Send + Sync {
    type Pool: PoolResource;

    async fn open(&self, settings: &PoolSettings) -> PoolResult<Self::Pool>;
}

#[async_trait]
impl PoolResource for ConnectionPool {
    fn settings(&self) -> &PoolSettings {
        ConnectionPool::settings(self)
    }

    fn is_closed(&self) -> bool {
        ConnectionPool::is_closed(self)
    }

    async fn close(&self) {
        ConnectionPool::close(self).await
    }
}

/// Opens sqlx-backed [`ConnectionPool`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlxConnector;

#[async_trait]
impl PoolConnector for SqlxConnector {
    type Pool = ConnectionPool;

    async fn open(&self, settings: &PoolSettings) -> PoolResult<ConnectionPool> {
        ConnectionPool::open(settings.clone()).await
    }
}
