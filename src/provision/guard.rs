//! Scope guard that closes a pool unless ownership is handed off.

use crate::pool::PoolResource;

/// Holds an opened pool until provisioning finishes.
///
/// While armed, dropping the guard schedules `close` on the current Tokio
/// runtime. This covers panics and cancelled provisioning futures.
pub struct PoolGuard<P: PoolResource> {
    pool: P,
    armed: bool,
}

impl<P: PoolResource> PoolGuard<P> {
    pub fn new(pool: P) -> Self {
        Self { pool, armed: true }
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Hand the pool to the caller; it will not be closed.
    pub fn disarm(mut self) -> P {
        self.armed = false;
        self.pool.clone()
    }

    /// Close the pool now and consume the guard.
    pub async fn close(mut self) {
        self.armed = false;
        self.pool.close().await;
    }
}

impl<P: PoolResource> Drop for PoolGuard<P> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let pool = self.pool.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!("Provisioning abandoned with an open pool, closing it");
                handle.spawn(async move {
                    pool.close().await;
                });
            }
            Err(_) => {
                tracing::error!("No runtime available to close abandoned pool");
            }
        }
    }
}
