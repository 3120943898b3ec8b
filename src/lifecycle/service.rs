//! Listener lifecycle: `Stopped → Running → Stopped`.
//!
//! # Responsibilities
//! - Bind the listener before `start` returns
//! - Reject `start` while running and `stop` while stopped
//! - Run post-start hooks without letting them fail a start
//!
//! # Design Decisions
//! - One `tokio::sync::Mutex` guards the state; start and stop never interleave
//! - Hooks run after the lock is released so a slow hook cannot block `stop`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::http;
use crate::lifecycle::hooks::PostStartHook;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("server is already running")]
    AlreadyRunning,

    #[error("server is not running")]
    NotRunning,

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server terminated with error: {0}")]
    Serve(#[source] std::io::Error),
}

struct RunningServer {
    address: SocketAddr,
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<Result<(), std::io::Error>>,
}

enum LifecycleState {
    Stopped,
    Running(RunningServer),
}

/// Owns the HTTP listener of a provisioned service.
pub struct ServiceLifecycle {
    config: ServerConfig,
    app: Router,
    hooks: Vec<Arc<dyn PostStartHook>>,
    state: Mutex<LifecycleState>,
}

impl ServiceLifecycle {
    pub fn new(config: ServerConfig, app: Router) -> Self {
        Self {
            config,
            app,
            hooks: Vec::new(),
            state: Mutex::new(LifecycleState::Stopped),
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn PostStartHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Bind and start serving. The socket accepts connections on return.
    pub async fn start(&self) -> Result<SocketAddr, LifecycleError> {
        let address = {
            let mut state = self.state.lock().await;
            if let LifecycleState::Running(_) = *state {
                return Err(LifecycleError::AlreadyRunning);
            }

            let listener = TcpListener::bind(&self.config.bind_address)
                .await
                .map_err(|source| LifecycleError::Bind {
                    address: self.config.bind_address.clone(),
                    source,
                })?;
            let address = listener.local_addr().map_err(|source| LifecycleError::Bind {
                address: self.config.bind_address.clone(),
                source,
            })?;

            let (stop_tx, stop_rx) = oneshot::channel();
            let app = http::build_router(&self.config, self.app.clone());
            let task = tokio::spawn(http::serve(listener, app, stop_rx));

            *state = LifecycleState::Running(RunningServer {
                address,
                stop_tx,
                task,
            });
            address
        };

        tracing::info!(address = %address, "Started server on http://{}/", address);
        self.run_hooks(address).await;
        Ok(address)
    }

    /// Stop accepting, drain in-flight requests and release the port.
    pub async fn stop(&self) -> Result<(), LifecycleError> {
        let mut state = self.state.lock().await;
        let running = match std::mem::replace(&mut *state, LifecycleState::Stopped) {
            LifecycleState::Running(running) => running,
            LifecycleState::Stopped => return Err(LifecycleError::NotRunning),
        };

        tracing::info!(address = %running.address, "Stopping server");
        if running.stop_tx.send(()).is_err() {
            tracing::debug!("Server task already exited");
        }

        let grace = Duration::from_secs(self.config.shutdown_timeout_secs);
        let mut task = running.task;
        match tokio::time::timeout(grace, &mut task).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(LifecycleError::Serve(e)),
            Ok(Err(join_error)) => {
                tracing::error!(error = %join_error, "Server task panicked");
                Ok(())
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = grace.as_secs(),
                    "Graceful shutdown timed out, aborting server task"
                );
                task.abort();
                let _ = task.await;
                Ok(())
            }
        }
    }

    pub async fn is_running(&self) -> bool {
        matches!(*self.state.lock().await, LifecycleState::Running(_))
    }

    /// Address of the live listener, if any.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.state.lock().await {
            LifecycleState::Running(running) => Some(running.address),
            LifecycleState::Stopped => None,
        }
    }

    async fn run_hooks(&self, address: SocketAddr) {
        for hook in &self.hooks {
            match hook.run(address).await {
                Ok(()) => tracing::debug!(hook = hook.name(), "Post-start hook finished"),
                Err(e) => tracing::error!(hook = hook.name(), error = %e, "Post-start hook failed"),
            }
        }
    }
}
