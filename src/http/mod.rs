//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TcpListener (bound by ServiceLifecycle)
//!     → server.rs (request id, tracing, timeout layers; graceful shutdown)
//!     → caller's Router (default: health.rs)
//! ```

pub mod health;
pub mod server;

pub use health::health_router;
pub use server::{build_router, serve};
