//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! start (service.rs):
//!     lock → bind listener → spawn serve task → Running → post-start hooks (hooks.rs)
//!
//! stop (service.rs):
//!     lock → fire stop channel → drain (bounded) → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → caller stops the lifecycle
//! ```

pub mod hooks;
pub mod service;
pub mod signals;

pub use hooks::{HookError, MetricsExporterHook, PostStartHook, SampleSeederHook};
pub use service::{LifecycleError, ServiceLifecycle};
pub use signals::wait_for_shutdown_signal;
