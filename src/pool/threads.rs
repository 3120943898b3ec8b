//! Named background threads for pool upkeep.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use crate::pool::settings::MaintenanceThreadSettings;

/// Spawns `{prefix}-{n}` threads for pool maintenance work.
///
/// Rust never waits for spawned threads at process exit, so a detached
/// maintenance thread cannot hold up shutdown.
#[derive(Debug)]
pub struct MaintenanceThreadFactory {
    prefix: String,
    daemon: bool,
    counter: AtomicUsize,
}

impl MaintenanceThreadFactory {
    pub fn new(settings: &MaintenanceThreadSettings) -> Self {
        Self {
            prefix: settings.name_prefix.clone(),
            daemon: settings.daemon,
            counter: AtomicUsize::new(1),
        }
    }

    /// Whether spawned threads are left detached.
    pub fn is_daemon(&self) -> bool {
        self.daemon
    }

    /// Name for the next spawned thread.
    pub fn next_name(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }

    /// Spawn a named thread running `f`.
    pub fn spawn<F>(&self, f: F) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        let name = self.next_name();
        tracing::debug!(thread = %name, daemon = self.daemon, "Spawning pool maintenance thread");
        thread::Builder::new().name(name).spawn(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings() -> MaintenanceThreadSettings {
        MaintenanceThreadSettings {
            name_prefix: "hikari-mysql".into(),
            daemon: true,
            interval: Duration::from_secs(1),
        }
    }

    #[test]
    fn names_are_sequential() {
        let factory = MaintenanceThreadFactory::new(&settings());
        assert_eq!(factory.next_name(), "hikari-mysql-1");
        assert_eq!(factory.next_name(), "hikari-mysql-2");
    }

    #[test]
    fn spawned_thread_carries_name() {
        let factory = MaintenanceThreadFactory::new(&settings());
        let handle = factory
            .spawn(|| {
                assert_eq!(thread::current().name(), Some("hikari-mysql-1"));
            })
            .unwrap();
        handle.join().unwrap();
    }
}
