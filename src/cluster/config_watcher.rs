//! Version-tracking poller for cluster configs
//!
//! The discovery client answers one question per call and remembers nothing.
//! This watcher sits on the caller's side of that contract: it polls, keeps
//! the last config it accepted, and reports a new one only when the server's
//! version goes up.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use super::topology::ClusterConfig;
use crate::client::{ConfigSource, DiscoveryClient};
use crate::utils::Result;

/// Poll interval recommended for configuration endpoints
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Clears the refresh flag when a refresh ends, including by panic
struct RefreshGuard<'a>(&'a AtomicBool);

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Shared cluster config tracker
///
/// Safe to share across threads; concurrent refreshes collapse into one.
pub struct ConfigWatcher<S: ConfigSource = DiscoveryClient> {
    /// Where configs come from
    source: S,

    /// Last accepted config
    current: RwLock<Option<ClusterConfig>>,

    /// Whether a refresh is currently in progress
    is_refreshing: AtomicBool,

    /// Completed polls, successful or not
    polls: AtomicU64,

    /// Accepted version changes
    changes: AtomicU64,
}

impl<S: ConfigSource> ConfigWatcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            current: RwLock::new(None),
            is_refreshing: AtomicBool::new(false),
            polls: AtomicU64::new(0),
            changes: AtomicU64::new(0),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Last accepted config, if any poll has succeeded
    pub fn current(&self) -> Option<ClusterConfig> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Version of the last accepted config
    pub fn version(&self) -> Option<u64> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.version)
    }

    pub fn poll_count(&self) -> u64 {
        self.polls.load(Ordering::Relaxed)
    }

    pub fn change_count(&self) -> u64 {
        self.changes.load(Ordering::Relaxed)
    }

    /// Poll the source once
    ///
    /// Returns the new config if its version is higher than the last accepted
    /// one (or nothing was accepted yet), `None` if the version did not go up
    /// or another thread is already refreshing. Errors leave the current
    /// config untouched.
    pub fn refresh(&self) -> Result<Option<ClusterConfig>> {
        if self
            .is_refreshing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(None);
        }

        let _guard = RefreshGuard(&self.is_refreshing);

        let result = self.source.get_cluster_config();
        self.polls.fetch_add(1, Ordering::Relaxed);

        result.map(|config| self.accept(config))
    }

    fn accept(&self, config: ClusterConfig) -> Option<ClusterConfig> {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        match current.as_ref() {
            Some(previous) if !config.is_newer_than(previous) => {
                if previous.is_newer_than(&config) {
                    warn!(
                        "Ignoring cluster config version {}, older than current version {}",
                        config.version, previous.version
                    );
                }
                return None;
            }
            Some(previous) => info!(
                "Cluster config changed: version {} -> {}, {} nodes",
                previous.version,
                config.version,
                config.num_nodes()
            ),
            None => info!(
                "Cluster config loaded: version {}, {} nodes",
                config.version,
                config.num_nodes()
            ),
        }

        *current = Some(config.clone());
        self.changes.fetch_add(1, Ordering::Relaxed);
        Some(config)
    }

    /// Poll every `interval`, calling `on_change` for each version increase
    ///
    /// Failed polls are logged and skipped. Runs forever unless `max_polls`
    /// is given.
    pub fn run<F>(&self, interval: Duration, max_polls: Option<u64>, mut on_change: F)
    where
        F: FnMut(&ClusterConfig),
    {
        let mut polls = 0u64;
        loop {
            match self.refresh() {
                Ok(Some(config)) => on_change(&config),
                Ok(None) => {}
                Err(e) => warn!("Cluster config poll failed: {}", e),
            }

            polls += 1;
            if max_polls.is_some_and(|max| polls >= max) {
                break;
            }
            thread::sleep(interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::CacheNode;
    use crate::utils::{DiscoveryError, ProtocolError};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays a fixed sequence of results, then reports version 0
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<ClusterConfig>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<ClusterConfig>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    impl ConfigSource for ScriptedSource {
        fn get_cluster_config(&self) -> Result<ClusterConfig> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(config(0, 0)))
        }
    }

    fn config(version: u64, nodes: usize) -> ClusterConfig {
        ClusterConfig::new(
            version,
            (0..nodes)
                .map(|i| CacheNode::new(format!("node{}", i), format!("10.0.0.{}", i), 11211))
                .collect(),
        )
    }

    fn corrupt() -> DiscoveryError {
        ProtocolError::CorruptPayload("missing trailing CRLF".to_string()).into()
    }

    #[test]
    fn test_first_success_is_a_change() {
        let watcher = ConfigWatcher::new(ScriptedSource::new(vec![Ok(config(1, 3))]));
        assert_eq!(watcher.version(), None);

        let changed = watcher.refresh().unwrap();
        assert_eq!(changed, Some(config(1, 3)));
        assert_eq!(watcher.version(), Some(1));
        assert_eq!(watcher.poll_count(), 1);
        assert_eq!(watcher.change_count(), 1);
    }

    #[test]
    fn test_only_version_increase_is_reported() {
        let watcher = ConfigWatcher::new(ScriptedSource::new(vec![
            Ok(config(1, 3)),
            Ok(config(1, 3)),
            Ok(config(2, 4)),
            Ok(config(1, 3)),
        ]));

        assert!(watcher.refresh().unwrap().is_some());
        assert!(watcher.refresh().unwrap().is_none());
        assert_eq!(watcher.refresh().unwrap(), Some(config(2, 4)));

        // Regression is ignored
        assert!(watcher.refresh().unwrap().is_none());
        assert_eq!(watcher.current(), Some(config(2, 4)));
        assert_eq!(watcher.change_count(), 2);
    }

    #[test]
    fn test_error_keeps_current_config() {
        let watcher = ConfigWatcher::new(ScriptedSource::new(vec![
            Ok(config(5, 2)),
            Err(corrupt()),
        ]));

        watcher.refresh().unwrap();
        assert!(watcher.refresh().is_err());
        assert_eq!(watcher.current(), Some(config(5, 2)));
        assert_eq!(watcher.poll_count(), 2);
    }

    #[test]
    fn test_run_reports_changes() {
        let watcher = ConfigWatcher::new(ScriptedSource::new(vec![
            Ok(config(1, 1)),
            Err(corrupt()),
            Ok(config(1, 1)),
            Ok(config(3, 2)),
        ]));

        let mut seen = Vec::new();
        watcher.run(Duration::from_millis(1), Some(4), |c| seen.push(c.version));

        assert_eq!(seen, vec![1, 3]);
        assert_eq!(watcher.poll_count(), 4);
    }

    #[test]
    fn test_refresh_recovers_after_source_panic() {
        struct PanicsOnce {
            calls: AtomicU64,
        }
        impl ConfigSource for PanicsOnce {
            fn get_cluster_config(&self) -> Result<ClusterConfig> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("source failed");
                }
                Ok(config(2, 1))
            }
        }

        let watcher = ConfigWatcher::new(PanicsOnce {
            calls: AtomicU64::new(0),
        });
        let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| watcher.refresh()));
        assert!(panicked.is_err());

        assert_eq!(watcher.refresh().unwrap(), Some(config(2, 1)));
        assert_eq!(watcher.version(), Some(2));
    }

    #[test]
    fn test_shared_across_threads() {
        struct Fixed;
        impl ConfigSource for Fixed {
            fn get_cluster_config(&self) -> Result<ClusterConfig> {
                thread::sleep(Duration::from_millis(5));
                Ok(config(7, 2))
            }
        }

        let watcher = Arc::new(ConfigWatcher::new(Fixed));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let watcher = Arc::clone(&watcher);
                thread::spawn(move || {
                    for _ in 0..5 {
                        watcher.refresh().unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(watcher.change_count(), 1);
        assert_eq!(watcher.version(), Some(7));
    }
}
