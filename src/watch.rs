//! External change detection for [`FileStore`].
//!
//! Another process writing the same data directory shows up here as file
//! events; the affected keys are re-read and broadcast to the store's
//! subscribers. Writes made through this process are seen twice (once from
//! `set`, once from the watcher) with the same value.

use std::collections::BTreeSet;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::Result;
use crate::storage::{FileStore, KeyValueStore, StorageChange};

/// Quiet period before pending keys are re-read
pub const WATCH_DEBOUNCE_MS: u64 = 75;

/// Keeps the watch alive; dropping it stops the background thread.
pub struct StoreWatcher {
    _watcher: RecommendedWatcher,
}

impl StoreWatcher {
    pub fn start(store: &FileStore) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = event_tx.send(res);
        })?;
        watcher.watch(store.dir(), RecursiveMode::NonRecursive)?;

        let store = store.clone();
        let broadcaster = store.broadcaster();
        thread::spawn(move || {
            let debounce = Duration::from_millis(WATCH_DEBOUNCE_MS);
            let mut pending: BTreeSet<String> = BTreeSet::new();
            let mut deadline: Option<Instant> = None;

            loop {
                let timeout = deadline
                    .map(|at| at.saturating_duration_since(Instant::now()))
                    .unwrap_or(Duration::from_secs(3600));
                match event_rx.recv_timeout(timeout) {
                    Ok(Ok(event)) => {
                        let notify::Event { paths, .. } = event;
                        for path in paths {
                            if let Some(key) = store.key_for_path(&path) {
                                pending.insert(key);
                            }
                        }
                        if !pending.is_empty() {
                            deadline = Some(Instant::now() + debounce);
                        }
                    }
                    Ok(Err(err)) => {
                        tracing::warn!(%err, "store watch error");
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        for key in std::mem::take(&mut pending) {
                            let value = store.get(&key);
                            tracing::debug!(key = %key, "external store change");
                            broadcaster.publish(StorageChange { key, value });
                        }
                        deadline = None;
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Ok(Self { _watcher: watcher })
    }
}
