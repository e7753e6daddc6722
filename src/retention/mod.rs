//! Retention store: tracks produced artifacts and reclaims them after a
//! fixed window.
//!
//! Jobs schedule their artifacts here when they finish (on any terminal
//! path); a background sweeper deletes whatever has expired. Deletion is
//! best-effort: a failure is logged and the entry is still evicted, it will
//! not be retried.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct RetentionStore {
    entries: Arc<DashMap<PathBuf, DateTime<Utc>>>,
    window: Duration,
}

impl RetentionStore {
    pub fn new(window_secs: u64) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            window: Duration::from_secs(window_secs),
        }
    }

    /// Record (or overwrite) an expiry of now + window for `path`.
    /// A no-op when the path does not currently exist on disk.
    pub fn schedule_deletion(&self, path: &Path) {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Not scheduling missing artifact");
            return;
        }

        let expiry = Utc::now()
            + chrono::Duration::from_std(self.window).unwrap_or_else(|_| chrono::Duration::seconds(600));
        self.entries.insert(path.to_path_buf(), expiry);
        tracing::info!(
            path = %path.display(),
            expiry = %expiry,
            "Scheduled artifact for deletion"
        );
    }

    /// Walk the given directories and schedule every file already on disk.
    ///
    /// Run once at process bootstrap so artifacts orphaned by an ungraceful
    /// prior shutdown are reclaimed one window after the next startup.
    pub fn seed_from_dirs(&self, dirs: &[PathBuf]) {
        let mut seeded = 0usize;
        for dir in dirs {
            seeded += self.seed_dir(dir);
        }
        if seeded > 0 {
            tracing::info!(count = seeded, "Seeded retention store with leftover artifacts");
        }
    }

    fn seed_dir(&self, dir: &Path) -> usize {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        let mut seeded = 0usize;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                seeded += self.seed_dir(&path);
            } else {
                self.schedule_deletion(&path);
                seeded += 1;
            }
        }
        seeded
    }

    /// Delete every artifact whose expiry has elapsed.
    ///
    /// Returns the number of entries evicted. Entries are evicted even when
    /// the underlying deletion fails.
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut evicted = 0usize;

        self.entries.retain(|path, expiry| {
            if now < *expiry {
                return true;
            }

            match std::fs::remove_file(path) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "Deleted expired artifact");
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to delete expired artifact, evicting anyway"
                    );
                }
            }
            evicted += 1;
            false
        });

        if evicted > 0 {
            tracing::debug!(evicted = evicted, "Retention sweep finished");
        }
        evicted
    }

    pub fn is_tracked(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Start the background sweeper for the lifetime of the process.
///
/// The interval fires immediately, so the first sweep doubles as the startup
/// catch-up pass over anything `seed_from_dirs` found.
pub fn start_sweeper(store: RetentionStore, interval_secs: u64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            store.sweep_expired();
        }
    })
}
