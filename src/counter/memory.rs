//! In-memory sliding window counter implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::backend::Counter;
use super::key::CounterKey;
use crate::config::MemoryCounterConfig;
use crate::error::Result;

/// A single counter cell with its expiry deadline.
///
/// The count only ever increases for the lifetime of the entry. `u64` does
/// not wrap within a realistic entry lifetime, so no overflow handling is
/// applied.
#[derive(Debug)]
struct CounterEntry {
    /// Number of increments recorded for this composite key
    count: AtomicU64,
    /// Deadline after which the entry is logically absent
    expires_at: Instant,
}

impl CounterEntry {
    fn new(initial: u64, ttl: Duration) -> Self {
        Self {
            count: AtomicU64::new(initial),
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Store shared between the counter handle and the reclamation task.
#[derive(Debug)]
struct Store {
    entries: DashMap<String, CounterEntry>,
    /// Entry time-to-live, fixed at twice the window length
    ttl: Duration,
    /// Maximum number of entries retained (0 = unbounded)
    capacity: u64,
    /// Serializes entry creation while a capacity bound is in effect, so
    /// the bound holds exactly. Increments on live entries never take it.
    create_lock: Mutex<()>,
}

impl Store {
    /// Current count for a storage key. Expired entries read as absent.
    fn count(&self, storage_key: &str) -> u64 {
        match self.entries.get(storage_key) {
            Some(entry) if !entry.is_expired(Instant::now()) => {
                entry.count.load(Ordering::Relaxed)
            }
            _ => 0,
        }
    }

    /// Add 1 to the count for a storage key, creating the entry if absent.
    fn increment(&self, storage_key: String) {
        let now = Instant::now();

        // Hot path: the entry is live, bump its cell under a shared map
        // reference.
        if let Some(entry) = self.entries.get(&storage_key) {
            if !entry.is_expired(now) {
                entry.count.fetch_add(1, Ordering::Relaxed);
                trace!(key = %storage_key, "Incremented counter");
                return;
            }
        }

        let _guard = (self.capacity > 0).then(|| self.create_lock.lock());
        if self.capacity > 0 {
            self.make_room(&storage_key, now);
        }

        match self.entries.entry(storage_key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    // First increment after expiry starts a fresh window.
                    debug!(key = %occupied.key(), "Replacing expired counter entry");
                    occupied.insert(CounterEntry::new(1, self.ttl));
                } else {
                    // A concurrent caller created the entry between our
                    // lookup and here; its cell absorbs our increment.
                    occupied.get().count.fetch_add(1, Ordering::Relaxed);
                }
            }
            Entry::Vacant(vacant) => {
                debug!(key = %vacant.key(), "Creating counter entry");
                vacant.insert(CounterEntry::new(1, self.ttl));
            }
        }
    }

    /// Make room for one incoming entry. Expired entries are reclaimed
    /// first; if the store is still full, the entry closest to its deadline
    /// is evicted. Callers hold `create_lock`.
    fn make_room(&self, incoming: &str, now: Instant) {
        if self.entries.contains_key(incoming) {
            return;
        }
        if (self.entries.len() as u64) < self.capacity {
            return;
        }

        self.sweep(now);

        while self.entries.len() as u64 >= self.capacity {
            let victim = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().expires_at)
                .map(|entry| entry.key().clone());

            match victim {
                Some(key) => {
                    debug!(key = %key, "Evicting counter entry to stay within capacity");
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Remove every entry whose deadline has passed, returning how many
    /// were removed.
    fn sweep(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }
}

/// In-memory sliding window counter.
///
/// Counts are kept in a concurrent map keyed by the composite
/// `"<key>-<window>"` form, with a time-to-live of twice the window length
/// so the previous window's count remains queryable after rollover.
///
/// Increments on a live entry are lock-free: the count is an atomic cell
/// and the map is only written on the create path, so increments on
/// unrelated keys never serialize against each other. When a capacity
/// bound is configured, entry creation (and only creation) serializes on a
/// mutex to enforce the bound exactly.
#[derive(Debug)]
pub struct MemoryCounter {
    store: Arc<Store>,
    /// Length of one counting window
    window_length: Duration,
    /// Background reclamation task, absent when auto-deletion is disabled
    sweeper: Option<JoinHandle<()>>,
}

impl MemoryCounter {
    /// Create a new in-memory counter.
    ///
    /// Unless `disable_auto_delete_expired` is set, this spawns a
    /// background task on the ambient Tokio runtime that periodically
    /// removes expired entries. The task is aborted when the counter is
    /// dropped.
    pub fn new(config: MemoryCounterConfig) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(Store {
            entries: DashMap::new(),
            ttl: config.window_length * 2,
            capacity: config.capacity,
            create_lock: Mutex::new(()),
        });

        let sweeper = if config.disable_auto_delete_expired {
            None
        } else {
            Some(Self::spawn_sweeper(
                Arc::clone(&store),
                config.window_length,
            ))
        };

        Ok(Self {
            store,
            window_length: config.window_length,
            sweeper,
        })
    }

    /// Length of one counting window.
    pub fn window_length(&self) -> Duration {
        self.window_length
    }

    /// Number of physically retained entries, including expired entries
    /// that have not been swept yet.
    pub fn len(&self) -> usize {
        self.store.entries.len()
    }

    /// Whether the store currently retains no entries.
    pub fn is_empty(&self) -> bool {
        self.store.entries.is_empty()
    }

    /// Synchronously remove all expired entries, returning how many were
    /// removed.
    ///
    /// Intended for callers that disabled the background reclamation task
    /// and need deterministic cleanup. Expired entries already read as
    /// absent before removal; sweeping only reclaims their memory.
    pub fn delete_expired(&self) -> usize {
        let removed = self.store.sweep(Instant::now());
        if removed > 0 {
            debug!(removed, "Removed expired counter entries");
        }
        removed
    }

    fn spawn_sweeper(store: Arc<Store>, window_length: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(window_length);
            // The first tick completes immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = store.sweep(Instant::now());
                if removed > 0 {
                    debug!(removed, "Swept expired counter entries");
                }
            }
        })
    }
}

impl Drop for MemoryCounter {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

#[async_trait]
impl Counter for MemoryCounter {
    async fn get(&self, key: &str, window: DateTime<Utc>) -> Result<u64> {
        let storage_key = CounterKey::new(key, window).to_storage_key();
        Ok(self.store.count(&storage_key))
    }

    async fn increment(&self, key: &str, window: DateTime<Utc>) -> Result<()> {
        let storage_key = CounterKey::new(key, window).to_storage_key();
        self.store.increment(storage_key);
        Ok(())
    }
}
