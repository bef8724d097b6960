//! Counter trait for abstracting local and remote counting backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// Trait for sliding window counter backends.
///
/// A counter records how many events occurred for a key within a time
/// window. The window instant must already be truncated to the window
/// boundary by the caller; two calls with the same key but different window
/// instants address entirely independent counts.
///
/// Both operations return a `Result` so that backends with real failure
/// modes (e.g. a networked store reporting timeouts or connectivity loss)
/// fit the same contract. The in-memory backend never errors.
#[async_trait]
pub trait Counter: Send + Sync {
    /// Return the count recorded for `key` within the window starting at
    /// `window`.
    ///
    /// Returns 0 when no entry exists, including when one existed but has
    /// since expired. Must not create an entry as a side effect.
    async fn get(&self, key: &str, window: DateTime<Utc>) -> Result<u64>;

    /// Increase the count for `key` within the window starting at `window`
    /// by exactly 1, creating the entry (count = 1) if absent.
    ///
    /// Safe to call concurrently, including for the same key and window:
    /// after N completed increments, `get` returns exactly N until the
    /// entry expires or is evicted.
    async fn increment(&self, key: &str, window: DateTime<Utc>) -> Result<()>;
}
