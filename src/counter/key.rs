//! Composite key generation for counter storage.

use chrono::{DateTime, Utc};

/// A key that uniquely identifies one counter entry.
///
/// The key is composed of the caller-supplied raw key and the window's
/// start instant, truncated to unix seconds. Composition is deterministic:
/// the same (key, window) pair always produces the same storage key, and
/// different windows for the same raw key never collide. Callers must not
/// pick raw keys that forge another pair after composition (e.g. by ending
/// a key with `-<digits>` that lines up with a window timestamp).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey {
    /// The caller-supplied raw key
    pub key: String,
    /// Window start in unix seconds
    pub window_secs: i64,
}

impl CounterKey {
    /// Create a new counter key from a raw key and a window start instant.
    pub fn new(key: &str, window: DateTime<Utc>) -> Self {
        Self {
            key: key.to_string(),
            window_secs: window.timestamp(),
        }
    }

    /// Convert the key to its storage representation:
    /// `"<key>-<window_unix_seconds>"`.
    pub fn to_storage_key(&self) -> String {
        format!("{}-{}", self.key, self.window_secs)
    }
}

impl std::fmt::Display for CounterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_storage_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_counter_key_creation() {
        let window = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let key = CounterKey::new("user:1", window);

        assert_eq!(key.key, "user:1");
        assert_eq!(key.window_secs, window.timestamp());
    }

    #[test]
    fn test_counter_key_storage_form() {
        let window = Utc.timestamp_opt(1_714_000_000, 0).unwrap();
        let key = CounterKey::new("user:1", window);

        assert_eq!(key.to_storage_key(), "user:1-1714000000");
        assert_eq!(key.to_string(), "user:1-1714000000");
    }

    #[test]
    fn test_counter_key_equality() {
        let window = Utc.timestamp_opt(1_714_000_000, 0).unwrap();

        let key1 = CounterKey::new("user:1", window);
        let key2 = CounterKey::new("user:1", window);

        assert_eq!(key1, key2);
    }

    #[test]
    fn test_different_windows_produce_different_keys() {
        let w1 = Utc.timestamp_opt(1_714_000_000, 0).unwrap();
        let w2 = Utc.timestamp_opt(1_714_000_060, 0).unwrap();

        let key1 = CounterKey::new("user:1", w1);
        let key2 = CounterKey::new("user:1", w2);

        assert_ne!(key1, key2);
        assert_ne!(key1.to_storage_key(), key2.to_storage_key());
    }

    #[test]
    fn test_subsecond_instants_share_a_window() {
        let w1 = Utc.timestamp_opt(1_714_000_000, 0).unwrap();
        let w2 = Utc.timestamp_opt(1_714_000_000, 500_000_000).unwrap();

        assert_eq!(
            CounterKey::new("user:1", w1).to_storage_key(),
            CounterKey::new("user:1", w2).to_storage_key()
        );
    }
}
