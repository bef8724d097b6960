//! Configuration for counter construction.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, TurnstileError};

/// Construction-time settings for the in-memory counter.
///
/// There is no runtime reconfiguration: the window length and capacity are
/// fixed for the lifetime of the counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCounterConfig {
    /// Length of one counting window.
    ///
    /// Entries live for twice this duration, so the previous window's count
    /// stays queryable after rollover.
    #[serde(default = "default_window_length")]
    pub window_length: Duration,

    /// Maximum number of distinct composite keys retained (0 = unbounded)
    #[serde(default)]
    pub capacity: u64,

    /// When true, no background reclamation task is spawned; the caller is
    /// responsible for calling `MemoryCounter::delete_expired`
    #[serde(default)]
    pub disable_auto_delete_expired: bool,
}

impl Default for MemoryCounterConfig {
    fn default() -> Self {
        Self {
            window_length: default_window_length(),
            capacity: 0,
            disable_auto_delete_expired: false,
        }
    }
}

fn default_window_length() -> Duration {
    Duration::from_secs(60)
}

impl MemoryCounterConfig {
    /// Create a configuration with the given window length and defaults for
    /// everything else.
    pub fn new(window_length: Duration) -> Self {
        Self {
            window_length,
            ..Self::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.window_length.is_zero() {
            return Err(TurnstileError::Config(
                "window_length must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MemoryCounterConfig::default();

        assert_eq!(config.window_length, Duration::from_secs(60));
        assert_eq!(config.capacity, 0);
        assert!(!config.disable_auto_delete_expired);
    }

    #[test]
    fn test_new_uses_defaults_for_options() {
        let config = MemoryCounterConfig::new(Duration::from_secs(5));

        assert_eq!(config.window_length, Duration::from_secs(5));
        assert_eq!(config.capacity, 0);
        assert!(!config.disable_auto_delete_expired);
    }

    #[test]
    fn test_validate_accepts_positive_window() {
        let config = MemoryCounterConfig::new(Duration::from_millis(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let config = MemoryCounterConfig::new(Duration::ZERO);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("window_length"));
    }
}
