use std::time::Duration;

use crate::ConfigError;

/// Default rolling-store capacity per collection.
pub const DEFAULT_ROLLING_CAP_SIZE: usize = 500;
/// Default number of narratives returned by a query.
pub const DEFAULT_NARRATIVE_TOP_N: usize = 12;
/// Default number of trending topics returned by a query.
pub const DEFAULT_TRENDING_TOP_N: usize = 8;

/// Tunables for one engine instance.
///
/// Build with [`EngineConfig::default`] and override fields, or load from the
/// environment with [`crate::load_engine_config`]. Call [`EngineConfig::validate`]
/// before use; the engine constructor does this too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Poll interval for fast social-post feeds.
    pub fast_poll_interval_ms: u64,
    /// Poll interval for slow influencer directories.
    pub slow_poll_interval_ms: u64,
    pub rolling_cap_size: usize,
    pub narrative_top_n: usize,
    pub trending_top_n: usize,
    /// Per-request budget; expiry counts as a failure of that source only.
    pub request_timeout_ms: u64,
    /// `limit` passed to each source fetch.
    pub fetch_limit: usize,
    /// Wait before resubscribing to a push channel that went down.
    pub push_reconnect_delay_ms: u64,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fast_poll_interval_ms: 5 * 60 * 1000,
            slow_poll_interval_ms: 30 * 60 * 1000,
            rolling_cap_size: DEFAULT_ROLLING_CAP_SIZE,
            narrative_top_n: DEFAULT_NARRATIVE_TOP_N,
            trending_top_n: DEFAULT_TRENDING_TOP_N,
            request_timeout_ms: 10_000,
            fetch_limit: 100,
            push_reconnect_delay_ms: 15_000,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Check every knob is in range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidKnob`] naming the first offending knob.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive_ms = [
            ("fast_poll_interval_ms", self.fast_poll_interval_ms),
            ("slow_poll_interval_ms", self.slow_poll_interval_ms),
            ("request_timeout_ms", self.request_timeout_ms),
            ("push_reconnect_delay_ms", self.push_reconnect_delay_ms),
        ];
        for (knob, value) in positive_ms {
            if value == 0 {
                return Err(ConfigError::InvalidKnob {
                    knob,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        let at_least_one = [
            ("rolling_cap_size", self.rolling_cap_size),
            ("narrative_top_n", self.narrative_top_n),
            ("trending_top_n", self.trending_top_n),
            ("fetch_limit", self.fetch_limit),
        ];
        for (knob, value) in at_least_one {
            if value == 0 {
                return Err(ConfigError::InvalidKnob {
                    knob,
                    reason: "must be at least 1".to_string(),
                });
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn fast_poll_interval(&self) -> Duration {
        Duration::from_millis(self.fast_poll_interval_ms)
    }

    #[must_use]
    pub fn slow_poll_interval(&self) -> Duration {
        Duration::from_millis(self.slow_poll_interval_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[must_use]
    pub fn push_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.push_reconnect_delay_ms)
    }
}
