//! Shared domain types and configuration for the mindshare signal engine.
//!
//! Holds the canonical post/influencer records every feed is normalized into,
//! the value types derived from them, and the engine configuration loader.

pub mod app_config;
pub mod config;
pub mod metrics;
pub mod records;

pub use app_config::EngineConfig;
pub use config::{load_engine_config, load_engine_config_from_env};
pub use metrics::{
    MindshareSnapshot, NarrativeAggregate, SentimentLabel, Trend, TrendingTopic,
};
pub use records::{CanonicalInfluencer, CanonicalPost, DEFAULT_PLATFORM};

use thiserror::Error;

/// Errors raised while building or validating an [`EngineConfig`].
///
/// These are the only errors the engine surfaces synchronously at setup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid {knob}: {reason}")]
    InvalidKnob { knob: &'static str, reason: String },
}
