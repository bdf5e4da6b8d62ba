//! Value types derived from the rolling store on every read.
//!
//! None of these are persisted or patched in place; each query recomputes them
//! from the current snapshot.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tri-state sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "positive"),
            SentimentLabel::Neutral => write!(f, "neutral"),
            SentimentLabel::Negative => write!(f, "negative"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

/// Composite mindshare reading for the current snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindshareSnapshot {
    /// Weighted composite in `[0, 100]`.
    pub score: f64,
    /// Coarse volume acceleration between the newest and oldest quartile.
    pub change_pct: f64,
    pub social_mentions: usize,
    pub influencer_mentions: usize,
    /// Log-compressed per-post engagement in `[0, 100]`.
    pub engagement_avg: f64,
    /// Share of distinct authors among mentions, in `[0, 100]`.
    pub brand_awareness_pct: f64,
    pub computed_at: DateTime<Utc>,
}

/// Posts sharing one topic tag, aggregated and ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeAggregate {
    pub tag: String,
    pub mention_count: usize,
    pub total_engagement: u64,
    pub avg_engagement: f64,
    pub avg_sentiment_label: SentimentLabel,
    pub sources: BTreeSet<String>,
    pub timestamps: Vec<i64>,
    /// Relative strength in `[0, 100]`; the top bucket is always 100.
    pub strength: u8,
    pub trend: Trend,
    pub timeframe_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingTopic {
    pub topic: String,
    pub mentions: usize,
    pub trend: Trend,
}
