//! Canonical records every feed payload is normalized into.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Platform label used when a payload does not name one.
pub const DEFAULT_PLATFORM: &str = "Social";

/// A social post after normalization.
///
/// Immutable once built; dropped when evicted from the rolling store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPost {
    pub id: String,
    /// Source network, e.g. `"twitter"`; [`DEFAULT_PLATFORM`] when unknown.
    pub platform: String,
    pub text: String,
    /// Lowercased `#`-prefixed topic tags: explicit tags plus hashtags in `text`.
    pub tags: BTreeSet<String>,
    /// Empty when the payload carried no author.
    pub author_id: String,
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
    pub interactions: u64,
    /// Raw provider sentiment, on either a `[-1, 1]` or `[0, 100]` scale.
    pub sentiment_raw: Option<f64>,
    pub timestamp_ms: i64,
}

impl CanonicalPost {
    /// Sum of every engagement counter on the post.
    #[must_use]
    pub fn engagement(&self) -> u64 {
        self.likes
            .saturating_add(self.shares)
            .saturating_add(self.comments)
            .saturating_add(self.interactions)
    }
}

/// A creator/influencer directory entry after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalInfluencer {
    pub id: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub follower_count: u64,
    pub interactions_24h: u64,
    /// Provider rank; 0 when unranked.
    pub rank: u32,
}
