//! Mindshare composite score.
//!
//! A stateless function of the current [`FeedState`]: mention volume,
//! influencer reach, engagement intensity, and author breadth, each pushed
//! onto a 0-100 scale and blended with fixed weights.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use mindshare_core::{CanonicalPost, MindshareSnapshot};

use crate::engagement::{log_scaled, EngagementAggregate};
use crate::store::FeedState;

const SOCIAL_WEIGHT: f64 = 0.30;
const INFLUENCER_WEIGHT: f64 = 0.25;
const ENGAGEMENT_WEIGHT: f64 = 0.25;
const AWARENESS_WEIGHT: f64 = 0.20;

const SOCIAL_K: f64 = 20.0;
const INFLUENCER_K: f64 = 28.0;
const ENGAGEMENT_K: f64 = 20.0;

/// Fewer posts than this and `change_pct` is reported as 0.
const CHANGE_MIN_ITEMS: usize = 20;
/// Floor for a quartile's time span so equal timestamps do not divide by zero.
const MIN_SLICE_SPAN_MS: i64 = 60_000;

/// The four normalized components of the score.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MindshareInputs {
    pub social_mentions: usize,
    pub influencer_mentions: usize,
    /// Log-compressed per-post engagement, already in `[0, 100]`.
    pub engagement_scaled: f64,
    /// Distinct-author share, already in `[0, 100]`.
    pub brand_awareness: f64,
}

impl MindshareInputs {
    #[must_use]
    pub fn from_state(state: &FeedState) -> Self {
        let posts = state.posts.snapshot();
        Self {
            social_mentions: posts.len(),
            influencer_mentions: state.influencers.len(),
            engagement_scaled: EngagementAggregate::over(posts).scaled(ENGAGEMENT_K),
            brand_awareness: brand_awareness(posts),
        }
    }

    /// Weighted composite, clamped to `[0, 100]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self) -> f64 {
        let score = SOCIAL_WEIGHT * log_scaled(self.social_mentions as f64, SOCIAL_K)
            + INFLUENCER_WEIGHT * log_scaled(self.influencer_mentions as f64, INFLUENCER_K)
            + ENGAGEMENT_WEIGHT * clamp_pct(self.engagement_scaled)
            + AWARENESS_WEIGHT * clamp_pct(self.brand_awareness);
        clamp_pct(score)
    }
}

fn clamp_pct(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 100.0)
    }
}

/// Percentage of posts written by distinct authors. Blank author ids are not counted.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn brand_awareness(posts: &[CanonicalPost]) -> f64 {
    if posts.is_empty() {
        return 0.0;
    }
    let authors: HashSet<&str> = posts
        .iter()
        .map(|p| p.author_id.as_str())
        .filter(|a| !a.is_empty())
        .collect();
    clamp_pct(100.0 * authors.len() as f64 / posts.len() as f64)
}

/// Coarse volume acceleration between the newest and oldest quartile.
///
/// The newest-first list is cut by position into quartiles; the first and
/// last quartile each get an item rate (items per unit of the time they
/// span), and the result is the percent change from the oldest rate to the
/// newest. Because the store is not evenly time-sampled this is an
/// approximation, not a time-series trend. Returns 0 below 20 items.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn change_pct(posts: &[CanonicalPost]) -> f64 {
    let n = posts.len();
    if n < CHANGE_MIN_ITEMS {
        return 0.0;
    }
    let q = n / 4;
    let latest = &posts[..q];
    let earliest = &posts[n - q..];

    let latest_rate = q as f64 / slice_span_ms(latest) as f64;
    let earliest_rate = q as f64 / slice_span_ms(earliest) as f64;

    let pct = (latest_rate - earliest_rate) / earliest_rate * 100.0;
    (pct * 10.0).round() / 10.0
}

fn slice_span_ms(slice: &[CanonicalPost]) -> i64 {
    let min = slice.iter().map(|p| p.timestamp_ms).min().unwrap_or(0);
    let max = slice.iter().map(|p| p.timestamp_ms).max().unwrap_or(0);
    max.saturating_sub(min).max(MIN_SLICE_SPAN_MS)
}

/// Compute the full snapshot for `state` as of `now`.
#[must_use]
pub fn compute_mindshare(state: &FeedState, now: DateTime<Utc>) -> MindshareSnapshot {
    let inputs = MindshareInputs::from_state(state);
    MindshareSnapshot {
        score: inputs.score(),
        change_pct: change_pct(state.posts.snapshot()),
        social_mentions: inputs.social_mentions,
        influencer_mentions: inputs.influencer_mentions,
        engagement_avg: inputs.engagement_scaled,
        brand_awareness_pct: inputs.brand_awareness,
        computed_at: now,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use mindshare_core::CanonicalInfluencer;

    use super::*;
    use crate::store::{FeedBatch, IngestionEvent};

    fn post(id: usize, author: &str, likes: u64, ts: i64) -> CanonicalPost {
        CanonicalPost {
            id: id.to_string(),
            platform: "Social".to_string(),
            text: String::new(),
            tags: BTreeSet::new(),
            author_id: author.to_string(),
            likes,
            shares: 0,
            comments: 0,
            interactions: 0,
            sentiment_raw: None,
            timestamp_ms: ts,
        }
    }

    fn influencer(id: usize) -> CanonicalInfluencer {
        CanonicalInfluencer {
            id: id.to_string(),
            name: format!("creator-{id}"),
            avatar_url: None,
            follower_count: 1000,
            interactions_24h: 10,
            rank: 0,
        }
    }

    fn state(posts: Vec<CanonicalPost>, influencers: Vec<CanonicalInfluencer>) -> FeedState {
        let now = Utc::now();
        FeedState::default()
            .apply(IngestionEvent::Poll(FeedBatch::Posts(posts)), 1000, now)
            .apply(
                IngestionEvent::Poll(FeedBatch::Influencers(influencers)),
                1000,
                now,
            )
    }

    #[test]
    fn empty_state_scores_zero() {
        let snap = compute_mindshare(&FeedState::default(), Utc::now());
        assert_eq!(snap.score, 0.0);
        assert_eq!(snap.change_pct, 0.0);
        assert_eq!(snap.social_mentions, 0);
        assert_eq!(snap.brand_awareness_pct, 0.0);
    }

    #[test]
    fn zero_inputs_give_exactly_zero() {
        assert_eq!(MindshareInputs::default().score(), 0.0);
    }

    #[test]
    fn any_positive_input_gives_positive_score() {
        let inputs = MindshareInputs {
            influencer_mentions: 1,
            ..MindshareInputs::default()
        };
        assert!(inputs.score() > 0.0);
    }

    #[test]
    fn score_matches_weighted_formula() {
        let inputs = MindshareInputs {
            social_mentions: 9,
            influencer_mentions: 9,
            engagement_scaled: 50.0,
            brand_awareness: 100.0,
        };
        // log10(10) = 1 -> 20 and 28
        let expected = 0.30 * 20.0 + 0.25 * 28.0 + 0.25 * 50.0 + 0.20 * 100.0;
        assert!((inputs.score() - expected).abs() < 1e-9);
    }

    #[test]
    fn score_is_bounded_for_huge_inputs() {
        let inputs = MindshareInputs {
            social_mentions: usize::MAX,
            influencer_mentions: usize::MAX,
            engagement_scaled: 1e9,
            brand_awareness: 1e9,
        };
        let score = inputs.score();
        assert!((0.0..=100.0).contains(&score), "score out of range: {score}");
        assert!((score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn brand_awareness_counts_distinct_authors() {
        let posts = vec![
            post(1, "a", 0, 0),
            post(2, "a", 0, 0),
            post(3, "b", 0, 0),
            post(4, "", 0, 0),
        ];
        assert!((brand_awareness(&posts) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn snapshot_reflects_state_sizes() {
        let s = state(
            vec![post(1, "a", 9, 0), post(2, "b", 9, 0)],
            vec![influencer(1), influencer(2), influencer(3)],
        );
        let snap = compute_mindshare(&s, Utc::now());
        assert_eq!(snap.social_mentions, 2);
        assert_eq!(snap.influencer_mentions, 3);
        assert!((snap.brand_awareness_pct - 100.0).abs() < 1e-9);
        // avg 9 per post -> log10(10) * 20
        assert!((snap.engagement_avg - 20.0).abs() < 1e-9);
        assert!(snap.score > 0.0 && snap.score <= 100.0);
    }

    #[test]
    fn change_pct_needs_twenty_items() {
        let posts: Vec<_> = (0..19).map(|i| post(i, "a", 0, 0)).collect();
        assert_eq!(change_pct(&posts), 0.0);
    }

    #[test]
    fn change_pct_is_zero_for_uniform_cadence() {
        // newest first, one post a minute
        let posts: Vec<_> = (0..40)
            .map(|i| post(i, "a", 0, 10_000_000 - i64::try_from(i).unwrap() * 60_000))
            .collect();
        assert_eq!(change_pct(&posts), 0.0);
    }

    #[test]
    fn change_pct_positive_when_recent_posts_are_denser() {
        // newest 10 posts one minute apart, older 30 posts ten minutes apart
        let mut ts = 100_000_000_i64;
        let mut posts = Vec::new();
        for i in 0..40 {
            posts.push(post(i, "a", 0, ts));
            ts -= if i < 10 { 60_000 } else { 600_000 };
        }
        let pct = change_pct(&posts);
        assert!(pct > 0.0, "expected acceleration, got {pct}");
    }
}
