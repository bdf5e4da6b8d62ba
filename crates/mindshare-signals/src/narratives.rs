//! Narrative extraction: posts grouped by topic tag, aggregated and ranked.

use std::collections::{BTreeSet, HashMap};

use mindshare_core::{CanonicalPost, NarrativeAggregate, Trend};

use crate::sentiment::classify;

/// Strength at or above this trends up.
const TREND_UP_MIN: u8 = 60;
/// Strength at or below this trends down.
const TREND_DOWN_MAX: u8 = 30;

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

#[derive(Debug, Default)]
struct Bucket {
    tag: String,
    mention_count: usize,
    engagement_sum: u64,
    sentiment_sum: f64,
    sources: BTreeSet<String>,
    timestamps: Vec<i64>,
}

/// Group `posts` by tag and return the `top_n` strongest narratives.
///
/// Strength is relative: `round(100 * avg / max_avg)` across buckets, so the
/// bucket with the highest average engagement is always 100. When every
/// bucket averages zero they all share strength 100. Ties keep the order in
/// which tags were first seen. `now_ms` anchors the timeframe labels.
#[must_use]
pub fn extract_narratives(
    posts: &[CanonicalPost],
    top_n: usize,
    now_ms: i64,
) -> Vec<NarrativeAggregate> {
    let mut order: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<Bucket> = Vec::new();

    for post in posts {
        for tag in &post.tags {
            let idx = *order.entry(tag.as_str()).or_insert_with(|| {
                buckets.push(Bucket {
                    tag: tag.clone(),
                    ..Bucket::default()
                });
                buckets.len() - 1
            });
            let bucket = &mut buckets[idx];
            bucket.mention_count += 1;
            bucket.engagement_sum = bucket.engagement_sum.saturating_add(post.engagement());
            bucket.sentiment_sum += post.sentiment_raw.filter(|s| s.is_finite()).unwrap_or(0.0);
            bucket.sources.insert(post.platform.clone());
            bucket.timestamps.push(post.timestamp_ms);
        }
    }

    let averages: Vec<f64> = buckets.iter().map(average_engagement).collect();
    let max_avg = averages.iter().copied().fold(0.0_f64, f64::max);

    let mut narratives: Vec<NarrativeAggregate> = buckets
        .into_iter()
        .zip(averages)
        .map(|(bucket, avg)| {
            let strength = relative_strength(avg, max_avg);
            let latest = bucket.timestamps.iter().copied().max().unwrap_or(now_ms);
            #[allow(clippy::cast_precision_loss)]
            let avg_sentiment = bucket.sentiment_sum / bucket.mention_count as f64;
            NarrativeAggregate {
                mention_count: bucket.mention_count,
                total_engagement: bucket.engagement_sum,
                avg_engagement: avg,
                avg_sentiment_label: classify(Some(avg_sentiment)),
                sources: bucket.sources,
                timestamps: bucket.timestamps,
                strength,
                trend: trend_for(strength),
                timeframe_label: timeframe_label(now_ms.saturating_sub(latest)).to_string(),
                tag: bucket.tag,
            }
        })
        .collect();

    // sort_by is stable, so equal strengths keep first-seen order.
    narratives.sort_by(|a, b| b.strength.cmp(&a.strength));
    narratives.truncate(top_n);
    narratives
}

#[allow(clippy::cast_precision_loss)]
fn average_engagement(bucket: &Bucket) -> f64 {
    if bucket.mention_count == 0 {
        0.0
    } else {
        bucket.engagement_sum as f64 / bucket.mention_count as f64
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn relative_strength(avg: f64, max_avg: f64) -> u8 {
    if max_avg <= 0.0 {
        return 100;
    }
    (100.0 * avg / max_avg).round().clamp(0.0, 100.0) as u8
}

fn trend_for(strength: u8) -> Trend {
    if strength >= TREND_UP_MIN {
        Trend::Up
    } else if strength <= TREND_DOWN_MAX {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Coarse recency bucket for the age of a narrative's newest post.
#[must_use]
pub fn timeframe_label(age_ms: i64) -> &'static str {
    if age_ms < HOUR_MS {
        "last hour"
    } else if age_ms < DAY_MS {
        "last 24h"
    } else if age_ms < 7 * DAY_MS {
        "last 7d"
    } else {
        "older"
    }
}
