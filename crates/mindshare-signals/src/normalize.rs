//! Normalization from raw feed shapes to canonical records.
//!
//! One normalizer per raw shape. Each resolves its fallback chains, coerces
//! counters, merges explicit tags with hashtags found in the text, and pins
//! the timestamp to epoch milliseconds. Records without an id are rejected;
//! batch helpers drop rejected records and keep going.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;

use mindshare_core::{CanonicalInfluencer, CanonicalPost, DEFAULT_PLATFORM};

use crate::error::ParseError;
use crate::types::{
    lenient, AccountRecord, CreatorRecord, RawInfluencer, RawPost, SocialPostRecord, TweetRecord,
};

/// Epoch values below this are seconds, at or above it milliseconds.
const EPOCH_MILLIS_THRESHOLD: f64 = 1e12;

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("valid hashtag regex"));

/// Normalizes one raw post.
///
/// `now_ms` stands in for missing or unreadable timestamps.
///
/// # Errors
///
/// Returns [`ParseError::MissingId`] if no id field is populated.
pub fn normalize_post(raw: RawPost, now_ms: i64) -> Result<CanonicalPost, ParseError> {
    match raw {
        RawPost::Social(record) => normalize_social_post(record, now_ms),
        RawPost::Tweet(record) => normalize_tweet(record, now_ms),
    }
}

/// Normalizes one raw influencer.
///
/// # Errors
///
/// Returns [`ParseError::MissingId`] if no id field is populated.
pub fn normalize_influencer(raw: RawInfluencer) -> Result<CanonicalInfluencer, ParseError> {
    match raw {
        RawInfluencer::Creator(record) => normalize_creator(record),
        RawInfluencer::Account(record) => normalize_account(record),
    }
}

/// Normalizes a batch, silently dropping records that fail.
pub fn normalize_posts(batch: Vec<RawPost>, now_ms: i64) -> Vec<CanonicalPost> {
    batch
        .into_iter()
        .filter_map(|raw| match normalize_post(raw, now_ms) {
            Ok(post) => Some(post),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed post");
                None
            }
        })
        .collect()
}

/// Normalizes a batch, silently dropping records that fail.
pub fn normalize_influencers(batch: Vec<RawInfluencer>) -> Vec<CanonicalInfluencer> {
    batch
        .into_iter()
        .filter_map(|raw| match normalize_influencer(raw) {
            Ok(influencer) => Some(influencer),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed influencer");
                None
            }
        })
        .collect()
}

fn normalize_social_post(record: SocialPostRecord, now_ms: i64) -> Result<CanonicalPost, ParseError> {
    let id = record.id.or(record.post_id).ok_or(ParseError::MissingId)?;

    let text = non_blank(record.text)
        .or_else(|| non_blank(record.title))
        .or_else(|| non_blank(record.post_title))
        .unwrap_or_default();

    let platform = record
        .platform
        .or(record.network)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_PLATFORM.to_string());

    let timestamp = record
        .created_at
        .as_ref()
        .or(record.post_created.as_ref())
        .or(record.timestamp.as_ref());

    let counters = record.counters.canonical();

    Ok(CanonicalPost {
        tags: collect_tags(record.tags.iter().map(String::as_str), &text),
        id,
        platform,
        author_id: record.author_id.or(record.creator_id).unwrap_or_default(),
        likes: counters.likes,
        shares: counters.shares,
        comments: counters.comments,
        interactions: counters.interactions,
        sentiment_raw: record.sentiment.or(record.post_sentiment),
        timestamp_ms: normalize_timestamp(timestamp, now_ms),
        text,
    })
}

/// Blank strings count as missing so fallback chains move on.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn normalize_tweet(record: TweetRecord, now_ms: i64) -> Result<CanonicalPost, ParseError> {
    let id = record.id.or(record.id_str).ok_or(ParseError::MissingId)?;
    let text = non_blank(record.full_text)
        .or_else(|| non_blank(record.text))
        .unwrap_or_default();

    let author = record.author.unwrap_or_default();
    let author_id = record
        .author_id
        .or(author.id)
        .or(author.username)
        .unwrap_or_default();

    // `public_metrics` is authoritative when present; older payloads put the
    // counters on the tweet itself.
    let counters = record
        .public_metrics
        .unwrap_or(record.counters)
        .canonical();

    let explicit: Vec<String> = record
        .entities
        .map(|e| e.hashtags.into_iter().filter_map(|h| h.tag).collect())
        .unwrap_or_default();

    Ok(CanonicalPost {
        tags: collect_tags(explicit.iter().map(String::as_str), &text),
        id,
        platform: "twitter".to_string(),
        author_id,
        likes: counters.likes,
        shares: counters.shares,
        comments: counters.comments,
        interactions: counters.interactions,
        sentiment_raw: record.sentiment,
        timestamp_ms: normalize_timestamp(record.created_at.as_ref(), now_ms),
        text,
    })
}

fn normalize_creator(record: CreatorRecord) -> Result<CanonicalInfluencer, ParseError> {
    let id = record
        .id
        .or(record.creator_id)
        .ok_or(ParseError::MissingId)?;

    let name = record
        .name
        .or(record.creator_name)
        .or(record.display_name)
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| id.clone());

    Ok(CanonicalInfluencer {
        name,
        avatar_url: record.avatar.or(record.creator_avatar),
        follower_count: record.followers.or(record.creator_followers).unwrap_or(0),
        interactions_24h: record.interactions_24h.unwrap_or(0),
        rank: record
            .rank
            .or(record.creator_rank)
            .map_or(0, |r| u32::try_from(r).unwrap_or(u32::MAX)),
        id,
    })
}

fn normalize_account(record: AccountRecord) -> Result<CanonicalInfluencer, ParseError> {
    let id = record.id.ok_or(ParseError::MissingId)?;

    let name = record
        .name
        .or(record.username)
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| id.clone());

    Ok(CanonicalInfluencer {
        name,
        avatar_url: record.profile_image_url,
        follower_count: record
            .public_metrics
            .and_then(|m| m.followers_count)
            .unwrap_or(0),
        interactions_24h: 0,
        rank: 0,
        id,
    })
}

/// Canonical tag form: lowercase with a single leading `#`. `None` if empty.
#[must_use]
pub fn canonical_tag(raw: &str) -> Option<String> {
    let bare = raw.trim().trim_start_matches('#').trim();
    if bare.is_empty() {
        return None;
    }
    Some(format!("#{}", bare.to_lowercase()))
}

/// Hashtags appearing in free text, in canonical form and in order of appearance.
pub fn extract_hashtags(text: &str) -> impl Iterator<Item = String> + '_ {
    HASHTAG_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| canonical_tag(m.as_str()))
}

fn collect_tags<'a>(explicit: impl Iterator<Item = &'a str>, text: &str) -> BTreeSet<String> {
    explicit
        .filter_map(canonical_tag)
        .chain(extract_hashtags(text))
        .collect()
}

/// Pins a raw timestamp to epoch milliseconds.
///
/// Numbers below 1e12 are epoch seconds, larger ones epoch milliseconds.
/// Strings are tried as numbers, then RFC 3339, RFC 2822, zone-less
/// `YYYY-MM-DD[(T| )HH:MM:SS[.fff]]` read as UTC. Anything else, including zero or negative
/// epochs, falls back to `now_ms`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn normalize_timestamp(value: Option<&Value>, now_ms: i64) -> i64 {
    let Some(value) = value else {
        return now_ms;
    };

    if let Some(n) = lenient::as_f64(value) {
        if n <= 0.0 {
            return now_ms;
        }
        let ms = if n < EPOCH_MILLIS_THRESHOLD { n * 1000.0 } else { n };
        return ms.round() as i64;
    }

    value
        .as_str()
        .and_then(|s| parse_date_string(s.trim()))
        .unwrap_or(now_ms)
}

fn parse_date_string(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp_millis());
    }
    // Twitter v1 style: "Wed Oct 10 20:19:24 +0000 2018"
    if let Ok(dt) = DateTime::parse_from_str(s, "%a %b %d %H:%M:%S %z %Y") {
        return Some(dt.timestamp_millis());
    }
    // Zone-less ISO 8601 and SQL-style datetimes are read as UTC.
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc().timestamp_millis());
    }
    None
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
