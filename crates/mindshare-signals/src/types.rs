//! Raw feed payload shapes.
//!
//! Upstream providers do not agree on field names or types, so each known
//! shape gets its own struct and every field is optional. Numeric fields go
//! through [`lenient`] so numbers, numeric strings, and nulls all decode; a
//! value that cannot be read as a number is treated as absent.
//!
//! Fallback chains (which field wins when several are present) live in
//! [`crate::normalize`], one normalizer per shape.

use serde::Deserialize;

use crate::engagement::EngagementCounters;
use crate::error::ParseError;

/// Which post shape a source emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostShape {
    /// Social-listening aggregator rows (`post_title`, `creator_id`, `interactions_24h`...).
    #[default]
    Social,
    /// Twitter/X style objects (`public_metrics`, `entities.hashtags`...).
    Tweet,
}

/// Which influencer shape a source emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InfluencerShape {
    /// Creator-directory rows (`creator_name`, `creator_followers`, `creator_rank`...).
    #[default]
    Creator,
    /// Twitter/X user objects (`username`, `public_metrics.followers_count`...).
    Account,
}

/// A post payload as delivered by a source, before normalization.
#[derive(Debug, Clone)]
pub enum RawPost {
    Social(SocialPostRecord),
    Tweet(TweetRecord),
}

impl RawPost {
    /// Decode one JSON element as the given shape.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Decode`] if the element is not an object of that shape.
    pub fn decode(shape: PostShape, value: serde_json::Value) -> Result<Self, ParseError> {
        Ok(match shape {
            PostShape::Social => Self::Social(serde_json::from_value(value)?),
            PostShape::Tweet => Self::Tweet(serde_json::from_value(value)?),
        })
    }
}

/// An influencer payload as delivered by a source, before normalization.
#[derive(Debug, Clone)]
pub enum RawInfluencer {
    Creator(CreatorRecord),
    Account(AccountRecord),
}

impl RawInfluencer {
    /// Decode one JSON element as the given shape.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Decode`] if the element is not an object of that shape.
    pub fn decode(shape: InfluencerShape, value: serde_json::Value) -> Result<Self, ParseError> {
        Ok(match shape {
            InfluencerShape::Creator => Self::Creator(serde_json::from_value(value)?),
            InfluencerShape::Account => Self::Account(serde_json::from_value(value)?),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SocialPostRecord {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::id")]
    pub post_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub post_title: Option<String>,
    #[serde(default, deserialize_with = "lenient::tags")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient::id")]
    pub author_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::id")]
    pub creator_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub platform: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub network: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub sentiment: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub post_sentiment: Option<f64>,
    #[serde(default)]
    pub created_at: Option<serde_json::Value>,
    #[serde(default)]
    pub post_created: Option<serde_json::Value>,
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
    #[serde(flatten)]
    pub counters: EngagementCounters,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TweetRecord {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::id")]
    pub id_str: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub full_text: Option<String>,
    #[serde(default, deserialize_with = "lenient::id")]
    pub author_id: Option<String>,
    #[serde(default)]
    pub author: Option<TweetAuthor>,
    #[serde(default)]
    pub created_at: Option<serde_json::Value>,
    #[serde(default)]
    pub entities: Option<TweetEntities>,
    #[serde(default)]
    pub public_metrics: Option<EngagementCounters>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub sentiment: Option<f64>,
    #[serde(flatten)]
    pub counters: EngagementCounters,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TweetAuthor {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TweetEntities {
    #[serde(default)]
    pub hashtags: Vec<TweetHashtag>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TweetHashtag {
    #[serde(default, alias = "text", deserialize_with = "lenient::text")]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatorRecord {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::id")]
    pub creator_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub creator_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub creator_avatar: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub followers: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub creator_followers: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub interactions_24h: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub rank: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub creator_rank: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountRecord {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub public_metrics: Option<AccountMetrics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountMetrics {
    #[serde(default, deserialize_with = "lenient::count")]
    pub followers_count: Option<u64>,
}

/// Forgiving field decoders. None of these fail; unreadable values become `None`.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Read a JSON value as a finite float.
    pub(crate) fn as_f64(value: &Value) -> Option<f64> {
        let n = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        n.is_finite().then_some(n)
    }

    pub(crate) fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(as_f64))
    }

    /// Non-negative counts; fractional values are truncated.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(crate) fn count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(as_f64)
            .filter(|n| *n >= 0.0)
            .map(|n| n as u64))
    }

    /// Ids arrive as strings or integers; blank strings count as missing.
    pub(crate) fn id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    pub(crate) fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    /// A list of strings, or a single comma-separated string.
    pub(crate) fn tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        })
    }
}
