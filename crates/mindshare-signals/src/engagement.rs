//! Engagement totals, averages, and log-compressed scaling.

use serde::Deserialize;

use mindshare_core::CanonicalPost;

use crate::types::lenient;

/// Every engagement counter a provider might populate.
///
/// Providers fill different subsets; absent counters count as zero.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngagementCounters {
    #[serde(default, deserialize_with = "lenient::count")]
    pub engagement: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub engagement_score: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub likes: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub like_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub retweets: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub retweet_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub quote_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub shares: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub comments: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub reply_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub interactions_24h: Option<u64>,
}

/// Counters folded into the four canonical buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanonicalCounters {
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
    pub interactions: u64,
}

fn sum(values: &[Option<u64>]) -> u64 {
    values
        .iter()
        .flatten()
        .fold(0u64, |acc, v| acc.saturating_add(*v))
}

impl EngagementCounters {
    /// Sum of whichever counters are present.
    #[must_use]
    pub fn total(&self) -> u64 {
        let c = self.canonical();
        c.likes
            .saturating_add(c.shares)
            .saturating_add(c.comments)
            .saturating_add(c.interactions)
    }

    /// Fold provider-specific counters into likes/shares/comments/interactions.
    ///
    /// The canonical sum always equals [`EngagementCounters::total`].
    #[must_use]
    pub fn canonical(&self) -> CanonicalCounters {
        CanonicalCounters {
            likes: sum(&[self.likes, self.like_count]),
            shares: sum(&[
                self.shares,
                self.retweets,
                self.retweet_count,
                self.quote_count,
            ]),
            comments: sum(&[self.comments, self.reply_count]),
            interactions: sum(&[
                self.engagement,
                self.engagement_score,
                self.interactions_24h,
            ]),
        }
    }
}

/// Anything that carries an engagement total.
pub trait Engaged {
    fn engagement(&self) -> u64;
}

impl Engaged for CanonicalPost {
    fn engagement(&self) -> u64 {
        CanonicalPost::engagement(self)
    }
}

impl Engaged for EngagementCounters {
    fn engagement(&self) -> u64 {
        self.total()
    }
}

/// `clamp(log10(1 + n) * k, 0, 100)`.
///
/// Compresses heavy-tailed counts onto the same 0-100 range as percentages.
#[must_use]
pub fn log_scaled(n: f64, k: f64) -> f64 {
    let v = (1.0 + n.max(0.0)).log10() * k;
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(0.0, 100.0)
}

/// Engagement totals over a set of records.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngagementAggregate {
    pub total: u64,
    pub count: usize,
}

impl EngagementAggregate {
    #[must_use]
    pub fn over<'a, T, I>(records: I) -> Self
    where
        T: Engaged + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        records
            .into_iter()
            .fold(Self::default(), |acc, record| Self {
                total: acc.total.saturating_add(record.engagement()),
                count: acc.count + 1,
            })
    }

    /// Mean engagement per record; 0 for an empty set.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total as f64 / self.count as f64
        }
    }

    /// [`log_scaled`] applied to the per-record average.
    #[must_use]
    pub fn scaled(&self, k: f64) -> f64 {
        log_scaled(self.average(), k)
    }
}
