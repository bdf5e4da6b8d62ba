//! Feed source abstraction and multi-source collection.

mod fixed;
mod http;

pub use fixed::{PushReceiver, StaticFeedSource};
pub use http::HttpFeedSource;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use futures::stream::BoxStream;

use crate::error::{ChannelError, SourceError};
use crate::types::{RawInfluencer, RawPost};

/// An incremental batch delivered over a push channel.
#[derive(Debug, Clone)]
pub enum RawFeedBatch {
    Posts(Vec<RawPost>),
    Influencers(Vec<RawInfluencer>),
}

/// Stream of pushed batches. Ends when the transport closes.
pub type PushStream = BoxStream<'static, Result<RawFeedBatch, ChannelError>>;

/// A provider of raw posts and influencers.
///
/// Sources that only serve one feed return an empty batch for the other.
/// Push support is optional; without it the source is polled only.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    async fn fetch_recent_posts(&self, limit: usize) -> Result<Vec<RawPost>, SourceError>;

    async fn fetch_influencers(&self, limit: usize) -> Result<Vec<RawInfluencer>, SourceError>;

    /// Open a push channel, if the source has one.
    async fn subscribe(&self) -> Result<Option<PushStream>, ChannelError> {
        Ok(None)
    }
}

/// Records gathered from every source on one tick.
#[derive(Debug)]
pub(crate) struct Collected<T> {
    pub(crate) records: Vec<T>,
    pub(crate) succeeded: usize,
    pub(crate) failed: usize,
}

impl<T> Collected<T> {
    /// `true` when there were sources and none of them answered.
    pub(crate) fn all_failed(&self) -> bool {
        self.succeeded == 0 && self.failed > 0
    }
}

async fn with_timeout<T, F>(source_name: &str, timeout: Duration, fetch: F) -> Result<T, SourceError>
where
    F: Future<Output = Result<T, SourceError>>,
{
    tokio::time::timeout(timeout, fetch)
        .await
        .unwrap_or_else(|_| {
            Err(SourceError::Timeout {
                source_name: source_name.to_string(),
                after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        })
}

fn gather<T>(feed: &str, results: Vec<(&str, Result<Vec<T>, SourceError>)>) -> Collected<T> {
    let mut collected = Collected {
        records: Vec::new(),
        succeeded: 0,
        failed: 0,
    };

    for (source, result) in results {
        match result {
            Ok(records) => {
                tracing::debug!(source, feed, count = records.len(), "collected batch");
                collected.succeeded += 1;
                collected.records.extend(records);
            }
            Err(e) => {
                tracing::warn!(source, feed, error = %e, "source fetch failed");
                collected.failed += 1;
            }
        }
    }

    collected
}

/// Fetch recent posts from every source concurrently.
///
/// A failing or slow source contributes nothing; the others are unaffected.
/// Records keep source order, then per-source order.
pub(crate) async fn collect_posts(
    sources: &[Arc<dyn FeedSource>],
    limit: usize,
    timeout: Duration,
) -> Collected<RawPost> {
    let fetches = sources.iter().map(|source| async move {
        let result = with_timeout(source.name(), timeout, source.fetch_recent_posts(limit)).await;
        (source.name(), result)
    });
    gather("posts", join_all(fetches).await)
}

/// Fetch influencers from every source concurrently. See [`collect_posts`].
pub(crate) async fn collect_influencers(
    sources: &[Arc<dyn FeedSource>],
    limit: usize,
    timeout: Duration,
) -> Collected<RawInfluencer> {
    let fetches = sources.iter().map(|source| async move {
        let result = with_timeout(source.name(), timeout, source.fetch_influencers(limit)).await;
        (source.name(), result)
    });
    gather("influencers", join_all(fetches).await)
}
