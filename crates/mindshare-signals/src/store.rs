//! Bounded, deduplicated, most-recent-first record store.
//!
//! The store is the only place records are mutated. Every ingestion trigger
//! becomes an [`IngestionEvent`]; [`RollingStore::apply`] reduces it against
//! the current [`FeedState`] into a fresh state and swaps that in as one
//! step, so readers only ever see whole states.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use mindshare_core::{CanonicalInfluencer, CanonicalPost};

/// Records that carry a stable identity.
pub trait Keyed {
    fn key(&self) -> &str;

    /// Ordering key for full replacements; larger is newer. Records without
    /// a time keep their batch order.
    fn recency(&self) -> i64 {
        0
    }
}

impl Keyed for CanonicalPost {
    fn key(&self) -> &str {
        &self.id
    }

    fn recency(&self) -> i64 {
        self.timestamp_ms
    }
}

impl Keyed for CanonicalInfluencer {
    fn key(&self) -> &str {
        &self.id
    }
}

/// How a batch combines with what is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Full replacement: the batch becomes the collection.
    Poll,
    /// Incremental: the batch is prepended and older duplicates dropped.
    Push,
}

/// Ordered, id-unique, capped sequence. Index 0 is the newest record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RollingCollection<T> {
    items: Vec<T>,
}

impl<T> Default for RollingCollection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Keyed + Clone> RollingCollection<T> {
    /// Returns the collection that results from merging `batch` into `self`.
    ///
    /// Poll batches are first ordered newest-first by [`Keyed::recency`]
    /// (stable, so equal times keep batch order). Push batches are taken as
    /// given. Both strategies then keep the first occurrence of each id and
    /// trim to `cap`, so the cap always drops the oldest records.
    #[must_use]
    pub fn merge(&self, batch: Vec<T>, strategy: MergeStrategy, cap: usize) -> Self {
        let combined: Vec<T> = match strategy {
            MergeStrategy::Poll => {
                let mut batch = batch;
                batch.sort_by_key(|item| Reverse(item.recency()));
                batch
            }
            MergeStrategy::Push => batch.into_iter().chain(self.items.iter().cloned()).collect(),
        };

        let mut seen: HashSet<String> = HashSet::with_capacity(combined.len());
        let items = combined
            .into_iter()
            .filter(|item| seen.insert(item.key().to_string()))
            .take(cap)
            .collect();

        Self { items }
    }
}

impl<T> RollingCollection<T> {
    #[must_use]
    pub fn snapshot(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a RollingCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A normalized batch for one collection.
#[derive(Debug, Clone)]
pub enum FeedBatch {
    Posts(Vec<CanonicalPost>),
    Influencers(Vec<CanonicalInfluencer>),
}

impl FeedBatch {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            FeedBatch::Posts(p) => p.len(),
            FeedBatch::Influencers(i) => i.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One ingestion trigger, tagged with its merge policy.
#[derive(Debug, Clone)]
pub enum IngestionEvent {
    Poll(FeedBatch),
    Push(FeedBatch),
}

impl IngestionEvent {
    #[must_use]
    pub fn strategy(&self) -> MergeStrategy {
        match self {
            IngestionEvent::Poll(_) => MergeStrategy::Poll,
            IngestionEvent::Push(_) => MergeStrategy::Push,
        }
    }
}

/// Everything the store holds at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedState {
    pub posts: RollingCollection<CanonicalPost>,
    pub influencers: RollingCollection<CanonicalInfluencer>,
    /// Time of the last applied merge; `None` until the first one.
    pub last_updated: Option<DateTime<Utc>>,
}

impl FeedState {
    /// Pure reducer: the state after applying `event`.
    #[must_use]
    pub fn apply(&self, event: IngestionEvent, cap: usize, now: DateTime<Utc>) -> Self {
        let strategy = event.strategy();
        let batch = match event {
            IngestionEvent::Poll(batch) | IngestionEvent::Push(batch) => batch,
        };

        match batch {
            FeedBatch::Posts(posts) => Self {
                posts: self.posts.merge(posts, strategy, cap),
                influencers: self.influencers.clone(),
                last_updated: Some(now),
            },
            FeedBatch::Influencers(influencers) => Self {
                posts: self.posts.clone(),
                influencers: self.influencers.merge(influencers, strategy, cap),
                last_updated: Some(now),
            },
        }
    }
}

/// Owner of the current [`FeedState`].
///
/// Cloning the store clones the handle, not the data.
#[derive(Debug, Clone)]
pub struct RollingStore {
    state: Arc<watch::Sender<Arc<FeedState>>>,
    cap: usize,
}

impl RollingStore {
    #[must_use]
    pub fn new(cap: usize) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(FeedState::default()));
        Self {
            state: Arc::new(tx),
            cap,
        }
    }

    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Reduce `event` into the current state and publish the result.
    ///
    /// Concurrent callers are serialized; readers see the old state or the
    /// new one, never a mix.
    pub fn apply(&self, event: IngestionEvent) {
        let now = Utc::now();
        let cap = self.cap;
        self.state.send_modify(|current| {
            let next = current.apply(event, cap, now);
            *current = Arc::new(next);
        });
    }

    /// The current state. Cheap: clones an `Arc`.
    #[must_use]
    pub fn snapshot(&self) -> Arc<FeedState> {
        Arc::clone(&self.state.borrow())
    }

    /// A receiver that wakes on every applied merge.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<FeedState>> {
        self.state.subscribe()
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
