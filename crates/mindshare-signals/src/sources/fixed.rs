//! In-memory feed source.
//!
//! Serves a fixed set of records, optionally slowly or not at all, and can
//! hand out scripted push channels. Used by the CLI for offline fixture files
//! and throughout the scheduler tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;

use super::{FeedSource, PushStream, RawFeedBatch};
use crate::error::{ChannelError, SourceError};
use crate::types::{RawInfluencer, RawPost};

/// Receiving half of a scripted push channel.
pub type PushReceiver = mpsc::UnboundedReceiver<Result<RawFeedBatch, ChannelError>>;

#[derive(Debug, Default)]
pub struct StaticFeedSource {
    name: String,
    posts: Mutex<Vec<RawPost>>,
    influencers: Mutex<Vec<RawInfluencer>>,
    failing: bool,
    delay: Option<Duration>,
    push: Mutex<VecDeque<PushReceiver>>,
    post_fetches: AtomicUsize,
    influencer_fetches: AtomicUsize,
    subscriptions: AtomicUsize,
}

impl StaticFeedSource {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_posts(self, posts: Vec<RawPost>) -> Self {
        self.set_posts(posts);
        self
    }

    #[must_use]
    pub fn with_influencers(self, influencers: Vec<RawInfluencer>) -> Self {
        self.set_influencers(influencers);
        self
    }

    /// Every fetch fails with an unexpected-status error.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Every fetch sleeps for `delay` before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queues a push channel. Each `subscribe` call takes the next one.
    #[must_use]
    pub fn with_push(self, receiver: PushReceiver) -> Self {
        lock(&self.push).push_back(receiver);
        self
    }

    /// Replaces the posts served by later fetches.
    pub fn set_posts(&self, posts: Vec<RawPost>) {
        *lock(&self.posts) = posts;
    }

    pub fn set_influencers(&self, influencers: Vec<RawInfluencer>) {
        *lock(&self.influencers) = influencers;
    }

    pub fn post_fetches(&self) -> usize {
        self.post_fetches.load(Ordering::SeqCst)
    }

    pub fn influencer_fetches(&self) -> usize {
        self.influencer_fetches.load(Ordering::SeqCst)
    }

    pub fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    async fn respond<T: Clone>(&self, records: &Mutex<Vec<T>>, limit: usize) -> Result<Vec<T>, SourceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(SourceError::UnexpectedStatus {
                status: 503,
                url: format!("static://{}", self.name),
            });
        }
        Ok(lock(records).iter().take(limit).cloned().collect())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl FeedSource for StaticFeedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_recent_posts(&self, limit: usize) -> Result<Vec<RawPost>, SourceError> {
        self.post_fetches.fetch_add(1, Ordering::SeqCst);
        self.respond(&self.posts, limit).await
    }

    async fn fetch_influencers(&self, limit: usize) -> Result<Vec<RawInfluencer>, SourceError> {
        self.influencer_fetches.fetch_add(1, Ordering::SeqCst);
        self.respond(&self.influencers, limit).await
    }

    async fn subscribe(&self) -> Result<Option<PushStream>, ChannelError> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        let Some(receiver) = lock(&self.push).pop_front() else {
            return Ok(None);
        };
        let stream = futures::stream::unfold(receiver, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(Some(stream.boxed()))
    }
}
