//! Background polling and push ingestion.
//!
//! Each feed (posts, influencers) gets its own poll loop on its own interval.
//! Loops tick only while the engine is visible; turning visible fetches at
//! once and restarts the interval. Every source with a push channel gets a
//! push loop that feeds incremental batches into the store and reconnects
//! after a delay when the channel drops. All loops stop on the shutdown
//! signal, cancelling whatever fetch is in flight.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use mindshare_core::EngineConfig;

use crate::error::ChannelError;
use crate::normalize::{normalize_influencers, normalize_posts};
use crate::sources::{collect_influencers, collect_posts, FeedSource, RawFeedBatch};
use crate::store::{FeedBatch, IngestionEvent, RollingStore};

/// Whether the consumer is currently looking at the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// The two polled collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Posts,
    Influencers,
}

impl Feed {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Feed::Posts => "posts",
            Feed::Influencers => "influencers",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receivers the loops listen on. Cloned into every spawned task.
#[derive(Debug, Clone)]
pub(crate) struct Signals {
    pub(crate) visibility: watch::Receiver<Visibility>,
    pub(crate) refresh: watch::Receiver<u64>,
    pub(crate) shutdown: watch::Receiver<bool>,
}

enum Trigger {
    Tick,
    Visibility,
    Manual,
}

pub(crate) struct Scheduler {
    sources: Vec<Arc<dyn FeedSource>>,
    store: RollingStore,
    config: EngineConfig,
}

impl Scheduler {
    pub(crate) fn new(
        sources: Vec<Arc<dyn FeedSource>>,
        store: RollingStore,
        config: EngineConfig,
    ) -> Self {
        Self {
            sources,
            store,
            config,
        }
    }

    /// Spawns both poll loops plus one push loop per source.
    pub(crate) fn spawn(self: &Arc<Self>, signals: &Signals) -> Vec<JoinHandle<()>> {
        let mut handles = vec![
            tokio::spawn(Arc::clone(self).poll_loop(
                Feed::Posts,
                self.config.fast_poll_interval(),
                signals.clone(),
            )),
            tokio::spawn(Arc::clone(self).poll_loop(
                Feed::Influencers,
                self.config.slow_poll_interval(),
                signals.clone(),
            )),
        ];

        for source in &self.sources {
            handles.push(tokio::spawn(
                Arc::clone(self).push_loop(Arc::clone(source), signals.shutdown.clone()),
            ));
        }

        handles
    }

    /// Fetches `feed` from every source and replaces that collection.
    ///
    /// Sources that fail contribute nothing. When every source fails the
    /// store is left untouched so the previous data stays visible, marked
    /// stale by its unchanged `last_updated`.
    pub(crate) async fn poll_once(&self, feed: Feed) {
        if self.sources.is_empty() {
            tracing::debug!(%feed, "scheduler: no sources configured; skipping poll");
            return;
        }

        let limit = self.config.fetch_limit;
        let timeout = self.config.request_timeout();
        let now_ms = Utc::now().timestamp_millis();

        let (batch, succeeded, failed) = match feed {
            Feed::Posts => {
                let collected = collect_posts(&self.sources, limit, timeout).await;
                if collected.all_failed() {
                    tracing::warn!(%feed, failed = collected.failed, "scheduler: every source failed; keeping previous data");
                    return;
                }
                let posts = normalize_posts(collected.records, now_ms);
                (FeedBatch::Posts(posts), collected.succeeded, collected.failed)
            }
            Feed::Influencers => {
                let collected = collect_influencers(&self.sources, limit, timeout).await;
                if collected.all_failed() {
                    tracing::warn!(%feed, failed = collected.failed, "scheduler: every source failed; keeping previous data");
                    return;
                }
                let influencers = normalize_influencers(collected.records);
                (
                    FeedBatch::Influencers(influencers),
                    collected.succeeded,
                    collected.failed,
                )
            }
        };

        tracing::info!(
            %feed,
            records = batch.len(),
            succeeded,
            failed,
            "scheduler: poll merged"
        );
        self.store.apply(IngestionEvent::Poll(batch));
    }

    async fn poll_loop(self: Arc<Self>, feed: Feed, period: Duration, mut signals: Signals) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            %feed,
            period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            "scheduler: poll loop started"
        );

        loop {
            let visible = *signals.visibility.borrow() == Visibility::Visible;

            let trigger = tokio::select! {
                biased;
                _ = signals.shutdown.changed() => break,
                changed = signals.visibility.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    Trigger::Visibility
                }
                changed = signals.refresh.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    Trigger::Manual
                }
                _ = ticker.tick(), if visible => Trigger::Tick,
            };

            let visible = *signals.visibility.borrow_and_update() == Visibility::Visible;
            match trigger {
                Trigger::Tick => {}
                Trigger::Visibility if visible => {
                    tracing::info!(%feed, "scheduler: visible; refreshing");
                    ticker.reset();
                }
                Trigger::Visibility => {
                    tracing::info!(%feed, "scheduler: hidden; polling suspended");
                    continue;
                }
                Trigger::Manual if visible => ticker.reset(),
                Trigger::Manual => {
                    tracing::debug!(%feed, "scheduler: refresh requested while hidden; ignoring");
                    continue;
                }
            }

            tokio::select! {
                biased;
                _ = signals.shutdown.changed() => break,
                () = self.poll_once(feed) => {}
            }
        }

        tracing::info!(%feed, "scheduler: poll loop stopped");
    }

    async fn push_loop(self: Arc<Self>, source: Arc<dyn FeedSource>, mut shutdown: watch::Receiver<bool>) {
        let delay = self.config.push_reconnect_delay();

        'session: loop {
            let subscribed = tokio::select! {
                biased;
                _ = shutdown.changed() => break 'session,
                subscribed = source.subscribe() => subscribed,
            };

            match subscribed {
                Ok(None) => {
                    tracing::debug!(source = source.name(), "scheduler: source has no push channel");
                    break 'session;
                }
                Ok(Some(mut stream)) => {
                    tracing::info!(source = source.name(), "scheduler: push channel open");
                    loop {
                        let next = tokio::select! {
                            biased;
                            _ = shutdown.changed() => break 'session,
                            next = stream.next() => next,
                        };
                        match next {
                            Some(Ok(batch)) => self.apply_push(source.name(), batch),
                            Some(Err(e)) => {
                                tracing::warn!(source = source.name(), error = %e, "scheduler: push channel failed");
                                break;
                            }
                            None => {
                                tracing::warn!(source = source.name(), error = %ChannelError::Closed, "scheduler: push channel failed");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(source = source.name(), error = %e, "scheduler: push subscribe failed");
                }
            }

            tokio::select! {
                biased;
                _ = shutdown.changed() => break 'session,
                () = tokio::time::sleep(delay) => {
                    tracing::info!(source = source.name(), "scheduler: reconnecting push channel");
                }
            }
        }

        tracing::debug!(source = source.name(), "scheduler: push loop stopped");
    }

    fn apply_push(&self, source: &str, batch: RawFeedBatch) {
        let batch = match batch {
            RawFeedBatch::Posts(raw) => {
                FeedBatch::Posts(normalize_posts(raw, Utc::now().timestamp_millis()))
            }
            RawFeedBatch::Influencers(raw) => FeedBatch::Influencers(normalize_influencers(raw)),
        };

        if batch.is_empty() {
            tracing::debug!(source, "scheduler: push batch empty after normalization");
            return;
        }

        tracing::debug!(source, records = batch.len(), "scheduler: push merged");
        self.store.apply(IngestionEvent::Push(batch));
    }
}
