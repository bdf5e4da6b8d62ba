//! The owned engine instance: one store, its sources, and the loops feeding it.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use mindshare_core::{
    ConfigError, EngineConfig, MindshareSnapshot, NarrativeAggregate, TrendingTopic,
};

use crate::mindshare::compute_mindshare;
use crate::narratives::extract_narratives;
use crate::scheduler::{Feed, Scheduler, Signals, Visibility};
use crate::sources::FeedSource;
use crate::store::{FeedState, IngestionEvent, RollingStore};
use crate::trending::trending_topics;

/// Aggregates posts and influencers from a set of sources and derives
/// mindshare, narrative and trending views on demand.
///
/// Engines share nothing; run one per tracked topic if needed. Reads never
/// fail. Before the first merge they return empty results with
/// `last_updated == None`.
pub struct SignalEngine {
    config: EngineConfig,
    store: RollingStore,
    scheduler: Arc<Scheduler>,
    visibility: watch::Sender<Visibility>,
    refresh: watch::Sender<u64>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SignalEngine {
    /// Builds an idle engine. Nothing is fetched until [`start`](Self::start)
    /// or [`refresh`](Self::refresh).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidKnob`] if `config` fails validation.
    pub fn new(
        config: EngineConfig,
        sources: Vec<Arc<dyn FeedSource>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let store = RollingStore::new(config.rolling_cap_size);
        let scheduler = Arc::new(Scheduler::new(sources, store.clone(), config.clone()));

        Ok(Self {
            config,
            store,
            scheduler,
            visibility: watch::Sender::new(Visibility::Visible),
            refresh: watch::Sender::new(0),
            shutdown: watch::Sender::new(false),
            tasks: Vec::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Spawns the poll and push loops. A no-op if already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.shutdown.send_replace(false);

        let signals = Signals {
            visibility: self.visibility.subscribe(),
            refresh: self.refresh.subscribe(),
            shutdown: self.shutdown.subscribe(),
        };
        self.tasks = self.scheduler.spawn(&signals);
        tracing::info!(tasks = self.tasks.len(), "engine started");
    }

    /// Suspends or resumes polling. Becoming visible refreshes immediately.
    pub fn set_visibility(&self, visibility: Visibility) {
        self.visibility.send_if_modified(|current| {
            if *current == visibility {
                false
            } else {
                *current = visibility;
                true
            }
        });
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        *self.visibility.borrow()
    }

    /// Asks the running poll loops to fetch now. Ignored while hidden.
    pub fn refresh_now(&self) {
        self.refresh.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    /// Polls both feeds once and waits for the merges, whether or not the
    /// loops are running.
    pub async fn refresh(&self) {
        tokio::join!(
            self.scheduler.poll_once(Feed::Posts),
            self.scheduler.poll_once(Feed::Influencers),
        );
    }

    /// Merges an externally produced event through the same path the loops use.
    pub fn ingest(&self, event: IngestionEvent) {
        self.store.apply(event);
    }

    /// Signals every loop to stop, cancelling in-flight fetches, and waits
    /// for them to finish. The store keeps its last state.
    pub async fn shutdown(&mut self) {
        if !self.is_running() {
            return;
        }
        self.shutdown.send_replace(true);

        for handle in self.tasks.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "engine task ended abnormally");
            }
        }
        tracing::info!("engine stopped");
    }

    /// Posts, influencers and the time of the last merge.
    #[must_use]
    pub fn get_snapshot(&self) -> Arc<FeedState> {
        self.store.snapshot()
    }

    #[must_use]
    pub fn get_mindshare_snapshot(&self) -> MindshareSnapshot {
        compute_mindshare(&self.store.snapshot(), Utc::now())
    }

    #[must_use]
    pub fn get_narratives(&self, top_n: usize) -> Vec<NarrativeAggregate> {
        let state = self.store.snapshot();
        extract_narratives(state.posts.snapshot(), top_n, Utc::now().timestamp_millis())
    }

    /// Narratives truncated to the configured `narrative_top_n`.
    #[must_use]
    pub fn narratives(&self) -> Vec<NarrativeAggregate> {
        self.get_narratives(self.config.narrative_top_n)
    }

    #[must_use]
    pub fn get_trending_topics(&self, top_n: usize) -> Vec<TrendingTopic> {
        trending_topics(self.store.snapshot().posts.snapshot(), top_n)
    }

    /// Trending topics truncated to the configured `trending_top_n`.
    #[must_use]
    pub fn trending(&self) -> Vec<TrendingTopic> {
        self.get_trending_topics(self.config.trending_top_n)
    }

    /// A receiver that wakes after every merge.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<FeedState>> {
        self.store.subscribe()
    }
}

impl Drop for SignalEngine {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
        for handle in &self.tasks {
            handle.abort();
        }
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
