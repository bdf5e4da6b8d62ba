//! Social signal aggregation and scoring.
//!
//! Raw posts and influencer records are pulled (or pushed) from any number of
//! [`FeedSource`]s, normalized into canonical records, deduplicated into a
//! bounded most-recent-first [`RollingStore`], and turned into mindshare,
//! narrative and trending views on read. [`SignalEngine`] ties it together.

pub mod engagement;
pub mod engine;
pub mod error;
pub mod mindshare;
pub mod narratives;
pub mod normalize;
pub mod scheduler;
pub mod sentiment;
pub mod sources;
pub mod store;
pub mod trending;
pub mod types;

pub use engagement::{log_scaled, Engaged, EngagementAggregate, EngagementCounters};
pub use engine::SignalEngine;
pub use error::{ChannelError, ParseError, SourceError};
pub use mindshare::{compute_mindshare, MindshareInputs};
pub use narratives::extract_narratives;
pub use normalize::{normalize_influencer, normalize_influencers, normalize_post, normalize_posts};
pub use scheduler::{Feed, Visibility};
pub use sentiment::classify;
pub use sources::{
    FeedSource, HttpFeedSource, PushReceiver, PushStream, RawFeedBatch, StaticFeedSource,
};
pub use store::{
    FeedBatch, FeedState, IngestionEvent, Keyed, MergeStrategy, RollingCollection, RollingStore,
};
pub use trending::trending_topics;
pub use types::{InfluencerShape, PostShape, RawInfluencer, RawPost};
