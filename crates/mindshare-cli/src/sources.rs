//! Builds the engine's feed sources from command line arguments.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, ValueEnum};
use mindshare_core::EngineConfig;
use mindshare_signals::{
    FeedSource, HttpFeedSource, InfluencerShape, PostShape, RawInfluencer, RawPost,
    StaticFeedSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub(crate) enum PostShapeArg {
    #[default]
    Social,
    Tweet,
}

impl From<PostShapeArg> for PostShape {
    fn from(arg: PostShapeArg) -> Self {
        match arg {
            PostShapeArg::Social => PostShape::Social,
            PostShapeArg::Tweet => PostShape::Tweet,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub(crate) enum InfluencerShapeArg {
    #[default]
    Creator,
    Account,
}

impl From<InfluencerShapeArg> for InfluencerShape {
    fn from(arg: InfluencerShapeArg) -> Self {
        match arg {
            InfluencerShapeArg::Creator => InfluencerShape::Creator,
            InfluencerShapeArg::Account => InfluencerShape::Account,
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub(crate) struct SourceArgs {
    /// Endpoint returning recent posts as JSON.
    #[arg(long, env = "MINDSHARE_POSTS_URL", global = true)]
    pub(crate) posts_url: Option<String>,

    #[arg(long, value_enum, default_value_t, global = true)]
    pub(crate) posts_shape: PostShapeArg,

    /// Endpoint returning influencers as JSON.
    #[arg(long, env = "MINDSHARE_INFLUENCERS_URL", global = true)]
    pub(crate) influencers_url: Option<String>,

    #[arg(long, value_enum, default_value_t, global = true)]
    pub(crate) influencers_shape: InfluencerShapeArg,

    /// JSON file with `posts` and `influencers` arrays, served as an extra source.
    #[arg(long, global = true)]
    pub(crate) fixture: Option<PathBuf>,
}

impl SourceArgs {
    pub(crate) fn is_empty(&self) -> bool {
        self.posts_url.is_none() && self.influencers_url.is_none() && self.fixture.is_none()
    }
}

/// One HTTP source for the configured URLs plus one static source per fixture.
pub(crate) fn build_sources(
    args: &SourceArgs,
    config: &EngineConfig,
) -> anyhow::Result<Vec<Arc<dyn FeedSource>>> {
    let mut sources: Vec<Arc<dyn FeedSource>> = Vec::new();

    if args.posts_url.is_some() || args.influencers_url.is_some() {
        let mut http = HttpFeedSource::new("http", config.request_timeout())?;
        if let Some(url) = &args.posts_url {
            http = http.with_posts_url(url, args.posts_shape.into())?;
        }
        if let Some(url) = &args.influencers_url {
            http = http.with_influencers_url(url, args.influencers_shape.into())?;
        }
        sources.push(Arc::new(http));
    }

    if let Some(path) = &args.fixture {
        let fixture = load_fixture(path, args.posts_shape.into(), args.influencers_shape.into())?;
        sources.push(Arc::new(fixture));
    }

    Ok(sources)
}

fn load_fixture(
    path: &Path,
    post_shape: PostShape,
    influencer_shape: InfluencerShape,
) -> anyhow::Result<StaticFeedSource> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&body)
        .with_context(|| format!("fixture {} is not valid JSON", path.display()))?;

    let posts = records(&value, "posts")
        .filter_map(|v| match RawPost::decode(post_shape, v) {
            Ok(post) => Some(post),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping undecodable fixture post");
                None
            }
        })
        .collect::<Vec<_>>();
    let influencers = records(&value, "influencers")
        .filter_map(|v| match RawInfluencer::decode(influencer_shape, v) {
            Ok(influencer) => Some(influencer),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping undecodable fixture influencer");
                None
            }
        })
        .collect::<Vec<_>>();

    tracing::info!(
        path = %path.display(),
        posts = posts.len(),
        influencers = influencers.len(),
        "loaded fixture"
    );

    Ok(StaticFeedSource::new(format!("fixture:{}", path.display()))
        .with_posts(posts)
        .with_influencers(influencers))
}

fn records(value: &serde_json::Value, key: &str) -> impl Iterator<Item = serde_json::Value> {
    value
        .get(key)
        .and_then(serde_json::Value::as_array)
        .cloned()
        .unwrap_or_default()
        .into_iter()
}
