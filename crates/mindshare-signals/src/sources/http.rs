//! JSON-over-HTTP feed source.
//!
//! Each endpoint returns either a bare array of records or a `{"data": [...]}`
//! envelope. Records are decoded one at a time so a single malformed entry
//! never sinks the rest of the batch.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

use super::FeedSource;
use crate::error::SourceError;
use crate::types::{InfluencerShape, PostShape, RawInfluencer, RawPost};

const USER_AGENT: &str = "mindshare/0.1 (signal-aggregation)";

#[derive(Debug, Clone)]
struct Endpoint<S> {
    url: Url,
    shape: S,
}

/// Polls posts and influencers from plain JSON endpoints.
///
/// Either endpoint may be omitted; the matching fetch then yields an empty
/// batch.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    name: String,
    client: Client,
    posts: Option<Endpoint<PostShape>>,
    influencers: Option<Endpoint<InfluencerShape>>,
}

impl HttpFeedSource {
    /// Creates a source with no endpoints configured.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(name: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            name: name.into(),
            client,
            posts: None,
            influencers: None,
        })
    }

    /// Sets the endpoint serving recent posts.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidUrl`] if `url` does not parse.
    pub fn with_posts_url(mut self, url: &str, shape: PostShape) -> Result<Self, SourceError> {
        self.posts = Some(Endpoint {
            url: parse_url(url)?,
            shape,
        });
        Ok(self)
    }

    /// Sets the endpoint serving influencers.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidUrl`] if `url` does not parse.
    pub fn with_influencers_url(
        mut self,
        url: &str,
        shape: InfluencerShape,
    ) -> Result<Self, SourceError> {
        self.influencers = Some(Endpoint {
            url: parse_url(url)?,
            shape,
        });
        Ok(self)
    }

    fn build_url(base: &Url, limit: usize) -> Url {
        let mut url = base.clone();
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        url
    }

    /// Sends a GET, checks for a 2xx status and returns the record array.
    async fn request_records(&self, url: &Url) -> Result<Vec<Value>, SourceError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
            context: url.to_string(),
            source: e,
        })?;

        unwrap_records(value).ok_or_else(|| SourceError::UnexpectedShape {
            url: url.to_string(),
        })
    }
}

fn parse_url(url: &str) -> Result<Url, SourceError> {
    Url::parse(url).map_err(|e| SourceError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Accepts `[...]` or `{"data": [...]}`.
fn unwrap_records(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_recent_posts(&self, limit: usize) -> Result<Vec<RawPost>, SourceError> {
        let Some(endpoint) = &self.posts else {
            return Ok(Vec::new());
        };
        let url = Self::build_url(&endpoint.url, limit);
        let records = self.request_records(&url).await?;

        let posts = records
            .into_iter()
            .filter_map(|value| match RawPost::decode(endpoint.shape, value) {
                Ok(post) => Some(post),
                Err(e) => {
                    tracing::debug!(source = %self.name, error = %e, "skipping undecodable post");
                    None
                }
            })
            .collect();
        Ok(posts)
    }

    async fn fetch_influencers(&self, limit: usize) -> Result<Vec<RawInfluencer>, SourceError> {
        let Some(endpoint) = &self.influencers else {
            return Ok(Vec::new());
        };
        let url = Self::build_url(&endpoint.url, limit);
        let records = self.request_records(&url).await?;

        let influencers = records
            .into_iter()
            .filter_map(|value| match RawInfluencer::decode(endpoint.shape, value) {
                Ok(influencer) => Some(influencer),
                Err(e) => {
                    tracing::debug!(source = %self.name, error = %e, "skipping undecodable influencer");
                    None
                }
            })
            .collect();
        Ok(influencers)
    }
}
