use thiserror::Error;

/// A single raw record that could not be normalized. Skipped, never fatal.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("record has no id")]
    MissingId,

    #[error("record could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One source's fetch failed; that source contributes an empty batch this tick.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{source_name} timed out after {after_ms}ms")]
    Timeout { source_name: String, after_ms: u64 },

    #[error("response from {url} is neither an array nor a {{\"data\": [...]}} envelope")]
    UnexpectedShape { url: String },

    #[error("invalid feed URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Push transport failure. The channel is treated as down until resubscribed.
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    #[error("push channel closed")]
    Closed,

    #[error("push transport error: {0}")]
    Transport(String),
}
