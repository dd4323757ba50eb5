use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{label} timed out after {timeout_secs}s")]
    Timeout { label: String, timeout_secs: u64 },

    #[error("rate limited by search provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("search provider error: {0}")]
    Provider(String),

    #[error("search provider API key is not configured")]
    MissingApiKey,

    #[error("invalid search endpoint \"{url}\": {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("fetch pool is closed")]
    PoolClosed,
}

impl ScraperError {
    /// `true` when the upstream did not answer within the fetch deadline.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            ScraperError::Timeout { .. } => true,
            ScraperError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}
