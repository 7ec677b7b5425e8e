// Use the interfaces crate for core types
pub use interfaces::defs::{
    Cluster, ClusterSummary, Decision, FeedBatch, FeedEntry, ItemId, Message, RawItem, SourceRef,
    Topic, PRIORITY_MAX, PRIORITY_MIN,
};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
    pub min_host_interval_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "news-relay/0.1".to_string(),
            timeout_seconds: 30,
            max_retries: 2,
            retry_delay_seconds: 2,
            max_feed_size_mb: 10,
            max_redirects: 5,
            min_host_interval_ms: 1000,
        }
    }
}

#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<ParsedEntry>,
}

#[derive(Debug)]
pub struct ParsedEntry {
    pub url: String,
    pub title: String,
    pub description: String,
}

impl From<ParsedEntry> for FeedEntry {
    fn from(entry: ParsedEntry) -> Self {
        Self {
            title: entry.title,
            description: entry.description,
            link: entry.url,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("{service} returned HTTP {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} call timed out after {seconds}s")]
    Timeout { service: &'static str, seconds: u64 },

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Drop the request URL from HTTP errors before they reach logs or
    /// reports. Some endpoints carry credentials in the path.
    pub fn redacted(self) -> Self {
        match self {
            RelayError::Http(e) => RelayError::Http(e.without_url()),
            other => other,
        }
    }
}
