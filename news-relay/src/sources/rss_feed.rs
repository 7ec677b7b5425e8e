use crate::traits::FeedSource;
use crate::types::{FeedBatch, FeedEntry, Result};
use crate::{FeedParser, Fetcher};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Generic RSS/Atom feed source
pub struct RssFeedSource {
    pub url: String,
    pub title: Option<String>,
    fetcher: Arc<Fetcher>,
}

impl RssFeedSource {
    pub fn new(url: String, fetcher: Arc<Fetcher>) -> Self {
        Self {
            url,
            title: None,
            fetcher,
        }
    }

    fn fallback_name(&self) -> String {
        // Extract domain name from URL as fallback
        url::Url::parse(&self.url)
            .ok()
            .and_then(|parsed| parsed.domain().map(|d| d.trim_start_matches("www.").to_string()))
            .unwrap_or_else(|| self.url.clone())
    }
}

#[async_trait]
impl FeedSource for RssFeedSource {
    fn source_uri(&self) -> String {
        self.url.clone()
    }

    async fn pull(&mut self) -> Result<FeedBatch> {
        info!("Pulling feed: {}", self.url);

        let content = self.fetcher.fetch_feed(&self.url).await?;
        let parsed_feed = FeedParser::parse_feed(&content)?;

        if self.title.is_none() {
            self.title = parsed_feed.title.clone();
        }
        let source_name = self.title.clone().unwrap_or_else(|| self.fallback_name());

        let entries: Vec<FeedEntry> = parsed_feed.entries.into_iter().map(FeedEntry::from).collect();
        info!("Pulled {} entries from {} ({})", entries.len(), source_name, self.url);

        Ok(FeedBatch {
            source_uri: self.url.clone(),
            source_name,
            entries,
        })
    }
}
