use crate::traits::FeedSource;
use crate::types::{FeedBatch, FeedEntry, RelayError, Result};
use async_trait::async_trait;

/// Source that replays a fixed batch, or a fixed failure. Useful for fixtures
/// and for exercising the pipeline without network access.
pub struct StaticFeedSource {
    uri: String,
    name: String,
    entries: Vec<FeedEntry>,
    failure: Option<String>,
}

impl StaticFeedSource {
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            entries: Vec::new(),
            failure: None,
        }
    }

    pub fn with_entry(mut self, title: &str, description: &str, link: &str) -> Self {
        self.entries.push(FeedEntry {
            title: title.to_string(),
            description: description.to_string(),
            link: link.to_string(),
        });
        self
    }

    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }
}

#[async_trait]
impl FeedSource for StaticFeedSource {
    fn source_uri(&self) -> String {
        self.uri.clone()
    }

    async fn pull(&mut self) -> Result<FeedBatch> {
        if let Some(reason) = &self.failure {
            return Err(RelayError::General(reason.clone()));
        }
        Ok(FeedBatch {
            source_uri: self.uri.clone(),
            source_name: self.name.clone(),
            entries: self.entries.clone(),
        })
    }
}
