use crate::types::{FeedBatch, Result};
use async_trait::async_trait;

/// Trait for pulling entries from one feed endpoint
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Endpoint identifier, used in logs
    fn source_uri(&self) -> String;

    /// Fetch the current entries. An error only affects this endpoint.
    async fn pull(&mut self) -> Result<FeedBatch>;
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Failed { diagnostic: String },
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered)
    }
}

/// Trait for chat destinations. Receives text already rendered for the
/// platform's markup.
#[async_trait]
pub trait Publisher: Send + Sync {
    fn publisher_name(&self) -> String;

    async fn send(&self, text: &str) -> Delivery;
}
