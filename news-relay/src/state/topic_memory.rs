use super::{read_json_or_default, write_json_atomic};
use crate::types::{ClusterSummary, Result, Topic};
use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_WINDOW_DAYS: u32 = 3;

/// Recently published topics, kept for a rolling window.
///
/// Expiry happens on every load and every save, so the file stays bounded
/// even when runs are irregular and no separate cleanup is needed.
#[derive(Debug, Clone)]
pub struct TopicMemory {
    path: PathBuf,
    window: Duration,
}

impl TopicMemory {
    pub fn new(path: impl Into<PathBuf>, window_days: u32) -> Self {
        Self::with_window(path, Duration::days(i64::from(window_days)))
    }

    pub fn with_window(path: impl Into<PathBuf>, window: Duration) -> Self {
        Self {
            path: path.into(),
            window,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn is_fresh(&self, topic: &Topic, now: DateTime<Utc>) -> bool {
        topic.published_at > now - self.window
    }

    /// Topics published within the window ending at `now`, in stored order.
    pub fn load(&self, now: DateTime<Utc>) -> Vec<Topic> {
        let stored: Vec<Topic> = read_json_or_default(&self.path, "topic memory");
        let total = stored.len();
        let fresh: Vec<Topic> = stored.into_iter().filter(|t| self.is_fresh(t, now)).collect();

        debug!(
            "Loaded {} recent topics from {} ({} expired)",
            fresh.len(),
            self.path.display(),
            total - fresh.len()
        );
        fresh
    }

    /// Stamp `new_topics` with `now`, append them after `existing`, drop
    /// anything outside the window and persist. Returns what was written.
    pub fn append(
        &self,
        existing: Vec<Topic>,
        new_topics: Vec<ClusterSummary>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Topic>> {
        let added = new_topics.len();
        let topics: Vec<Topic> = existing
            .into_iter()
            .chain(new_topics.into_iter().map(|summary| summary.into_topic(now)))
            .filter(|t| self.is_fresh(t, now))
            .collect();

        write_json_atomic(&self.path, &topics)?;

        info!("Topic memory now holds {} topics ({} new)", topics.len(), added);
        Ok(topics)
    }
}
