use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Run-local identifier handed out at intake.
pub type ItemId = u32;

pub const PRIORITY_MIN: u8 = 1;
pub const PRIORITY_MAX: u8 = 10;

/// One entry exactly as a feed reader produced it, before intake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub description: String,
    pub link: String,
}

/// Everything one feed endpoint yielded in a single pull.
#[derive(Clone, Debug)]
pub struct FeedBatch {
    pub source_uri: String,
    pub source_name: String,
    pub entries: Vec<FeedEntry>,
}

impl FeedBatch {
    pub fn empty(source_uri: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self {
            source_uri: source_uri.into(),
            source_name: source_name.into(),
            entries: Vec::new(),
        }
    }
}

/// A candidate that survived intake. `link` is the canonical form and the
/// durable identity of the item; `id` only means something inside one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawItem {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub link: String,
    pub source_name: String,
}

/// Memory of a published story, kept while it is inside the window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub title: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Keep,
    Discard,
}

/// One group of candidates judged to tell the same story.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cluster {
    pub member_ids: Vec<ItemId>,
    pub decision: Decision,
    pub priority: u8,
    pub rationale: String,
}

impl Cluster {
    pub fn is_kept(&self) -> bool {
        self.decision == Decision::Keep
    }
}

/// Headline and body produced for a cluster. Becomes both the published
/// message text and the topic remembered afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub title: String,
    pub summary: String,
}

impl ClusterSummary {
    pub fn into_topic(self, published_at: DateTime<Utc>) -> Topic {
        Topic {
            title: self.title,
            summary: self.summary,
            published_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceRef {
    pub source_name: String,
    pub link: String,
}

/// A message ready for rendering. `sources` keeps the cluster's member order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub title: String,
    pub summary: String,
    pub sources: Vec<SourceRef>,
}

impl Message {
    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|source| source.link.as_str())
    }

    pub fn is_multi_source(&self) -> bool {
        self.sources.len() > 1
    }

    pub fn summary(&self) -> ClusterSummary {
        ClusterSummary {
            title: self.title.clone(),
            summary: self.summary.clone(),
        }
    }
}
