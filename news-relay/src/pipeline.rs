use crate::digest::{self, DEFAULT_LANGUAGE};
use crate::intake::{intake, IntakeReport};
use crate::judgment::{self, JudgmentRequest, DEFAULT_DESCRIPTION_LIMIT, DEFAULT_FOCUS};
use crate::llm_adapter::LlmAdapter;
use crate::pacing::Pacer;
use crate::publisher::{render, MessageLabels};
use crate::state::{ItemStore, TopicMemory};
use crate::traits::{Delivery, FeedSource, Publisher};
use crate::types::{ClusterSummary, FeedBatch, ItemId, Message, RawItem, Result, Topic};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

pub const DEFAULT_MAX_MESSAGES: usize = 15;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Upper bound on messages published per run
    pub max_messages: usize,
    pub description_limit: usize,
    pub focus: String,
    pub language: String,
    pub labels: MessageLabels,
    pub summarize_interval: Duration,
    pub send_interval: Duration,
    pub shuffle: bool,
    /// Fixed seed for the candidate shuffle; `None` draws from the OS
    pub shuffle_seed: Option<u64>,
    /// When false nothing is ever written back (dry runs)
    pub commit_state: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            description_limit: DEFAULT_DESCRIPTION_LIMIT,
            focus: DEFAULT_FOCUS.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            labels: MessageLabels::default(),
            summarize_interval: Duration::from_secs(1),
            send_interval: Duration::from_secs(2),
            shuffle: true,
            shuffle_seed: None,
            commit_state: true,
        }
    }
}

/// What happened during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub endpoints: usize,
    pub endpoints_failed: usize,
    pub intake: IntakeReport,
    pub judgment_failed: bool,
    pub clusters_kept: usize,
    pub summaries_failed: usize,
    pub attempted: usize,
    pub delivered: usize,
    pub delivery_failures: usize,
    pub links_committed: usize,
    pub topics_committed: usize,
    pub committed: bool,
}

/// Runs feeds through intake, judgment, summarization and delivery, and is
/// the only place that writes state back.
pub struct RelayPipeline {
    sources: Vec<Box<dyn FeedSource>>,
    llm: Arc<dyn LlmAdapter>,
    publisher: Arc<dyn Publisher>,
    item_store: ItemStore,
    topic_memory: TopicMemory,
    settings: PipelineSettings,
}

impl RelayPipeline {
    pub fn new(
        llm: Arc<dyn LlmAdapter>,
        publisher: Arc<dyn Publisher>,
        item_store: ItemStore,
        topic_memory: TopicMemory,
    ) -> Self {
        Self {
            sources: Vec::new(),
            llm,
            publisher,
            item_store,
            topic_memory,
            settings: PipelineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn add_source(&mut self, source: Box<dyn FeedSource>) {
        info!("Adding source to pipeline: {}", source.source_uri());
        self.sources.push(source);
    }

    pub fn with_source(mut self, source: Box<dyn FeedSource>) -> Self {
        self.add_source(source);
        self
    }

    pub fn item_store(&self) -> &ItemStore {
        &self.item_store
    }

    pub fn topic_memory(&self) -> &TopicMemory {
        &self.topic_memory
    }

    /// Execute one run as of `now`.
    ///
    /// Only a failure to write state back is returned as an error; every
    /// other failure shrinks what gets published and shows up in the report.
    pub async fn run(&mut self, now: DateTime<Utc>) -> Result<RunReport> {
        let span = info_span!("relay_run", run_id = %Uuid::new_v4());
        self.run_inner(now).instrument(span).await
    }

    async fn run_inner(&mut self, now: DateTime<Utc>) -> Result<RunReport> {
        let mut report = RunReport::default();

        let batches = self.ingest(&mut report).await;

        let (mut candidates, intake_report) = intake(batches, &self.item_store);
        report.intake = intake_report;
        if candidates.is_empty() {
            info!("No new candidates, nothing to do");
            return Ok(report);
        }

        if self.settings.shuffle {
            match self.settings.shuffle_seed {
                Some(seed) => candidates.shuffle(&mut StdRng::seed_from_u64(seed)),
                None => candidates.shuffle(&mut rand::thread_rng()),
            }
        }

        let recent_topics = self.topic_memory.load(now);

        let request = JudgmentRequest::new(&candidates, &recent_topics)
            .with_focus(&self.settings.focus)
            .with_description_limit(self.settings.description_limit);
        let judgment = match judgment::judge(self.llm.as_ref(), &request).await {
            Ok(judgment) => judgment,
            Err(_) => {
                report.judgment_failed = true;
                return Ok(report);
            }
        };

        let ranked = judgment::rank(judgment.clusters, self.settings.max_messages);
        report.clusters_kept = ranked.len();
        if ranked.is_empty() {
            info!("Judgment kept no clusters, nothing to publish");
            return Ok(report);
        }

        let by_id: HashMap<ItemId, &RawItem> = candidates.iter().map(|item| (item.id, item)).collect();

        let mut prepared: Vec<Message> = Vec::with_capacity(ranked.len());
        let mut summarize_pacer = Pacer::new("summaries", self.settings.summarize_interval);
        for cluster in &ranked {
            let members = digest::members(cluster, &by_id);
            summarize_pacer.wait().await;
            match digest::summarize(self.llm.as_ref(), &members, &self.settings.language).await {
                Ok(summary) => {
                    info!(
                        "Summarized cluster {:?} (priority {}): {}",
                        cluster.member_ids, cluster.priority, summary.title
                    );
                    prepared.push(digest::build_message(summary, &members));
                }
                Err(e) => {
                    warn!("Dropping cluster {:?}: {}", cluster.member_ids, e);
                    report.summaries_failed += 1;
                }
            }
        }

        let mut delivered_links: Vec<String> = Vec::new();
        let mut delivered_topics: Vec<ClusterSummary> = Vec::new();
        let mut send_pacer = Pacer::new("sends", self.settings.send_interval);
        for message in prepared {
            let text = render(&message, &self.settings.labels);
            send_pacer.wait().await;
            report.attempted += 1;
            match self.publisher.send(&text).await {
                Delivery::Delivered => {
                    info!("Published via {}: {}", self.publisher.publisher_name(), message.title);
                    report.delivered += 1;
                    delivered_links.extend(message.links().map(str::to_string));
                    delivered_topics.push(message.summary());
                }
                Delivery::Failed { diagnostic } => {
                    warn!("Delivery failed, will retry next run: {} ({})", message.title, diagnostic);
                    report.delivery_failures += 1;
                }
            }
        }

        info!(
            "Delivered {}/{} messages ({} summaries failed)",
            report.delivered, report.attempted, report.summaries_failed
        );

        if report.attempted > 0 && self.settings.commit_state {
            self.commit(&mut report, recent_topics, delivered_links, delivered_topics, now)?;
        }

        Ok(report)
    }

    async fn ingest(&mut self, report: &mut RunReport) -> Vec<FeedBatch> {
        let mut batches = Vec::with_capacity(self.sources.len());
        report.endpoints = self.sources.len();

        for source in &mut self.sources {
            match source.pull().await {
                Ok(batch) => batches.push(batch),
                Err(e) => {
                    warn!("Skipping feed {}: {}", source.source_uri(), e.redacted());
                    report.endpoints_failed += 1;
                }
            }
        }

        info!(
            "Pulled {}/{} feeds",
            report.endpoints - report.endpoints_failed,
            report.endpoints
        );
        batches
    }

    fn commit(
        &mut self,
        report: &mut RunReport,
        recent_topics: Vec<Topic>,
        delivered_links: Vec<String>,
        delivered_topics: Vec<ClusterSummary>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let links = self.item_store.merge(delivered_links);
        let topics = self.topic_memory.append(recent_topics, delivered_topics, now);

        match (links, topics) {
            (Ok(added), Ok(topics)) => {
                report.links_committed = added;
                report.topics_committed = topics.len();
                report.committed = true;
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                error!("Failed to persist run state: {}", e);
                Err(e)
            }
        }
    }
}
