//! Judgment contract: ask the model which candidates belong together and
//! which groups are worth publishing, then check the answer before anything
//! acts on it.

use crate::llm_adapter::{extract_json, LlmAdapter, LlmRequest, LlmTask};
use crate::types::{Cluster, Decision, ItemId, RawItem, Topic, PRIORITY_MAX, PRIORITY_MIN};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

pub const DEFAULT_DESCRIPTION_LIMIT: usize = 300;
pub const DEFAULT_FOCUS: &str = "technology, artificial intelligence and telecommunications";

/// Model output that does not honour the contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("protocol violation: {reason}")]
pub struct ProtocolViolation {
    pub reason: String,
}

impl ProtocolViolation {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Why a whole judgment batch was thrown away.
#[derive(Debug, thiserror::Error)]
pub enum JudgmentFailure {
    #[error("judgment call failed: {0}")]
    Transport(#[from] crate::types::RelayError),

    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),
}

/// Validated clusters plus the per-cluster violations that were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Judgment {
    pub clusters: Vec<Cluster>,
    pub rejected: Vec<ProtocolViolation>,
}

#[derive(Serialize)]
struct CandidateLine<'a> {
    id: ItemId,
    source: &'a str,
    title: &'a str,
    description: String,
}

pub struct JudgmentRequest<'a> {
    pub candidates: &'a [RawItem],
    pub recent_topics: &'a [Topic],
    pub focus: &'a str,
    pub description_limit: usize,
}

impl<'a> JudgmentRequest<'a> {
    pub fn new(candidates: &'a [RawItem], recent_topics: &'a [Topic]) -> Self {
        Self {
            candidates,
            recent_topics,
            focus: DEFAULT_FOCUS,
            description_limit: DEFAULT_DESCRIPTION_LIMIT,
        }
    }

    pub fn with_focus(mut self, focus: &'a str) -> Self {
        self.focus = focus;
        self
    }

    pub fn with_description_limit(mut self, limit: usize) -> Self {
        self.description_limit = limit;
        self
    }

    pub fn prompt(&self) -> String {
        let lines: Vec<CandidateLine<'_>> = self
            .candidates
            .iter()
            .map(|item| CandidateLine {
                id: item.id,
                source: &item.source_name,
                title: &item.title,
                description: truncate_chars(&item.description, self.description_limit),
            })
            .collect();
        let candidates_json = serde_json::to_string_pretty(&lines).unwrap_or_else(|_| "[]".to_string());

        let published = if self.recent_topics.is_empty() {
            "(nothing yet)".to_string()
        } else {
            self.recent_topics
                .iter()
                .map(|topic| format!("- {}: {}", topic.title, topic.summary))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            r#"You are the editor of a news channel about {focus}.

Stories the channel has ALREADY PUBLISHED recently:
{published}

Candidate news items (JSON):
{candidates_json}

Tasks:
1. Group candidates that describe the same underlying event into one cluster. Every id may appear in at most one cluster.
2. Mark a cluster KEEP only if it is relevant to {focus}, genuinely new, and not a repeat of an already published story. Otherwise mark it DISCARD.
3. Give every cluster a priority from {min} (minor) to {max} (major news).

Answer with JSON only, no prose, in exactly this shape:
{{"clusters": [{{"ids": [0, 3], "decision": "KEEP", "priority": 7, "reason": "short rationale"}}]}}"#,
            focus = self.focus,
            published = published,
            candidates_json = candidates_json,
            min = PRIORITY_MIN,
            max = PRIORITY_MAX,
        )
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JudgmentWire {
    Wrapped { clusters: Vec<ClusterWire> },
    Bare(Vec<ClusterWire>),
}

#[derive(Deserialize)]
struct ClusterWire {
    #[serde(default)]
    ids: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    decision: Option<String>,
    #[serde(default)]
    priority: Option<serde_json::Value>,
    #[serde(default, alias = "rationale")]
    reason: Option<String>,
}

/// Validate raw judgment output against the ids offered in the request.
///
/// Unparseable output fails the whole batch. A cluster that is empty, names
/// an id outside `candidate_ids`, reuses an id claimed by an earlier cluster,
/// or carries an unknown decision or out-of-range priority is rejected on its
/// own and reported in [`Judgment::rejected`].
pub fn parse_judgment(
    raw: &str,
    candidate_ids: &HashSet<ItemId>,
) -> std::result::Result<Judgment, ProtocolViolation> {
    let json = extract_json(raw).ok_or_else(|| ProtocolViolation::new("no JSON document in judgment output"))?;
    let wire: JudgmentWire = serde_json::from_str(json)
        .map_err(|e| ProtocolViolation::new(format!("judgment output is not valid cluster JSON: {}", e)))?;
    let wire_clusters = match wire {
        JudgmentWire::Wrapped { clusters } => clusters,
        JudgmentWire::Bare(clusters) => clusters,
    };

    let mut judgment = Judgment::default();
    let mut claimed: HashSet<ItemId> = HashSet::new();

    for (index, wire_cluster) in wire_clusters.into_iter().enumerate() {
        match validate_cluster(wire_cluster, candidate_ids, &claimed) {
            Ok(cluster) => {
                claimed.extend(cluster.member_ids.iter().copied());
                judgment.clusters.push(cluster);
            }
            Err(violation) => {
                warn!("Rejecting cluster #{}: {}", index, violation.reason);
                judgment.rejected.push(violation);
            }
        }
    }

    Ok(judgment)
}

fn validate_cluster(
    wire: ClusterWire,
    candidate_ids: &HashSet<ItemId>,
    claimed: &HashSet<ItemId>,
) -> std::result::Result<Cluster, ProtocolViolation> {
    let raw_ids = wire.ids.unwrap_or_default();
    if raw_ids.is_empty() {
        return Err(ProtocolViolation::new("cluster has no member ids"));
    }

    let mut member_ids: Vec<ItemId> = Vec::with_capacity(raw_ids.len());
    for value in raw_ids {
        let id = value
            .as_u64()
            .and_then(|id| ItemId::try_from(id).ok())
            .ok_or_else(|| ProtocolViolation::new(format!("member id {} is not a candidate id", value)))?;
        if !candidate_ids.contains(&id) {
            return Err(ProtocolViolation::new(format!("member id {} was not in the candidate batch", id)));
        }
        if claimed.contains(&id) {
            return Err(ProtocolViolation::new(format!("member id {} already belongs to another cluster", id)));
        }
        if !member_ids.contains(&id) {
            member_ids.push(id);
        }
    }

    let decision = match wire.decision.as_deref().map(str::trim) {
        Some(d) if d.eq_ignore_ascii_case("keep") => Decision::Keep,
        Some(d) if d.eq_ignore_ascii_case("discard") => Decision::Discard,
        other => {
            return Err(ProtocolViolation::new(format!("unknown decision {:?}", other)));
        }
    };

    let priority = wire
        .priority
        .as_ref()
        .and_then(serde_json::Value::as_u64)
        .and_then(|p| u8::try_from(p).ok())
        .filter(|p| (PRIORITY_MIN..=PRIORITY_MAX).contains(p))
        .ok_or_else(|| {
            ProtocolViolation::new(format!(
                "priority {:?} outside {}..={}",
                wire.priority, PRIORITY_MIN, PRIORITY_MAX
            ))
        })?;

    Ok(Cluster {
        member_ids,
        decision,
        priority,
        rationale: wire.reason.unwrap_or_default(),
    })
}

/// Kept clusters, highest priority first, at most `limit` of them.
///
/// The sort is stable: clusters with equal priority keep the order in which
/// the model returned them.
pub fn rank(clusters: Vec<Cluster>, limit: usize) -> Vec<Cluster> {
    let mut kept: Vec<Cluster> = clusters.into_iter().filter(Cluster::is_kept).collect();
    kept.sort_by(|a, b| b.priority.cmp(&a.priority));
    kept.truncate(limit);
    kept
}

/// Run one judgment call and validate it. Any failure here discards the
/// whole batch.
pub async fn judge(
    llm: &dyn LlmAdapter,
    request: &JudgmentRequest<'_>,
) -> std::result::Result<Judgment, JudgmentFailure> {
    let candidate_ids: HashSet<ItemId> = request.candidates.iter().map(|item| item.id).collect();

    info!(
        "Requesting judgment from {} for {} candidates ({} recent topics)",
        llm.adapter_name(),
        request.candidates.len(),
        request.recent_topics.len()
    );

    let raw = llm
        .generate(&LlmRequest {
            task: LlmTask::Judgment,
            prompt: request.prompt(),
        })
        .await
        .map_err(|e| {
            error!("Judgment call failed, discarding batch: {}", e);
            JudgmentFailure::Transport(e)
        })?;
    debug!("Raw judgment output: {}", raw);

    let judgment = parse_judgment(&raw, &candidate_ids).map_err(|violation| {
        error!("Judgment output rejected, discarding batch: {}", violation);
        JudgmentFailure::Protocol(violation)
    })?;

    info!(
        "Judgment returned {} valid clusters ({} rejected)",
        judgment.clusters.len(),
        judgment.rejected.len()
    );
    Ok(judgment)
}

/// Cut `text` to at most `limit` characters, marking the cut.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => format!("{}…", text[..byte_index].trim_end()),
        None => text.to_string(),
    }
}
