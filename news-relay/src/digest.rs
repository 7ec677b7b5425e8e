use crate::judgment::ProtocolViolation;
use crate::llm_adapter::{extract_json, LlmAdapter, LlmRequest, LlmTask};
use crate::types::{Cluster, ClusterSummary, ItemId, Message, RawItem, RelayError, SourceRef};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

pub const DEFAULT_LANGUAGE: &str = "Russian";

#[derive(Debug, thiserror::Error)]
pub enum SummaryFailure {
    #[error("summary call failed: {0}")]
    Transport(#[from] RelayError),

    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),
}

/// Resolve a cluster's member ids to the run's candidates, in member order.
pub fn members<'a>(cluster: &Cluster, by_id: &HashMap<ItemId, &'a RawItem>) -> Vec<&'a RawItem> {
    cluster
        .member_ids
        .iter()
        .filter_map(|id| by_id.get(id).copied())
        .collect()
}

pub fn summary_prompt(members: &[&RawItem], language: &str) -> String {
    let content = members
        .iter()
        .map(|item| {
            format!(
                "Source: {}\nTitle: {}\nDescription: {}",
                item.source_name, item.title, item.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"The following news items all describe the same event:

{content}

Write a headline and a summary of 1-2 sentences in {language}. Pass on only the essential facts and merge what the sources say.

Answer with JSON only, in exactly this shape:
{{"title": "headline", "summary": "summary text"}}"#,
        content = content,
        language = language,
    )
}

#[derive(Deserialize)]
struct SummaryWire {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

/// Validate raw summary output. Both fields must be present and non-blank.
pub fn parse_summary(raw: &str) -> std::result::Result<ClusterSummary, ProtocolViolation> {
    let json = extract_json(raw).ok_or_else(|| ProtocolViolation::new("no JSON document in summary output"))?;
    let wire: SummaryWire = serde_json::from_str(json)
        .map_err(|e| ProtocolViolation::new(format!("summary output is not valid JSON: {}", e)))?;

    let field = |value: Option<String>, name: &str| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ProtocolViolation::new(format!("summary field '{}' is missing or empty", name)))
    };

    Ok(ClusterSummary {
        title: field(wire.title, "title")?,
        summary: field(wire.summary, "summary")?,
    })
}

/// Summarize one cluster. A failure only costs this cluster.
pub async fn summarize(
    llm: &dyn LlmAdapter,
    members: &[&RawItem],
    language: &str,
) -> std::result::Result<ClusterSummary, SummaryFailure> {
    let raw = llm
        .generate(&LlmRequest {
            task: LlmTask::Summary,
            prompt: summary_prompt(members, language),
        })
        .await?;
    debug!("Raw summary output: {}", raw);

    parse_summary(&raw).map_err(|violation| {
        warn!("Summary output rejected: {}", violation);
        SummaryFailure::Protocol(violation)
    })
}

pub fn build_message(summary: ClusterSummary, members: &[&RawItem]) -> Message {
    Message {
        title: summary.title,
        summary: summary.summary,
        sources: members
            .iter()
            .map(|item| SourceRef {
                source_name: item.source_name.clone(),
                link: item.link.clone(),
            })
            .collect(),
    }
}
