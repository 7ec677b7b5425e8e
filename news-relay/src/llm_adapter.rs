use crate::types::{RelayError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::debug;

/// What a generation request is for. Adapters may use it for logging or
/// routing; the prompt itself is complete either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmTask {
    Judgment,
    Summary,
}

#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub task: LlmTask,
    pub prompt: String,
}

/// Trait for generative language services.
///
/// Implementations return the model's raw text. Nothing returned here is
/// trusted: the judgment and summary validators decide what it means.
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    fn adapter_name(&self) -> String;

    async fn generate(&self, request: &LlmRequest) -> Result<String>;
}

/// Pull a JSON document out of model output that may wrap it in a markdown
/// fence or surround it with prose.
pub fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Some(trimmed);
    }

    if let Some(start) = text.find("```json") {
        let rest = &text[start + 7..];
        if let Some(end) = rest.find("```") {
            return Some(rest[..end].trim());
        }
    }

    if let Some(start) = text.find("```") {
        let rest = &text[start + 3..];
        if let Some(end) = rest.find("```") {
            return Some(rest[..end].trim());
        }
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&text[start..=end]),
        _ => None,
    }
}

/// Scripted adapter for development and testing.
///
/// Judgment replies are consumed in order. Summary replies are consumed in
/// order too; once they run out the adapter echoes the first `Title:` and
/// `Description:` lines of the prompt back as a summary.
#[derive(Default)]
pub struct MockLlmAdapter {
    name: String,
    judgments: Mutex<VecDeque<Result<String>>>,
    summaries: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_judgment(self, reply: impl Into<String>) -> Self {
        push(&self.judgments, Ok(reply.into()));
        self
    }

    pub fn with_judgment_error(self, reason: impl Into<String>) -> Self {
        push(&self.judgments, Err(RelayError::General(reason.into())));
        self
    }

    pub fn with_summary(self, reply: impl Into<String>) -> Self {
        push(&self.summaries, Ok(reply.into()));
        self
    }

    pub fn with_summary_error(self, reason: impl Into<String>) -> Self {
        push(&self.summaries, Err(RelayError::General(reason.into())));
        self
    }

    /// Next summary call fails the way a slow backend does.
    pub fn with_summary_timeout(self, seconds: u64) -> Self {
        push(&self.summaries, Err(RelayError::Timeout { service: "mock", seconds }));
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn echo_summary(prompt: &str) -> String {
        let line_after = |prefix: &str| {
            prompt
                .lines()
                .find_map(|line| line.trim().strip_prefix(prefix))
                .map(|rest| rest.trim().to_string())
        };
        let title = line_after("Title:").unwrap_or_else(|| "Untitled Item".to_string());
        let summary = line_after("Description:")
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| title.clone());

        serde_json::json!({ "title": title, "summary": summary }).to_string()
    }
}

fn push(queue: &Mutex<VecDeque<Result<String>>>, reply: Result<String>) {
    if let Ok(mut queue) = queue.lock() {
        queue.push_back(reply);
    }
}

fn pop(queue: &Mutex<VecDeque<Result<String>>>) -> Option<Result<String>> {
    queue.lock().ok().and_then(|mut queue| queue.pop_front())
}

#[async_trait]
impl LlmAdapter for MockLlmAdapter {
    fn adapter_name(&self) -> String {
        format!("Mock LLM Adapter ({})", self.name)
    }

    async fn generate(&self, request: &LlmRequest) -> Result<String> {
        debug!("Mock adapter received {:?} request", request.task);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match request.task {
            LlmTask::Judgment => pop(&self.judgments)
                .unwrap_or_else(|| Err(RelayError::General("no scripted judgment left".to_string()))),
            LlmTask::Summary => {
                pop(&self.summaries).unwrap_or_else(|| Ok(Self::echo_summary(&request.prompt)))
            }
        }
    }
}
