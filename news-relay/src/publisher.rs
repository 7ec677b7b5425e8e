//! Rendering of messages for Telegram's MarkdownV2 and the publishers that
//! deliver them.

use crate::traits::{Delivery, Publisher};
use crate::types::{Message, RelayError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

/// Characters MarkdownV2 reserves outside of code and link targets.
const RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        if RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Inside `(...)` of an inline link only `)` and `\` need escaping.
pub fn escape_link_target(url: &str) -> String {
    let mut escaped = String::with_capacity(url.len());
    for c in url.chars() {
        if c == ')' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone)]
pub struct MessageLabels {
    pub source: String,
    pub sources: String,
    pub read_original: String,
}

impl Default for MessageLabels {
    fn default() -> Self {
        Self {
            source: "Источник".to_string(),
            sources: "Источники".to_string(),
            read_original: "Читать оригинал".to_string(),
        }
    }
}

/// Render a message as MarkdownV2 text.
///
/// Single-source messages end with an inline source line and a link to the
/// original; multi-source messages end with a numbered source list.
pub fn render(message: &Message, labels: &MessageLabels) -> String {
    let mut text = format!(
        "*{}*\n\n{}\n\n",
        escape_markdown(&message.title),
        escape_markdown(&message.summary)
    );

    match message.sources.as_slice() {
        [] => {}
        [only] => {
            text.push_str(&format!(
                "{}: [{}]({})\n[{}]({})",
                escape_markdown(&labels.source),
                escape_markdown(&only.source_name),
                escape_link_target(&only.link),
                escape_markdown(&labels.read_original),
                escape_link_target(&only.link),
            ));
        }
        many => {
            text.push_str(&format!("{}:", escape_markdown(&labels.sources)));
            for (i, source) in many.iter().enumerate() {
                text.push_str(&format!(
                    "\n{}\\. [{}]({})",
                    i + 1,
                    escape_markdown(&source.source_name),
                    escape_link_target(&source.link),
                ));
            }
        }
    }

    text.trim_end().to_string()
}

#[derive(Serialize)]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct TelegramReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Publishes to a Telegram channel through the Bot API.
pub struct TelegramPublisher {
    base_url: String,
    token: String,
    channel_id: String,
    client: reqwest::Client,
}

impl TelegramPublisher {
    pub fn new(token: impl Into<String>, channel_id: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: DEFAULT_TELEGRAM_API.to_string(),
            token: token.into(),
            channel_id: channel_id.into(),
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn send_message(&self, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        let body = SendMessageBody {
            chat_id: &self.channel_id,
            text,
            parse_mode: "MarkdownV2",
            disable_web_page_preview: true,
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        let raw = response.text().await.unwrap_or_default();

        let reply: Option<TelegramReply> = serde_json::from_str(&raw).ok();
        match reply {
            Some(reply) if status.is_success() && reply.ok => Ok(()),
            Some(reply) => Err(RelayError::Api {
                service: "telegram",
                status: status.as_u16(),
                body: reply.description.unwrap_or(raw),
            }),
            None => Err(RelayError::Api {
                service: "telegram",
                status: status.as_u16(),
                body: raw,
            }),
        }
    }
}

#[async_trait]
impl Publisher for TelegramPublisher {
    fn publisher_name(&self) -> String {
        format!("telegram:{}", self.channel_id)
    }

    async fn send(&self, text: &str) -> Delivery {
        match self.send_message(text).await {
            Ok(()) => Delivery::Delivered,
            Err(e) => {
                // The request URL carries the bot token
                let e = e.redacted();
                warn!("Telegram delivery to {} failed: {}", self.channel_id, e);
                Delivery::Failed {
                    diagnostic: e.to_string(),
                }
            }
        }
    }
}

/// Logs rendered messages instead of sending them.
#[derive(Default)]
pub struct DryRunPublisher {
    sent: Mutex<Vec<String>>,
}

impl DryRunPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Publisher for DryRunPublisher {
    fn publisher_name(&self) -> String {
        "dry-run".to_string()
    }

    async fn send(&self, text: &str) -> Delivery {
        info!("[dry run] would publish:\n{}", text);
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(text.to_string());
        }
        Delivery::Delivered
    }
}
