use crate::digest::DEFAULT_LANGUAGE;
use crate::gemini::DEFAULT_MODEL;
use crate::judgment::{DEFAULT_DESCRIPTION_LIMIT, DEFAULT_FOCUS};
use crate::pipeline::{PipelineSettings, DEFAULT_MAX_MESSAGES};
use crate::publisher::MessageLabels;
use crate::state::topic_memory::DEFAULT_WINDOW_DAYS;
use crate::types::{RelayError, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const PUBLISHED_LINKS_FILE: &str = "published_links.json";
pub const RECENT_TOPICS_FILE: &str = "recent_topics.json";

/// Feeds polled when none are configured.
pub const DEFAULT_FEEDS: &[&str] = &[
    "https://feeds.reuters.com/reuters/technologyNews",
    "https://feeds.bloomberg.com/technology/news.rss",
    "https://www.theverge.com/rss/index.xml",
    "http://feeds.arstechnica.com/arstechnica/index/",
    "https://www.technologyreview.com/topic/artificial-intelligence/feed/",
    "https://www.kdnuggets.com/feed",
    "https://www.analyticsinsight.net/feed/",
    "https://www.rcrwireless.com/feed",
    "http://feeds.feedburner.com/TeleGeographyBlog",
    "http://feeds.google.com/googleaiblog/",
    "https://openai.com/blog.rss",
    "https://blogs.nvidia.com/blog/category/artificial-intelligence/feed/",
    "https://a16z.com/feed/",
    "https://techcrunch.com/category/artificial-intelligence/feed/",
    "https://www.wired.com/feed/category/artificial-intelligence/latest/rss",
    "https://feeds.feedburner.com/Venturebeat/AI",
    "https://www.lightreading.com/rss_feed.asp",
    "https://www.fiercetelecom.com/rss.xml",
];

#[derive(Parser, Debug, Clone)]
#[command(
    name = "news-relay",
    about = "Pull news feeds, let Gemini pick and summarize stories, publish them to Telegram"
)]
pub struct Cli {
    /// Feed URL (repeatable)
    #[arg(long = "feed", value_name = "URL")]
    pub feeds: Vec<String>,

    /// File with one feed URL per line; `#` starts a comment
    #[arg(long, value_name = "PATH")]
    pub feeds_file: Option<PathBuf>,

    /// Directory holding the published-links and recent-topics files
    #[arg(long, value_name = "PATH", default_value = "state")]
    pub state_dir: PathBuf,

    /// Days a published topic keeps suppressing similar stories
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    pub window_days: u32,

    /// Maximum number of messages published per run
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGES)]
    pub max_messages: usize,

    /// Language summaries are written in
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    pub language: String,

    /// Subject area the judgment should favour
    #[arg(long, default_value = DEFAULT_FOCUS)]
    pub focus: String,

    /// Gemini model id; falls back to GEMINI_MODEL, then the built-in default
    #[arg(long)]
    pub model: Option<String>,

    /// Seconds before a single Gemini call is abandoned
    #[arg(long, default_value_t = 60)]
    pub llm_timeout_secs: u64,

    #[arg(long, default_value_t = 1000)]
    pub summarize_interval_ms: u64,

    #[arg(long, default_value_t = 2000)]
    pub send_interval_ms: u64,

    /// Log messages instead of sending them and leave state untouched
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct TelegramTarget {
    pub token: String,
    pub channel_id: String,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub feeds: Vec<String>,
    pub state_dir: PathBuf,
    pub window_days: u32,
    pub gemini_api_key: String,
    pub model: String,
    pub llm_timeout: Duration,
    /// `None` only in dry-run mode
    pub telegram: Option<TelegramTarget>,
    pub pipeline: PipelineSettings,
}

impl RelayConfig {
    /// Resolve the command line against the process environment.
    pub fn from_env(cli: Cli) -> Result<Self> {
        Self::resolve(cli, |name| std::env::var(name).ok())
    }

    /// Resolve the command line against `env`. Every missing credential is
    /// reported at once.
    pub fn resolve<F>(cli: Cli, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gemini_api_key = lookup("GEMINI_API_KEY");
        let token = lookup("TELEGRAM_BOT_TOKEN");
        let channel_id = lookup("TELEGRAM_CHANNEL_ID");

        let mut missing = Vec::new();
        if gemini_api_key.is_none() {
            missing.push("GEMINI_API_KEY");
        }
        if !cli.dry_run {
            if token.is_none() {
                missing.push("TELEGRAM_BOT_TOKEN");
            }
            if channel_id.is_none() {
                missing.push("TELEGRAM_CHANNEL_ID");
            }
        }
        if !missing.is_empty() {
            return Err(RelayError::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        if cli.max_messages == 0 {
            return Err(RelayError::Config("--max-messages must be at least 1".to_string()));
        }
        if cli.llm_timeout_secs == 0 {
            return Err(RelayError::Config("--llm-timeout-secs must be at least 1".to_string()));
        }
        if cli.window_days == 0 {
            return Err(RelayError::Config("--window-days must be at least 1".to_string()));
        }

        let mut feeds = cli.feeds.clone();
        if let Some(path) = &cli.feeds_file {
            feeds.extend(read_feeds_file(path)?);
        }
        if feeds.is_empty() {
            feeds = DEFAULT_FEEDS.iter().map(|f| f.to_string()).collect();
        }
        for feed in &feeds {
            url::Url::parse(feed)
                .map_err(|e| RelayError::Config(format!("invalid feed URL {}: {}", feed, e)))?;
        }

        let model = cli
            .model
            .clone()
            .or_else(|| lookup("GEMINI_MODEL"))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let telegram = match (cli.dry_run, token, channel_id) {
            (false, Some(token), Some(channel_id)) => Some(TelegramTarget { token, channel_id }),
            _ => None,
        };

        let pipeline = PipelineSettings {
            max_messages: cli.max_messages,
            description_limit: DEFAULT_DESCRIPTION_LIMIT,
            focus: cli.focus.clone(),
            language: cli.language.clone(),
            labels: MessageLabels::default(),
            summarize_interval: Duration::from_millis(cli.summarize_interval_ms),
            send_interval: Duration::from_millis(cli.send_interval_ms),
            shuffle: true,
            shuffle_seed: None,
            commit_state: !cli.dry_run,
        };

        Ok(Self {
            feeds,
            state_dir: cli.state_dir,
            window_days: cli.window_days,
            gemini_api_key: gemini_api_key.unwrap_or_default(),
            model,
            llm_timeout: Duration::from_secs(cli.llm_timeout_secs),
            telegram,
            pipeline,
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.telegram.is_none()
    }

    pub fn published_links_path(&self) -> PathBuf {
        self.state_dir.join(PUBLISHED_LINKS_FILE)
    }

    pub fn recent_topics_path(&self) -> PathBuf {
        self.state_dir.join(RECENT_TOPICS_FILE)
    }
}

fn read_feeds_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| RelayError::Config(format!("cannot read feeds file {}: {}", path.display(), e)))?;
    Ok(parse_feed_list(&content))
}

/// One URL per line. Blank lines, `#` lines and trailing ` #` comments are
/// ignored.
pub fn parse_feed_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .map(|line| line.split(" #").next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
