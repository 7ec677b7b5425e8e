pub mod types;
pub mod fetcher;
pub mod parser;
pub mod traits;
pub mod sources;
pub mod state;
pub mod intake;
pub mod llm_adapter;
pub mod judgment;
pub mod digest;
pub mod publisher;
pub mod gemini;
pub mod pacing;
pub mod pipeline;
pub mod config;

pub use types::*;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use traits::{Delivery, FeedSource, Publisher};
pub use sources::{RssFeedSource, StaticFeedSource};
pub use state::{ItemStore, TopicMemory};
pub use llm_adapter::{LlmAdapter, LlmRequest, LlmTask, MockLlmAdapter};
pub use gemini::GeminiAdapter;
pub use publisher::{DryRunPublisher, MessageLabels, TelegramPublisher};
pub use pacing::Pacer;
pub use pipeline::{PipelineSettings, RelayPipeline, RunReport};
pub use config::{Cli, RelayConfig};
