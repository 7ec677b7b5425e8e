use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use news_relay::{
    Cli, DryRunPublisher, FetchConfig, Fetcher, GeminiAdapter, ItemStore, LlmAdapter, Publisher,
    RelayConfig, RelayPipeline, RssFeedSource, TelegramPublisher, TopicMemory,
};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

const TELEGRAM_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let config = match RelayConfig::from_env(cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            eprintln!("news-relay: {}", e);
            return ExitCode::from(2);
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: RelayConfig) -> anyhow::Result<()> {
    info!(
        "Starting news-relay: {} feeds, model {}, state in {}{}",
        config.feeds.len(),
        config.model,
        config.state_dir.display(),
        if config.is_dry_run() { " (dry run)" } else { "" }
    );

    let fetcher = Arc::new(Fetcher::new(FetchConfig::default()).context("building feed fetcher")?);

    let llm: Arc<dyn LlmAdapter> = Arc::new(
        GeminiAdapter::new(&config.gemini_api_key, &config.model).with_timeout(config.llm_timeout),
    );

    let publisher: Arc<dyn Publisher> = match &config.telegram {
        Some(target) => Arc::new(
            TelegramPublisher::new(&target.token, &target.channel_id, TELEGRAM_TIMEOUT)
                .map_err(|e| e.redacted())
                .context("building Telegram client")?,
        ),
        None => Arc::new(DryRunPublisher::new()),
    };

    let item_store = ItemStore::load(config.published_links_path());
    let topic_memory = TopicMemory::new(config.recent_topics_path(), config.window_days);
    info!("Loaded {} published links", item_store.len());

    let mut pipeline =
        RelayPipeline::new(llm, publisher, item_store, topic_memory).with_settings(config.pipeline.clone());
    for feed in &config.feeds {
        pipeline.add_source(Box::new(RssFeedSource::new(feed.clone(), fetcher.clone())));
    }

    let report = pipeline.run(Utc::now()).await.context("persisting run state")?;

    info!(
        "Run finished: {} candidates, {} clusters kept, {}/{} delivered, committed: {}",
        report.intake.accepted, report.clusters_kept, report.delivered, report.attempted, report.committed
    );
    Ok(())
}
