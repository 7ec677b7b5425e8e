use clap::Parser;
use news_relay::config::{parse_feed_list, DEFAULT_FEEDS};
use news_relay::{Cli, RelayConfig, RelayError};
use std::collections::HashMap;
use std::time::Duration;
use tempfile::TempDir;

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("news-relay").chain(args.iter().copied())).unwrap()
}

fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name: &str| vars.get(name).cloned()
}

fn full_env() -> impl Fn(&str) -> Option<String> {
    env(&[
        ("GEMINI_API_KEY", "gemini-key"),
        ("TELEGRAM_BOT_TOKEN", "bot-token"),
        ("TELEGRAM_CHANNEL_ID", "@channel"),
    ])
}

#[test]
fn defaults_match_the_documented_values() {
    let config = RelayConfig::resolve(cli(&[]), full_env()).unwrap();

    assert_eq!(config.feeds.len(), DEFAULT_FEEDS.len());
    assert_eq!(config.state_dir, std::path::PathBuf::from("state"));
    assert_eq!(config.window_days, 3);
    assert_eq!(config.model, "gemini-1.5-flash-latest");
    assert_eq!(config.llm_timeout, Duration::from_secs(60));
    assert_eq!(config.pipeline.max_messages, 15);
    assert_eq!(config.pipeline.language, "Russian");
    assert_eq!(config.pipeline.summarize_interval, Duration::from_millis(1000));
    assert_eq!(config.pipeline.send_interval, Duration::from_millis(2000));
    assert!(config.pipeline.commit_state);
    assert!(!config.is_dry_run());
    assert!(config.published_links_path().ends_with("published_links.json"));
    assert!(config.recent_topics_path().ends_with("recent_topics.json"));
}

#[test]
fn missing_credentials_are_all_named() {
    let result = RelayConfig::resolve(cli(&[]), env(&[("TELEGRAM_CHANNEL_ID", "@channel")]));

    match result {
        Err(RelayError::Config(message)) => {
            assert!(message.contains("GEMINI_API_KEY"));
            assert!(message.contains("TELEGRAM_BOT_TOKEN"));
            assert!(!message.contains("TELEGRAM_CHANNEL_ID"));
        }
        other => panic!("expected configuration error, got {:?}", other.map(|c| c.feeds)),
    }
}

#[test]
fn blank_credentials_count_as_missing() {
    let result = RelayConfig::resolve(
        cli(&[]),
        env(&[
            ("GEMINI_API_KEY", "   "),
            ("TELEGRAM_BOT_TOKEN", "bot-token"),
            ("TELEGRAM_CHANNEL_ID", "@channel"),
        ]),
    );

    assert!(matches!(result, Err(RelayError::Config(_))));
}

#[test]
fn dry_run_only_needs_the_gemini_key() {
    let config = RelayConfig::resolve(cli(&["--dry-run"]), env(&[("GEMINI_API_KEY", "gemini-key")])).unwrap();

    assert!(config.is_dry_run());
    assert!(!config.pipeline.commit_state);
    assert!(config.telegram.is_none());
}

#[test]
fn dry_run_ignores_present_telegram_credentials() {
    let config = RelayConfig::resolve(cli(&["--dry-run"]), full_env()).unwrap();

    assert!(config.is_dry_run());
}

#[test]
fn command_line_overrides_defaults() {
    let config = RelayConfig::resolve(
        cli(&[
            "--feed",
            "https://one.test/rss",
            "--feed",
            "https://two.test/atom",
            "--state-dir",
            "/var/lib/relay",
            "--window-days",
            "7",
            "--max-messages",
            "5",
            "--language",
            "English",
            "--model",
            "gemini-2.0-flash",
            "--summarize-interval-ms",
            "0",
        ]),
        full_env(),
    )
    .unwrap();

    assert_eq!(config.feeds, vec!["https://one.test/rss", "https://two.test/atom"]);
    assert_eq!(config.state_dir, std::path::PathBuf::from("/var/lib/relay"));
    assert_eq!(config.window_days, 7);
    assert_eq!(config.pipeline.max_messages, 5);
    assert_eq!(config.pipeline.language, "English");
    assert_eq!(config.model, "gemini-2.0-flash");
    assert_eq!(config.pipeline.summarize_interval, Duration::ZERO);
}

#[test]
fn model_falls_back_to_environment() {
    let config = RelayConfig::resolve(
        cli(&["--dry-run"]),
        env(&[("GEMINI_API_KEY", "k"), ("GEMINI_MODEL", "gemini-pro")]),
    )
    .unwrap();

    assert_eq!(config.model, "gemini-pro");
}

#[test]
fn feeds_file_is_combined_with_feed_flags() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("feeds.txt");
    std::fs::write(
        &path,
        "# telecom\nhttps://telecom.test/rss\n\n  https://ai.test/feed   # AI news\n#https://disabled.test/rss\n",
    )
    .unwrap();

    let config = RelayConfig::resolve(
        cli(&["--feed", "https://cli.test/rss", "--feeds-file", path.to_str().unwrap()]),
        full_env(),
    )
    .unwrap();

    assert_eq!(
        config.feeds,
        vec!["https://cli.test/rss", "https://telecom.test/rss", "https://ai.test/feed"]
    );
}

#[test]
fn unreadable_feeds_file_is_a_config_error() {
    let result = RelayConfig::resolve(cli(&["--feeds-file", "/nonexistent/feeds.txt"]), full_env());

    assert!(matches!(result, Err(RelayError::Config(_))));
}

#[test]
fn invalid_feed_url_is_a_config_error() {
    let result = RelayConfig::resolve(cli(&["--feed", "not a url"]), full_env());

    assert!(matches!(result, Err(RelayError::Config(_))));
}

#[test]
fn zero_limits_are_rejected() {
    assert!(RelayConfig::resolve(cli(&["--max-messages", "0"]), full_env()).is_err());
    assert!(RelayConfig::resolve(cli(&["--window-days", "0"]), full_env()).is_err());
}

#[test]
fn feed_list_keeps_urls_with_fragments() {
    assert_eq!(
        parse_feed_list("https://a.test/feed#main\n"),
        vec!["https://a.test/feed#main".to_string()]
    );
}

#[test]
fn llm_timeout_is_configurable_and_must_be_positive() {
    let config = RelayConfig::resolve(cli(&["--llm-timeout-secs", "15"]), full_env()).unwrap();
    assert_eq!(config.llm_timeout, Duration::from_secs(15));

    let result = RelayConfig::resolve(cli(&["--llm-timeout-secs", "0"]), full_env());
    assert!(matches!(result, Err(RelayError::Config(message)) if message.contains("--llm-timeout-secs")));
}
