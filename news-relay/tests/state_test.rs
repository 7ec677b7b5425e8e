use chrono::{Duration, Utc};
use news_relay::types::{ClusterSummary, Topic};
use news_relay::{ItemStore, TopicMemory};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn topic(title: &str, age: Duration) -> Topic {
    Topic {
        title: title.to_string(),
        summary: format!("{} summary", title),
        published_at: Utc::now() - age,
    }
}

#[test]
fn item_store_missing_file_is_empty() {
    init_tracing();
    let dir = TempDir::new().unwrap();

    let store = ItemStore::load(dir.path().join("published_links.json"));

    assert!(store.is_empty());
    assert!(!store.contains("https://a/1"));
}

#[test]
fn item_store_merge_is_a_union_and_survives_reload() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("published_links.json");

    let mut store = ItemStore::load(&path);
    let added = store
        .merge(vec!["https://a/1".to_string(), "https://a/2".to_string()])
        .unwrap();
    assert_eq!(added, 2);

    let added = store
        .merge(vec!["https://a/2".to_string(), "https://a/3".to_string()])
        .unwrap();
    assert_eq!(added, 1);
    assert_eq!(store.len(), 3);

    let reloaded = ItemStore::load(&path);
    assert_eq!(reloaded.len(), 3);
    for link in ["https://a/1", "https://a/2", "https://a/3"] {
        assert!(reloaded.contains(link), "{} missing after reload", link);
    }
}

#[test]
fn item_store_reads_plain_json_array() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("published_links.json");
    std::fs::write(&path, r#"["https://a/1","https://a/2"]"#).unwrap();

    let store = ItemStore::load(&path);

    assert_eq!(store.len(), 2);
    assert!(store.contains("https://a/2"));
}

#[test]
fn item_store_corrupt_file_is_treated_as_empty() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("published_links.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    let mut store = ItemStore::load(&path);
    assert!(store.is_empty());

    // The next merge replaces the corrupt file
    store.merge(vec!["https://a/9".to_string()]).unwrap();
    let reloaded = ItemStore::load(&path);
    assert_eq!(reloaded.len(), 1);
    assert!(reloaded.contains("https://a/9"));
}

#[test]
fn item_store_creates_missing_state_directory() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("state").join("published_links.json");

    let mut store = ItemStore::load(&path);
    store.merge(vec!["https://a/1".to_string()]).unwrap();

    assert!(path.exists());
}

#[test]
fn item_store_failed_write_keeps_memory_unchanged() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "a file, not a directory").unwrap();

    let mut store = ItemStore::load(blocker.join("published_links.json"));
    let result = store.merge(vec!["https://a/1".to_string()]);

    assert!(result.is_err());
    assert!(!store.contains("https://a/1"));
}

#[test]
fn topic_memory_load_drops_expired_topics() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("recent_topics.json");
    let stored = vec![
        topic("five days old", Duration::days(5)),
        topic("one day old", Duration::days(1)),
    ];
    std::fs::write(&path, serde_json::to_string(&stored).unwrap()).unwrap();

    let memory = TopicMemory::new(&path, 3);
    let loaded = memory.load(Utc::now());

    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].title, "one day old");
}

#[test]
fn topic_memory_save_without_new_topics_keeps_only_fresh_ones() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("recent_topics.json");
    let stored = vec![
        topic("expired", Duration::days(4)),
        topic("fresh", Duration::hours(10)),
    ];
    std::fs::write(&path, serde_json::to_string(&stored).unwrap()).unwrap();

    let memory = TopicMemory::new(&path, 3);
    let now = Utc::now();
    let loaded = memory.load(now);
    memory.append(loaded, Vec::new(), now).unwrap();

    // Reading the raw file: the expired topic must be gone, not just filtered
    let on_disk: Vec<Topic> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk.len(), 1);
    assert_eq!(on_disk[0].title, "fresh");
}

#[test]
fn topic_memory_append_stamps_new_topics_with_now() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let memory = TopicMemory::new(dir.path().join("recent_topics.json"), 3);
    let now = Utc::now();

    let existing = vec![topic("earlier", Duration::days(1))];
    let written = memory
        .append(
            existing,
            vec![ClusterSummary {
                title: "new story".to_string(),
                summary: "what happened".to_string(),
            }],
            now,
        )
        .unwrap();

    assert_eq!(written.len(), 2);
    assert_eq!(written[0].title, "earlier");
    assert_eq!(written[1].title, "new story");
    assert_eq!(written[1].published_at, now);

    let reloaded = memory.load(now);
    assert_eq!(reloaded, written);
}

#[test]
fn topic_memory_custom_window() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("recent_topics.json");
    let stored = vec![
        topic("two hours old", Duration::hours(2)),
        topic("thirty minutes old", Duration::minutes(30)),
    ];
    std::fs::write(&path, serde_json::to_string(&stored).unwrap()).unwrap();

    let memory = TopicMemory::with_window(&path, Duration::hours(1));
    let loaded = memory.load(Utc::now());

    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].title, "thirty minutes old");
}

#[test]
fn topic_memory_corrupt_file_is_treated_as_empty() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("recent_topics.json");
    std::fs::write(&path, "[{\"title\": 42}]").unwrap();

    let memory = TopicMemory::new(&path, 3);

    assert!(memory.load(Utc::now()).is_empty());
}
