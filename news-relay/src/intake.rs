use crate::state::ItemStore;
use crate::types::{FeedBatch, ItemId, RawItem};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};
use url::Url;

/// Counters describing why entries did not become candidates.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IntakeReport {
    pub entries_seen: usize,
    pub accepted: usize,
    pub already_published: usize,
    pub duplicate_title: usize,
    pub duplicate_link: usize,
    pub incomplete: usize,
    /// Candidates contributed per feed endpoint
    pub accepted_by_source: BTreeMap<String, usize>,
}

/// Normalized form of a link, used as the durable identity of an item.
///
/// URLs are normalized by the `url` crate (scheme and host case, default
/// ports, empty paths) and lose their fragment. Anything that does not parse
/// is kept as trimmed text.
pub fn canonical_link(link: &str) -> String {
    let trimmed = link.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => trimmed.to_string(),
    }
}

/// Turn the raw batches of one run into candidates.
///
/// Entries are visited in batch order. An entry is dropped when its link was
/// published in an earlier run, or when its title or link was already
/// accepted earlier in this run. Survivors get consecutive ids from 0.
pub fn intake(batches: Vec<FeedBatch>, store: &ItemStore) -> (Vec<RawItem>, IntakeReport) {
    let mut report = IntakeReport::default();
    let mut candidates: Vec<RawItem> = Vec::new();
    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut seen_links: HashSet<String> = HashSet::new();
    let mut next_id: ItemId = 0;

    for batch in batches {
        debug!("Intake of {} entries from {}", batch.entries.len(), batch.source_uri);
        let before = candidates.len();
        for entry in batch.entries {
            report.entries_seen += 1;

            let title = entry.title.trim();
            let link = canonical_link(&entry.link);
            if title.is_empty() || link.is_empty() {
                report.incomplete += 1;
                continue;
            }

            if store.contains(&link) {
                report.already_published += 1;
                continue;
            }

            if seen_titles.contains(title) {
                debug!("Dropping duplicate title from {} ({}): {}", batch.source_name, batch.source_uri, title);
                report.duplicate_title += 1;
                continue;
            }

            if seen_links.contains(&link) {
                debug!("Dropping duplicate link from {} ({}): {}", batch.source_name, batch.source_uri, link);
                report.duplicate_link += 1;
                continue;
            }

            seen_titles.insert(title.to_string());
            seen_links.insert(link.clone());
            candidates.push(RawItem {
                id: next_id,
                title: title.to_string(),
                description: entry.description,
                link,
                source_name: batch.source_name.clone(),
            });
            next_id += 1;
        }
        let contributed = candidates.len() - before;
        if contributed > 0 {
            *report.accepted_by_source.entry(batch.source_uri).or_default() += contributed;
        }
    }

    report.accepted = candidates.len();
    info!(
        "Intake: {} entries, {} candidates ({} already published, {} duplicate titles, {} duplicate links, {} incomplete)",
        report.entries_seen,
        report.accepted,
        report.already_published,
        report.duplicate_title,
        report.duplicate_link,
        report.incomplete
    );

    (candidates, report)
}
