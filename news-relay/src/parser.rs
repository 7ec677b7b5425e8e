use crate::types::{ParsedEntry, ParsedFeed, RelayError, Result};
use feed_rs::parser;
use tracing::debug;

/// Wide enough that html2text never re-wraps a description.
const RENDER_WIDTH: usize = 4096;

pub struct FeedParser;

impl FeedParser {
    pub fn parse_feed(content: &str) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| RelayError::Parse(format!("Failed to parse feed: {}", e)))?;

        let title = feed
            .title
            .map(|t| collapse_whitespace(&t.content))
            .filter(|t| !t.is_empty());

        let total = feed.entries.len();
        let entries: Vec<ParsedEntry> = feed.entries.into_iter().filter_map(Self::parse_entry).collect();

        if entries.len() < total {
            debug!("Skipped {} entries without a title or link", total - entries.len());
        }

        Ok(ParsedFeed { title, entries })
    }

    fn parse_entry(entry: feed_rs::model::Entry) -> Option<ParsedEntry> {
        // feed-rs has already decoded entities; only markup-typed titles get
        // a second pass
        let title = entry
            .title
            .map(|t| {
                if t.content_type.essence_str() == "text/html" {
                    collapse_whitespace(&html_to_text(&t.content))
                } else {
                    collapse_whitespace(&t.content)
                }
            })
            .filter(|t| !t.is_empty())?;

        let url = entry
            .links
            .first()
            .map(|link| link.href.trim().to_string())
            .filter(|href| !href.is_empty())?;

        // Prefer the short summary; fall back to the full body
        let raw_description = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .unwrap_or_default();

        Some(ParsedEntry {
            url,
            title,
            description: collapse_whitespace(&html_to_text(&raw_description)),
        })
    }
}

/// Decode entities and drop markup, leaving plain text.
pub fn html_to_text(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    html2text::from_read(html.as_bytes(), RENDER_WIDTH).unwrap_or_else(|_| html.to_string())
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
