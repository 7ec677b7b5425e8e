use super::{read_json_or_default, write_json_atomic};
use crate::types::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Links of every item ever published. Never shrinks.
#[derive(Debug)]
pub struct ItemStore {
    path: PathBuf,
    links: BTreeSet<String>,
}

impl ItemStore {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let links: BTreeSet<String> = read_json_or_default(&path, "item store");
        debug!("Loaded {} published links from {}", links.len(), path.display());
        Self { path, links }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Union `links` into the store and persist. The in-memory set only
    /// changes once the file has been replaced. Returns how many links were new.
    pub fn merge<I>(&mut self, links: I) -> Result<usize>
    where
        I: IntoIterator<Item = String>,
    {
        let mut merged = self.links.clone();
        let before = merged.len();
        merged.extend(links);
        let added = merged.len() - before;

        write_json_atomic(&self.path, &merged)?;
        self.links = merged;

        info!("Item store now holds {} links ({} new)", self.links.len(), added);
        Ok(added)
    }
}
