//! Persisted run-to-run state.
//!
//! Both stores are rewritten wholesale at the end of a run. Writes go to a
//! temporary file next to the target which is then renamed over it, so a
//! failed write leaves the previous file untouched. Reads never fail the run:
//! a missing file is a first run, an unreadable one is logged and treated as
//! empty.

pub mod item_store;
pub mod topic_memory;

pub use item_store::ItemStore;
pub use topic_memory::TopicMemory;

use crate::types::{RelayError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::warn;

pub(crate) fn read_json_or_default<T>(path: &Path, what: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return T::default(),
        Err(e) => {
            warn!("Cannot read {} at {}, starting empty: {}", what, path.display(), e);
            return T::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!("Corrupt {} at {}, starting empty: {}", what, path.display(), e);
            T::default()
        }
    }
}

pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut file, value)?;
    file.write_all(b"\n")?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| RelayError::Io(e.error))?;

    Ok(())
}
