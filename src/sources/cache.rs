use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Question → proposed URLs, persisted as one JSON object.
///
/// The whole file is rewritten on save. Concurrent writers lose updates.
#[derive(Debug, Clone)]
pub struct MemoCache {
    path: PathBuf,
    entries: BTreeMap<String, Vec<String>>,
}

impl MemoCache {
    /// Load the cache, treating a missing or malformed file as empty.
    pub fn load(path: &Path) -> Self {
        let entries = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), "Ignoring malformed URL cache: {}", e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No URL cache yet");
                BTreeMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), "Could not read URL cache: {}", e);
                BTreeMap::new()
            }
        };
        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    pub fn get(&self, question: &str) -> Option<&[String]> {
        self.entries.get(question).map(Vec::as_slice)
    }

    pub fn insert(&mut self, question: &str, urls: Vec<String>) {
        self.entries.insert(question.to_string(), urls);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.entries).context("serialize URL cache")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        debug!(path = %self.path.display(), entries = self.entries.len(), "URL cache saved");
        Ok(())
    }
}
