//! Cross-run record of processed URLs.
//!
//! The file is read once when a run starts and written once when it ends.
//! Concurrent runs against the same file are not supported.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::entities::Item;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("state io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("state serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persisted pipeline state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default, with = "sorted_set")]
    pub processed_urls: HashSet<String>,
    #[serde(default)]
    pub processed_dates: Vec<String>,
}

impl PipelineState {
    pub fn is_processed(&self, url: &str) -> bool {
        self.processed_urls.contains(url.trim())
    }

    pub fn add_url(&mut self, url: &str) {
        self.processed_urls.insert(url.trim().to_string());
    }
}

/// The set is written as a sorted array so the file diffs cleanly between
/// runs.
mod sorted_set {
    use std::collections::HashSet;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(set: &HashSet<String>, s: S) -> Result<S::Ok, S::Error> {
        let mut urls: Vec<&String> = set.iter().collect();
        urls.sort();
        s.collect_seq(urls)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<HashSet<String>, D::Error> {
        let urls = Vec::<String>::deserialize(d)?;
        Ok(urls.into_iter().collect())
    }
}

/// File-backed owner of the [`PipelineState`].
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    state: PipelineState,
}

impl StateStore {
    /// Load state from `path`. Never fails: a missing file is a first run and
    /// an unreadable or corrupt file is logged and replaced by empty state.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<PipelineState>(&raw) {
                Ok(state) => {
                    debug!(
                        urls = state.processed_urls.len(),
                        "loaded state from {}",
                        path.display()
                    );
                    state
                }
                Err(e) => {
                    warn!("failed to parse state {}: {}", path.display(), e);
                    PipelineState::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no state at {}, starting fresh", path.display());
                PipelineState::default()
            }
            Err(e) => {
                warn!("failed to read state {}: {}", path.display(), e);
                PipelineState::default()
            }
        };
        Self { path, state }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn is_processed(&self, url: &str) -> bool {
        self.state.is_processed(url)
    }

    pub fn add_url(&mut self, url: &str) {
        self.state.add_url(url);
    }

    /// Record a completed run: every item URL becomes processed and the run
    /// date is appended once.
    pub fn mark_processed<'a>(
        &mut self,
        items: impl IntoIterator<Item = &'a Item>,
        now: DateTime<Utc>,
    ) {
        let before = self.state.processed_urls.len();
        for item in items {
            self.state.add_url(&item.url);
        }
        let date = now.format("%Y-%m-%d").to_string();
        if !self.state.processed_dates.contains(&date) {
            self.state.processed_dates.push(date);
        }
        self.state.last_run = Some(now);
        info!(
            added = self.state.processed_urls.len() - before,
            total = self.state.processed_urls.len(),
            "marked items processed"
        );
    }

    /// Write state to disk through a temporary sibling so a failed write never
    /// clobbers the previously committed file.
    pub fn save(&self) -> Result<(), StateError> {
        let io_err = |source| StateError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(&self.state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        debug!("saved state to {}", self.path.display());
        Ok(())
    }
}
