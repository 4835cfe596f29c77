//! Declarative source registry loaded from `sources.yaml`:
//!
//! ```yaml
//! groups:
//!   rust:
//!     - name: This Week in Rust
//!       type: feed
//!       url: https://this-week-in-rust.org/rss.xml
//!       tags: [rust]
//!       priority: 8
//! ```

use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::entities::Source;

const MIN_PRIORITY: u8 = 1;
const MAX_PRIORITY: u8 = 10;

/// Sources belonging to one topic group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceGroup {
    pub name: String,
    pub sources: Vec<Source>,
}

/// All configured groups in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRegistry {
    groups: Vec<SourceGroup>,
}

#[derive(Deserialize)]
struct SourcesFile {
    #[serde(default)]
    groups: Option<serde_yaml::Mapping>,
}

impl SourceRegistry {
    pub fn new(groups: Vec<SourceGroup>) -> Self {
        Self { groups }
    }

    /// Load from a YAML file. A missing or unreadable file yields an empty
    /// registry; a malformed group is skipped without affecting the others.
    pub fn load(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("sources file not found: {}", path.display());
                return Self::default();
            }
            Err(e) => {
                warn!("failed to read sources {}: {}", path.display(), e);
                return Self::default();
            }
        };
        let registry = Self::from_yaml(&raw);
        info!(
            groups = registry.groups.len(),
            sources = registry.enabled().count(),
            "loaded source registry from {}",
            path.display()
        );
        registry
    }

    pub fn from_yaml(raw: &str) -> Self {
        // An empty document deserializes as unit, not as a struct
        if raw.trim().is_empty() {
            return Self::default();
        }
        let file: SourcesFile = match serde_yaml::from_str(raw) {
            Ok(file) => file,
            Err(e) => {
                warn!("failed to parse sources: {}", e);
                return Self::default();
            }
        };

        let mut groups = Vec::new();
        for (key, value) in file.groups.unwrap_or_default() {
            let Some(name) = key.as_str().map(str::to_string) else {
                warn!("skipping source group with non-string name: {:?}", key);
                continue;
            };
            let sources = match serde_yaml::from_value::<Option<Vec<Source>>>(value) {
                Ok(sources) => sources.unwrap_or_default(),
                Err(e) => {
                    warn!(group = %name, "skipping malformed source group: {}", e);
                    continue;
                }
            };
            let sources = sources.into_iter().map(clamp_priority).collect();
            groups.push(SourceGroup { name, sources });
        }
        Self { groups }
    }

    pub fn groups(&self) -> &[SourceGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.sources.is_empty())
    }

    /// Enabled sources paired with their group name, in iteration order.
    pub fn enabled(&self) -> impl Iterator<Item = (&str, &Source)> {
        self.groups.iter().flat_map(|group| {
            group
                .sources
                .iter()
                .filter(|s| s.enabled)
                .map(move |s| (group.name.as_str(), s))
        })
    }
}

fn clamp_priority(mut source: Source) -> Source {
    let clamped = source.priority.clamp(MIN_PRIORITY, MAX_PRIORITY);
    if clamped != source.priority {
        warn!(
            source = %source.name,
            "priority {} outside {}..={}, clamped to {}",
            source.priority, MIN_PRIORITY, MAX_PRIORITY, clamped
        );
        source.priority = clamped;
    }
    source
}
