use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_TOP_PER_GROUP: usize = 5;
pub const MAX_TOP_PER_GROUP: usize = 20;
pub const DEFAULT_MIN_TITLE_LENGTH: usize = 10;

/// Weights of the ranking score. Defaults reproduce the historical formula:
/// one point per allowlist hit, up to two points for freshness within a day,
/// half a point for a descriptive snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub allowlist_match: f64,
    pub recency: f64,
    pub recency_window_hours: f64,
    pub long_snippet: f64,
    pub long_snippet_chars: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            allowlist_match: 1.0,
            recency: 2.0,
            recency_window_hours: 24.0,
            long_snippet: 0.5,
            long_snippet_chars: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationConfig {
    pub top_per_group: usize,
    pub allowlist: Vec<String>,
    pub denylist: Vec<String>,
    pub min_title_length: usize,
    pub weights: ScoringWeights,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            top_per_group: DEFAULT_TOP_PER_GROUP,
            allowlist: Vec::new(),
            denylist: Vec::new(),
            min_title_length: DEFAULT_MIN_TITLE_LENGTH,
            weights: ScoringWeights::default(),
        }
    }
}

impl CurationConfig {
    /// Load from YAML. A missing or malformed file yields the defaults.
    pub fn load(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("curation config not found: {}", path.display());
                return Self::default();
            }
            Err(e) => {
                warn!("failed to read curation config {}: {}", path.display(), e);
                return Self::default();
            }
        };
        let config = Self::from_yaml(&raw);
        info!(
            top_per_group = config.top_per_group,
            allow = config.allowlist.len(),
            deny = config.denylist.len(),
            "loaded curation config from {}",
            path.display()
        );
        config
    }

    pub fn from_yaml(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        match serde_yaml::from_str::<Self>(raw) {
            Ok(config) => config.normalized(),
            Err(e) => {
                warn!("failed to parse curation config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Clamp `top_per_group` into range and lowercase/trim patterns, dropping
    /// empty ones and case-insensitive repeats.
    pub fn normalized(mut self) -> Self {
        self.top_per_group = self.top_per_group.clamp(1, MAX_TOP_PER_GROUP);
        self.allowlist = normalize_patterns(self.allowlist);
        self.denylist = normalize_patterns(self.denylist);
        if self.weights.recency_window_hours <= 0.0 {
            self.weights.recency_window_hours = ScoringWeights::default().recency_window_hours;
        }
        self
    }
}

fn normalize_patterns(patterns: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let pattern = pattern.trim().to_lowercase();
        if !pattern.is_empty() && !out.contains(&pattern) {
            out.push(pattern);
        }
    }
    out
}
