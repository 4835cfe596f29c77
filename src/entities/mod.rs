use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of the hex fingerprint used as an item id.
pub const FINGERPRINT_LEN: usize = 12;

/// Placeholder title for entries that arrive without one.
pub const UNTITLED: &str = "Untitled";

/// Stable short identity for a URL: the first 12 hex digits of its MD5.
///
/// Surrounding whitespace is ignored so that `" https://a/ "` and
/// `"https://a/"` are the same item.
pub fn fingerprint(url: &str) -> String {
    let digest = format!("{:x}", md5::compute(url.trim().as_bytes()));
    digest[..FINGERPRINT_LEN].to_string()
}

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[serde(alias = "rss", alias = "atom")]
    Feed,
    Api,
    Scrape,
}

/// Lifecycle of an item within one run:
/// `pending -> selected -> extracted | extract_failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Pending,
    Selected,
    Extracted,
    ExtractFailed,
}

impl ItemStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Extracted | Self::ExtractFailed)
    }
}

// --- Records ---

/// A configured feed endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceType,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_priority() -> u8 {
    1
}

fn default_enabled() -> bool {
    true
}

/// A discovered candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub source: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub group: String,
    #[serde(default)]
    pub status: ItemStatus,
}

impl Item {
    /// Build a pending item; the id is always derived from `url`.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        let url = url.into().trim().to_string();
        let title = title.into();
        let title = if title.trim().is_empty() {
            UNTITLED.to_string()
        } else {
            title.trim().to_string()
        };
        Self {
            id: fingerprint(&url),
            title,
            url,
            published_at: None,
            source: source.into(),
            snippet: String::new(),
            tags: Vec::new(),
            group: group.into(),
            status: ItemStatus::Pending,
        }
    }

    pub fn with_published_at(mut self, published_at: Option<DateTime<Utc>>) -> Self {
        self.published_at = published_at;
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Title and snippet joined and lowercased, the text curation filters on.
    pub fn match_text(&self) -> String {
        format!("{} {}", self.title, self.snippet).to_lowercase()
    }
}
