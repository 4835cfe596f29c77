use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::entities::Item;

const MAX_SLUG_LEN: usize = 50;

/// Outcome of extracting one selected item. Exactly one per item, paired by
/// URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub url: String,
    pub slug: String,
    pub title: String,
    pub text: String,
    pub extracted_at: Option<DateTime<Utc>>,
    pub success: bool,
    pub error: Option<String>,
    pub word_count: usize,
    pub language: Option<String>,
}

impl ExtractionResult {
    pub fn for_item(item: &Item, slug: String) -> Self {
        Self {
            url: item.url.clone(),
            slug,
            title: item.title.clone(),
            text: String::new(),
            extracted_at: None,
            success: false,
            error: None,
            word_count: 0,
            language: None,
        }
    }

    pub(crate) fn succeed(&mut self, content: ExtractedText, at: DateTime<Utc>) {
        self.word_count = content.text.split_whitespace().count();
        self.text = content.text;
        self.language = content.language;
        self.extracted_at = Some(at);
        self.success = true;
        self.error = None;
    }

    pub(crate) fn fail(&mut self, reason: impl ToString) {
        self.success = false;
        self.error = Some(reason.to_string());
    }

    pub fn meta(&self) -> ArticleMeta<'_> {
        ArticleMeta {
            slug: &self.slug,
            url: &self.url,
            title: &self.title,
            success: self.success,
            error: self.error.as_deref(),
            word_count: self.word_count,
            extracted_at: self.extracted_at,
            language: self.language.as_deref(),
        }
    }
}

/// Sidecar metadata written next to each extracted article.
#[derive(Debug, Serialize)]
pub struct ArticleMeta<'a> {
    pub slug: &'a str,
    pub url: &'a str,
    pub title: &'a str,
    pub success: bool,
    pub error: Option<&'a str>,
    pub word_count: usize,
    pub extracted_at: Option<DateTime<Utc>>,
    pub language: Option<&'a str>,
}

/// Clean flow text produced by the extraction chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedText {
    pub text: String,
    pub strategy: &'static str,
    pub language: Option<String>,
}

/// Filesystem-safe name derived from the URL path, or the item fingerprint
/// when the path has nothing usable in it.
pub fn slug_for(item: &Item) -> String {
    Url::parse(&item.url)
        .ok()
        .map(|url| path_slug(url.path()))
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| item.id.clone())
}

fn path_slug(path: &str) -> String {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let slug: String = decoded
        .trim_matches('/')
        .to_lowercase()
        .replace('/', "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .take(MAX_SLUG_LEN)
        .collect();
    slug.trim_matches('-').to_string()
}
