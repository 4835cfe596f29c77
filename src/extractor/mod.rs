//! Full-text extraction for selected items: fetch, locate the main content,
//! render it as flow text and persist the artifacts. Failures are recorded on
//! the [`ExtractionResult`], never raised.

pub mod cleaner;
pub mod errors;
pub mod language;
pub mod model;
pub mod reader;
pub mod reject;
pub mod store;

#[cfg(test)]
mod tests;

use std::collections::HashSet;

use chrono::Utc;
use futures::{StreamExt, stream};
use tracing::{info, instrument, warn};
use url::Url;

pub use errors::ExtractError;
pub use model::{ExtractedText, ExtractionResult, slug_for};
pub use store::ArticleStore;

use crate::{
    entities::{Item, ItemStatus},
    fetcher::HttpFetcher,
};

/// Locate, clean and validate the main content of an HTML page.
pub fn extract_html(html: &str, base: &Url) -> Result<ExtractedText, ExtractError> {
    let (strategy, fragment) = reader::locate(html, base).ok_or(ExtractError::NoContent)?;
    let text = cleaner::to_flow_text(&fragment)?;
    if reject::is_too_short(&text) {
        return Err(ExtractError::TooShort);
    }
    let language = language::detect_language(&text).map(str::to_string);
    Ok(ExtractedText {
        text,
        strategy,
        language,
    })
}

pub struct Extractor {
    fetcher: HttpFetcher,
    store: ArticleStore,
    concurrency: usize,
}

impl Extractor {
    pub fn new(fetcher: HttpFetcher, store: ArticleStore) -> Self {
        Self {
            fetcher,
            store,
            concurrency: 1,
        }
    }

    /// Number of items extracted at once. Results keep input order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn store(&self) -> &ArticleStore {
        &self.store
    }

    pub async fn extract(&self, item: &Item) -> ExtractionResult {
        self.extract_as(item, slug_for(item)).await
    }

    #[instrument(skip(self, item), fields(url = %item.url))]
    async fn extract_as(&self, item: &Item, slug: String) -> ExtractionResult {
        let mut result = ExtractionResult::for_item(item, slug);

        let outcome = match self.fetcher.fetch_page(&item.url).await {
            Ok(page) => extract_html(&page.body, &page.url_final),
            Err(e) => Err(ExtractError::from(e)),
        };

        match outcome {
            Ok(content) => {
                info!(
                    strategy = content.strategy,
                    chars = content.text.len(),
                    "extracted"
                );
                result.succeed(content, Utc::now());
            }
            Err(e) => {
                warn!("extraction failed for {}: {}", item.url, e);
                result.fail(&e);
            }
        }

        if let Err(e) = self.store.save(&result) {
            warn!(slug = %result.slug, "failed to persist article: {}", e);
            if result.success {
                result.error = Some(format!("persist failed: {e}"));
            }
        }
        result
    }

    /// Extract every item in order and move each to `extracted` or
    /// `extract_failed`. One failure never affects another item.
    pub async fn extract_all(&self, items: &mut [Item]) -> Vec<ExtractionResult> {
        let total = items.len();
        let slugs = unique_slugs(items);

        let results: Vec<ExtractionResult> = stream::iter(items.iter().zip(slugs).enumerate())
            .map(|(i, (item, slug))| {
                info!("extracting [{}/{}]: {}", i + 1, total, item.title);
                self.extract_as(item, slug)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        for (item, result) in items.iter_mut().zip(&results) {
            item.status = if result.success {
                ItemStatus::Extracted
            } else {
                ItemStatus::ExtractFailed
            };
        }

        let succeeded = results.iter().filter(|r| r.success).count();
        info!(succeeded, total, "extraction complete");
        results
    }
}

/// Slugs for a batch; a repeat of an earlier slug gets the item fingerprint
/// appended so artifacts never overwrite each other.
fn unique_slugs(items: &[Item]) -> Vec<String> {
    let mut used = HashSet::new();
    items
        .iter()
        .map(|item| {
            let mut slug = slug_for(item);
            if used.contains(&slug) {
                slug = format!("{slug}-{}", item.id);
            }
            used.insert(slug.clone());
            slug
        })
        .collect()
}
