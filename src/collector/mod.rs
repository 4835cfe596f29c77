//! Discovery: fan in entries from every enabled source, normalize them to
//! [`Item`]s, deduplicate by fingerprint and drop what was already processed
//! or is too old.

pub mod api;
pub mod errors;
pub mod feed;
pub mod normalize;
pub mod scrape;
pub mod source;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{error, info};

pub use errors::SourceError;
pub use normalize::RawEntry;
pub use source::{EntrySource, HttpEntrySource};

use crate::{
    entities::Item,
    sources::SourceRegistry,
    state::{StateError, StateStore},
};

pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;

pub struct Collector {
    registry: SourceRegistry,
    state: StateStore,
    source: Arc<dyn EntrySource>,
    lookback: TimeDelta,
}

impl Collector {
    pub fn new(registry: SourceRegistry, state: StateStore, source: Arc<dyn EntrySource>) -> Self {
        Self {
            registry,
            state,
            source,
            lookback: TimeDelta::days(DEFAULT_LOOKBACK_DAYS),
        }
    }

    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback = TimeDelta::days(days.max(0));
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// Collect new items from all enabled sources.
    pub async fn collect(&self) -> Vec<Item> {
        self.collect_at(Utc::now()).await
    }

    /// [`Collector::collect`] with an explicit notion of "now" for the
    /// lookback window.
    pub async fn collect_at(&self, now: DateTime<Utc>) -> Vec<Item> {
        let mut all_items = Vec::new();

        for (group, source) in self.registry.enabled() {
            match self.source.fetch_entries(source).await {
                Ok(entries) => {
                    let items: Vec<Item> = entries
                        .into_iter()
                        .filter_map(|entry| normalize::to_item(entry, source, group))
                        .collect();
                    info!(group, source = %source.name, count = items.len(), "fetched source");
                    all_items.extend(items);
                }
                Err(e) => {
                    error!(group, source = %source.name, url = %source.url, "source failed: {}", e);
                }
            }
        }

        let total = all_items.len();
        let unique = deduplicate(all_items);
        let unique_count = unique.len();
        let new_items = self.filter_new(unique, now);

        info!(
            total,
            unique = unique_count,
            new = new_items.len(),
            "collection complete"
        );
        new_items
    }

    /// Drop items already processed in a previous run, and items with a
    /// known publication date older than the lookback window. Undated items
    /// are always kept.
    pub fn filter_new(&self, items: Vec<Item>, now: DateTime<Utc>) -> Vec<Item> {
        let cutoff = now - self.lookback;
        items
            .into_iter()
            .filter(|item| !self.state.is_processed(&item.url))
            .filter(|item| item.published_at.is_none_or(|published| published >= cutoff))
            .collect()
    }

    /// Commit `items` to the state store. Call only after the run succeeded.
    pub fn mark_processed<'a>(&mut self, items: impl IntoIterator<Item = &'a Item>) {
        self.state.mark_processed(items, Utc::now());
    }

    pub fn save_state(&self) -> Result<(), StateError> {
        self.state.save()
    }
}

/// Keep the first item for every id, preserving order.
pub fn deduplicate(items: Vec<Item>) -> Vec<Item> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}
