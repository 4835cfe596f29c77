//! Selection: filter, rank and cap discovered items per group.

pub mod config;
pub mod scoring;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

pub use config::{CurationConfig, ScoringWeights};

use crate::entities::Item;

#[derive(Debug, Clone, Default)]
pub struct Curator {
    config: CurationConfig,
}

impl Curator {
    pub fn new(config: CurationConfig) -> Self {
        Self {
            config: config.normalized(),
        }
    }

    pub fn config(&self) -> &CurationConfig {
        &self.config
    }

    /// Filter, score and select the top items of each group.
    pub fn curate(&self, items: Vec<Item>) -> Vec<Item> {
        self.curate_at(items, Utc::now())
    }

    pub fn curate_at(&self, items: Vec<Item>, now: DateTime<Utc>) -> Vec<Item> {
        info!(count = items.len(), "curating items");

        let filtered = self.filter(items);
        info!(count = filtered.len(), "after filtering");

        let ranked = self.rank(filtered, now);
        let selected = self.select_top_per_group(ranked);
        info!(count = selected.len(), "selected items");
        selected
    }

    /// Drop items with a short title, any denylist hit, or (when an allowlist
    /// is configured) no allowlist hit.
    pub fn filter(&self, items: Vec<Item>) -> Vec<Item> {
        items
            .into_iter()
            .filter(|item| {
                if item.title.chars().count() < self.config.min_title_length {
                    debug!(id = %item.id, "title too short");
                    return false;
                }
                let text = item.match_text();
                if let Some(hit) = self.config.denylist.iter().find(|p| text.contains(p.as_str())) {
                    debug!(id = %item.id, pattern = %hit, "denylisted");
                    return false;
                }
                if !self.config.allowlist.is_empty()
                    && !self.config.allowlist.iter().any(|p| text.contains(p.as_str()))
                {
                    debug!(id = %item.id, "no allowlist match");
                    return false;
                }
                true
            })
            .collect()
    }

    /// Stable descending sort by score; equal scores keep input order.
    pub fn rank(&self, items: Vec<Item>, now: DateTime<Utc>) -> Vec<(Item, f64)> {
        let mut scored: Vec<(Item, f64)> = items
            .into_iter()
            .map(|item| {
                let score =
                    scoring::score(&item, &self.config.allowlist, &self.config.weights, now);
                (item, score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
    }

    /// Walk the ranked list once, keeping an item while its group is below
    /// `top_per_group`.
    pub fn select_top_per_group(&self, ranked: Vec<(Item, f64)>) -> Vec<Item> {
        let mut group_counts: HashMap<String, usize> = HashMap::new();
        let mut selected = Vec::new();
        for (item, score) in ranked {
            let count = group_counts.entry(item.group.clone()).or_default();
            if *count < self.config.top_per_group {
                *count += 1;
                debug!(id = %item.id, group = %item.group, score, "selected");
                selected.push(item);
            }
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn item(title: &str, group: &str) -> Item {
        Item::new(title, format!("https://example.com/{}", title.replace(' ', "-")), "s", group)
    }

    fn curator(config: CurationConfig) -> Curator {
        Curator::new(config)
    }

    #[test]
    fn short_titles_are_dropped() {
        let c = curator(CurationConfig::default());
        let kept = c.filter(vec![item("Too short", "g"), item("Long enough title", "g")]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Long enough title");
    }

    #[test]
    fn denylist_beats_allowlist() {
        let c = curator(CurationConfig {
            allowlist: vec!["rust".to_string()],
            denylist: vec!["Sponsored".to_string()],
            ..CurationConfig::default()
        });
        let items = vec![
            item("Rust release notes", "g"),
            item("SPONSORED: Rust hosting", "g"),
            Item::new("Rust in the wild", "https://example.com/w", "s", "g")
                .with_snippet("this post is sponsored"),
        ];
        let kept = c.filter(items);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Rust release notes");
    }

    #[test]
    fn allowlist_requires_a_match() {
        let c = curator(CurationConfig {
            allowlist: vec!["kubernetes".to_string(), "rust".to_string()],
            ..CurationConfig::default()
        });
        let items = vec![
            item("Gardening for beginners", "g"),
            Item::new("Weekly roundup", "https://example.com/r", "s", "g")
                .with_snippet("Mostly about Kubernetes operators"),
        ];
        let kept = c.filter(items);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Weekly roundup");
    }

    #[test]
    fn empty_allowlist_keeps_everything() {
        let c = curator(CurationConfig::default());
        let kept = c.filter(vec![item("Anything goes here", "g"), item("Something else", "g")]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn rank_is_stable_for_ties() {
        let c = curator(CurationConfig::default());
        let items = vec![
            item("First tied item", "g"),
            item("Second tied item", "g"),
            item("Third tied item", "g"),
        ];
        let ranked = c.rank(items, Utc::now());
        let titles: Vec<&str> = ranked.iter().map(|(i, _)| i.title.as_str()).collect();
        assert_eq!(titles, vec!["First tied item", "Second tied item", "Third tied item"]);
    }

    #[test]
    fn selects_top_n_per_group() {
        let now = Utc::now();
        let c = curator(CurationConfig {
            top_per_group: 2,
            ..CurationConfig::default()
        });
        let items = vec![
            item("Alpha oldest item", "a").with_published_at(Some(now - TimeDelta::hours(20))),
            item("Alpha newest item", "a").with_published_at(Some(now)),
            item("Alpha middle item", "a").with_published_at(Some(now - TimeDelta::hours(10))),
            item("Beta undated item", "b"),
            item("Beta second undated", "b"),
            item("Beta third undated", "b"),
        ];

        let selected = c.curate_at(items, now);
        let titles: Vec<&str> = selected.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Alpha newest item",
                "Alpha middle item",
                "Beta undated item",
                "Beta second undated"
            ]
        );
    }

    #[test]
    fn small_groups_keep_all_items() {
        let c = curator(CurationConfig {
            top_per_group: 3,
            ..CurationConfig::default()
        });
        let selected = c.curate(vec![item("Only one in group", "solo")]);
        assert_eq!(selected.len(), 1);
    }
}
