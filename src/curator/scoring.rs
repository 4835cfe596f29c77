use chrono::{DateTime, Utc};

use crate::{curator::config::ScoringWeights, entities::Item};

/// Ranking score of one item; higher is better.
///
/// `patterns` must already be lowercased.
pub fn score(
    item: &Item,
    patterns: &[String],
    weights: &ScoringWeights,
    now: DateTime<Utc>,
) -> f64 {
    let text = item.match_text();
    let matches = patterns.iter().filter(|p| text.contains(p.as_str())).count();

    let mut score = matches as f64 * weights.allowlist_match;
    score += recency_boost(item.published_at, weights, now);
    if item.snippet.chars().count() > weights.long_snippet_chars {
        score += weights.long_snippet;
    }
    score
}

/// `max(0, window - age_hours) / window * weight`; undated items get nothing.
pub fn recency_boost(
    published_at: Option<DateTime<Utc>>,
    weights: &ScoringWeights,
    now: DateTime<Utc>,
) -> f64 {
    let Some(published) = published_at else {
        return 0.0;
    };
    let age_hours = (now - published).num_seconds() as f64 / 3600.0;
    let window = weights.recency_window_hours;
    // Future-dated entries have a negative age and score above the weight
    (window - age_hours).max(0.0) / window * weights.recency
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn item(title: &str, snippet: &str, published_at: Option<DateTime<Utc>>) -> Item {
        Item::new(title, format!("https://example.com/{title}"), "s", "g")
            .with_snippet(snippet)
            .with_published_at(published_at)
    }

    #[test]
    fn recency_decays_linearly_over_a_day() {
        let w = ScoringWeights::default();
        let now = Utc::now();
        assert!((recency_boost(Some(now), &w, now) - 2.0).abs() < 1e-9);
        let half = recency_boost(Some(now - TimeDelta::hours(12)), &w, now);
        assert!((half - 1.0).abs() < 1e-9);
        assert_eq!(recency_boost(Some(now - TimeDelta::hours(30)), &w, now), 0.0);
        assert_eq!(recency_boost(None, &w, now), 0.0);
    }

    #[test]
    fn future_dated_items_follow_the_linear_formula() {
        let w = ScoringWeights::default();
        let now = Utc::now();
        let boost = recency_boost(Some(now + TimeDelta::hours(6)), &w, now);
        assert!((boost - 2.5).abs() < 1e-9);
    }

    #[test]
    fn counts_each_pattern_once() {
        let w = ScoringWeights::default();
        let now = Utc::now();
        let patterns = vec!["rust".to_string(), "async".to_string(), "go".to_string()];
        let it = item("Rust async rust ASYNC", "", None);
        assert_eq!(score(&it, &patterns, &w, now), 2.0);
    }

    #[test]
    fn long_snippet_bonus() {
        let w = ScoringWeights::default();
        let now = Utc::now();
        assert_eq!(score(&item("t", &"x".repeat(101), None), &[], &w, now), 0.5);
        assert_eq!(score(&item("t", &"x".repeat(100), None), &[], &w, now), 0.0);
    }

    #[test]
    fn weights_are_configurable() {
        let w = ScoringWeights {
            allowlist_match: 3.0,
            long_snippet: 0.0,
            ..ScoringWeights::default()
        };
        let patterns = vec!["rust".to_string()];
        let it = item("Rust news", &"x".repeat(200), None);
        assert_eq!(score(&it, &patterns, &w, Utc::now()), 3.0);
    }
}
