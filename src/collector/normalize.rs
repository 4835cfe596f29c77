use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use scraper::Html;

use crate::entities::{Item, Source};

/// Maximum snippet length in characters.
pub const SNIPPET_MAX_CHARS: usize = 500;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %b %Y", "%B %d, %Y", "%b %d, %Y"];

/// A source entry before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub url: Option<String>,
    pub summary: Option<String>,
    /// Dates the source format already parsed, in priority order.
    pub dates: Vec<DateTime<Utc>>,
    /// Free-text date strings, in priority order; tried after `dates`.
    pub date_text: Vec<String>,
}

/// Turn a raw entry into a pending item. Entries without a link are dropped.
pub fn to_item(entry: RawEntry, source: &Source, group: &str) -> Option<Item> {
    let url = entry.url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
    let published_at = resolve_published(&entry.dates, &entry.date_text);
    let snippet = entry
        .summary
        .as_deref()
        .map(|s| truncate_chars(&html_to_text(s), SNIPPET_MAX_CHARS))
        .unwrap_or_default();
    let title = entry.title.as_deref().map(html_to_text).unwrap_or_default();

    Some(
        Item::new(title, url, source.name.clone(), group)
            .with_published_at(published_at)
            .with_snippet(snippet)
            .with_tags(source.tags.clone()),
    )
}

/// First structured date, else the first free-text date that parses.
pub fn resolve_published(dates: &[DateTime<Utc>], date_text: &[String]) -> Option<DateTime<Utc>> {
    dates
        .first()
        .copied()
        .or_else(|| date_text.iter().find_map(|s| parse_date_text(s)))
}

pub fn parse_date_text(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Visible text of an HTML fragment with whitespace collapsed.
pub fn html_to_text(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return collapse_whitespace(html);
    }
    let fragment = Html::parse_fragment(html);
    let text: Vec<&str> = fragment.root_element().text().collect();
    collapse_whitespace(&text.join(" "))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
