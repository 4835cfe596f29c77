use feed_rs::{model::Entry, parser};
use tracing::debug;

use crate::collector::{errors::SourceError, normalize::RawEntry};

/// Parse an RSS, Atom or JSON Feed document into raw entries.
pub fn parse(body: &[u8]) -> Result<Vec<RawEntry>, SourceError> {
    let feed = parser::parse(body).map_err(|e| SourceError::parse("feed", e))?;
    debug!(entries = feed.entries.len(), "parsed feed");
    Ok(feed.entries.into_iter().map(to_raw).collect())
}

fn to_raw(entry: Entry) -> RawEntry {
    // Prefer the alternate (human-readable) link when a feed lists several
    let url = entry
        .links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| entry.links.first())
        .map(|l| l.href.clone());

    let summary = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body));

    let dates = [entry.published, entry.updated].into_iter().flatten().collect();

    RawEntry {
        title: entry.title.map(|t| t.content),
        url,
        summary,
        dates,
        date_text: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn parses_rss_items() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Blog</title>
  <item>
    <title>Async Rust in practice</title>
    <link>https://example.com/async</link>
    <description>&lt;p&gt;A deep dive&lt;/p&gt;</description>
    <pubDate>Tue, 02 Jan 2024 03:04:05 GMT</pubDate>
  </item>
  <item>
    <title>No date</title>
    <link>https://example.com/nodate</link>
  </item>
</channel></rss>"#;

        let entries = parse(rss.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title.as_deref(), Some("Async Rust in practice"));
        assert_eq!(entries[0].url.as_deref(), Some("https://example.com/async"));
        assert_eq!(
            entries[0].dates.first(),
            Some(&Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
        );
        assert!(entries[0].summary.as_deref().unwrap().contains("A deep dive"));
        assert!(entries[1].dates.is_empty());
    }

    #[test]
    fn parses_atom_entries() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom</title>
  <id>urn:feed</id>
  <updated>2024-01-03T00:00:00Z</updated>
  <entry>
    <title>Entry one</title>
    <id>urn:1</id>
    <link rel="alternate" href="https://example.com/one"/>
    <updated>2024-01-03T00:00:00Z</updated>
    <summary>Summary text</summary>
  </entry>
</feed>"#;

        let entries = parse(atom.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url.as_deref(), Some("https://example.com/one"));
        assert_eq!(entries[0].summary.as_deref(), Some("Summary text"));
        assert_eq!(entries[0].dates.len(), 1);
    }

    #[test]
    fn rejects_non_feed() {
        let err = parse(b"<html><body>nope</body></html>").unwrap_err();
        assert!(matches!(err, SourceError::Parse { kind: "feed", .. }));
    }
}
