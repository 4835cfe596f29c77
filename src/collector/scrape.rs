use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::collector::normalize::RawEntry;

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("article a[href], h1 a[href], h2 a[href], h3 a[href], main a[href]").unwrap()
});

/// Minimum anchor text length for a listing link to count as an entry.
const MIN_LINK_TEXT: usize = 3;

/// Extract headline links from a listing page. Links are resolved against
/// `base`; fragments, non-http schemes and repeats are skipped.
pub fn parse(html: &str, base: &Url) -> Vec<RawEntry> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for anchor in document.select(&LINK_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if href.starts_with('#') {
            continue;
        }
        let Ok(mut url) = base.join(href) else {
            continue;
        };
        if !matches!(url.scheme(), "http" | "https") {
            continue;
        }
        url.set_fragment(None);
        if url == *base {
            continue;
        }

        let title = anchor.text().collect::<Vec<_>>().join(" ");
        let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
        if title.chars().count() < MIN_LINK_TEXT {
            continue;
        }

        if seen.insert(url.to_string()) {
            entries.push(RawEntry {
                title: Some(title),
                url: Some(url.to_string()),
                ..Default::default()
            });
        }
    }
    entries
}
