//! Main-content location. Each strategy is a pure function from a page to an
//! HTML fragment; [`STRATEGIES`] lists them in the order they are tried.

use std::sync::LazyLock;

use readability::extractor;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// Minimum visible text, in characters, for a candidate region to be
/// accepted by the readability and container strategies.
pub const MIN_REGION_CHARS: usize = 200;

pub type Strategy = fn(&str, &Url) -> Option<String>;

pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("readability", readability_region),
    ("container", container_region),
    ("body", body_region),
];

/// Elements that never carry article content.
static NON_CONTENT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "script, style, noscript, template, nav, header, footer, aside, iframe, form, \
         .ad, .ads, .advert, .advertisement, .sponsored, [class*='advert'], [id*='advert'], \
         [class*='cookie'], [aria-hidden='true']",
    )
    .unwrap()
});

static CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "article",
        "[role='main']",
        ".post-content",
        ".article-content",
        ".entry-content",
        ".content",
        "main",
        "#content",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

/// Run the strategies in order and return the first accepted fragment with
/// the name of the strategy that produced it.
pub fn locate(html: &str, base: &Url) -> Option<(&'static str, String)> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let fragment = strategy(html, base)?;
        debug!(strategy = name, len = fragment.len(), "content located");
        Some((*name, fragment))
    })
}

/// Readability boilerplate removal.
pub fn readability_region(html: &str, base: &Url) -> Option<String> {
    let product = extractor::extract(&mut html.as_bytes(), base).ok()?;
    (visible_len(&product.text) > MIN_REGION_CHARS).then_some(product.content)
}

/// First well-known article container whose visible text is long enough,
/// after removing non-content elements.
pub fn container_region(html: &str, _base: &Url) -> Option<String> {
    let document = stripped_document(html);
    CONTAINERS.iter().find_map(|selector| {
        let element = document.select(selector).next()?;
        (element_text_len(element) > MIN_REGION_CHARS).then(|| element.html())
    })
}

/// Whole `<body>`, minus non-content elements.
pub fn body_region(html: &str, _base: &Url) -> Option<String> {
    let document = stripped_document(html);
    let body = document.select(&BODY).next()?;
    Some(body.html())
}

/// Parse `html` and detach every non-content element from the tree.
fn stripped_document(html: &str) -> Html {
    let mut document = Html::parse_document(html);
    let doomed: Vec<_> = document.select(&NON_CONTENT).map(|el| el.id()).collect();
    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
    document
}

fn element_text_len(element: ElementRef<'_>) -> usize {
    element.text().map(|t| t.trim().chars().count()).sum()
}

fn visible_len(text: &str) -> usize {
    text.split_whitespace().map(|w| w.chars().count()).sum()
}
