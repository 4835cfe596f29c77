use std::sync::LazyLock;

use ammonia::Builder;
use regex::Regex;

use crate::extractor::errors::ExtractError;

/// Wrap width handed to the text renderer; wide enough that paragraphs stay
/// on one line in practice.
const FLOW_WIDTH: usize = 400;

static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").unwrap());
static TRAILING_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").unwrap());

/// Sanitize an HTML fragment and render it as markdown-like flow text:
/// headings, lists and emphasis survive, scripts and styles do not.
pub fn to_flow_text(fragment: &str) -> Result<String, ExtractError> {
    // Ammonia drops script/style bodies and unknown tags before rendering
    let clean_html = Builder::default().clean(fragment).to_string();
    let rendered = html2text::from_read(clean_html.as_bytes(), FLOW_WIDTH)
        .map_err(|e| ExtractError::Conversion(e.to_string()))?;
    Ok(normalize_whitespace(&rendered))
}

/// Collapse runs of 3+ newlines to one blank line and runs of spaces to one
/// space, then trim.
pub fn normalize_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\t', " ");
    let text = TRAILING_SPACE.replace_all(&text, "");
    let text = SPACE_RUNS.replace_all(&text, " ");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}
