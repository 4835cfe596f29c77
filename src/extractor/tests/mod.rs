use std::fs;
use url::Url;

use crate::extractor::{ExtractError, extract_html};

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/extractor/tests/fixtures/{name}"))
        .expect("Failed to read test fixture")
}

fn base(url: &str) -> Url {
    Url::parse(url).unwrap()
}

#[test]
fn test_extract_article() {
    let html = fixture("article.html");
    let content = extract_html(&html, &base("https://example.com/article")).unwrap();

    assert!(content.text.contains("first paragraph"));
    assert!(content.text.contains("second paragraph"));
    assert!(content.text.contains("compiler guarantees"));
    assert!(!content.text.contains("window.analytics"));
    assert!(!content.text.contains("font-family"));
    assert!(!content.text.contains("All rights reserved"));
    assert!(!content.text.contains("managed database"));
    assert_eq!(content.language.as_deref(), Some("en"));
}

#[test]
fn test_extract_blog_post() {
    let html = fixture("blog.html");
    let content = extract_html(&html, &base("https://blog.example.com/post")).unwrap();

    assert!(content.text.contains("Building better software"));
    assert!(content.text.contains("applying them consistently"));
    assert_eq!(content.language.as_deref(), Some("en"));
}

#[test]
fn test_reject_empty_page() {
    let html = fixture("empty.html");
    let result = extract_html(&html, &base("https://example.com/empty"));

    assert!(matches!(result, Err(ExtractError::TooShort)));
}

#[test]
fn test_minimal_valid_content() {
    let html = format!(
        r#"<!DOCTYPE html><html><head><title>Valid Article</title></head><body><article><h1>Valid Article</h1><p>{}</p></article></body></html>"#,
        "This is a valid article with enough content to pass the minimum requirements for extraction. ".repeat(20)
    );
    let content = extract_html(&html, &base("https://example.com/valid")).unwrap();

    assert!(content.text.contains("valid article with enough content"));
    assert!(content.text.len() > 250);
}

#[test]
fn test_container_used_when_readability_finds_nothing() {
    // Long enough for the final length check, too short for readability
    let html = format!(
        "<html><body><nav>Home | Archive</nav><div class=\"entry-content\"><p>{}</p></div></body></html>",
        "Short words fill this entry. ".repeat(7)
    );
    let content = extract_html(&html, &base("https://example.com/entry")).unwrap();

    assert!(content.text.contains("Short words fill this entry."));
    assert!(!content.text.contains("Archive"));
}

#[test]
fn test_error_messages() {
    assert_eq!(ExtractError::NoContent.to_string(), "content extraction failed");
    assert_eq!(ExtractError::TooShort.to_string(), "extracted content too short");
}

#[test]
fn test_malformed_html() {
    let html = "<html><head><title>Broken</title><body><p>Unclosed tags<div>More content";

    // Should handle malformed HTML gracefully
    match extract_html(html, &base("https://example.com/broken")) {
        Ok(content) => assert!(content.text.contains("Unclosed tags")),
        Err(e) => assert!(matches!(e, ExtractError::TooShort | ExtractError::NoContent)),
    }
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_extract_never_panics(
            html in ".*",
            url in "https://[a-z]+\\.com/.*"
        ) {
            if let Ok(base) = Url::parse(&url) {
                let _ = extract_html(&html, &base);
            }
        }

        #[test]
        fn test_extract_output_is_clean(html in ".*") {
            if let Ok(content) = extract_html(&html, &base("https://example.com")) {
                assert!(content.text.trim() == content.text);
            }
        }
    }
}
