#![no_main]

use libfuzzer_sys::fuzz_target;
use url::Url;

use gazette::extractor::extract_html;

fuzz_target!(|data: &[u8]| {
    // Convert raw bytes to string, handling invalid UTF-8 gracefully
    let html = String::from_utf8_lossy(data);
    let base = Url::parse("https://example.com/post").unwrap();

    // The extraction chain should never panic regardless of input
    let _ = extract_html(&html, &base);
});
