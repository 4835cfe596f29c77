use std::sync::LazyLock;

use encoding_rs::Encoding;
use regex::Regex;

use crate::fetcher::{errors::FetchError, types::Charset};

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

static META_HTTP_EQUIV_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?http-equiv\s*=\s*["']?content-type["']?[^>]*?content\s*=\s*["']?[^"'>]*?charset\s*=\s*([^"'\s;/>]+)"#).unwrap()
});

/// Bytes of the document head scanned for `<meta>` charset declarations.
const SNIFF_LEN: usize = 4096;

/// Resolve the body encoding: Content-Type header, then `<meta>` tags, then
/// statistical detection.
pub fn detect_charset(content_type: &str, body: &[u8]) -> Charset {
    if let Some(encoding) = label_from(&CHARSET_REGEX, content_type) {
        return Charset::from_encoding(encoding);
    }

    let head = &body[..body.len().min(SNIFF_LEN)];
    let head_str = String::from_utf8_lossy(head);
    for regex in [&*META_CHARSET_REGEX, &*META_HTTP_EQUIV_REGEX] {
        if let Some(encoding) = label_from(regex, &head_str) {
            return Charset::from_encoding(encoding);
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(head, body.len() <= SNIFF_LEN);
    Charset::from_encoding(detector.guess(None, true))
}

fn label_from(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = regex.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}

/// Decode `body` with `charset`. Malformed UTF-8 is decoded lossily; any
/// other encoding rejects malformed input.
pub fn decode(body: &[u8], charset: Charset) -> Result<String, FetchError> {
    let encoding = charset.encoding();
    let (decoded, _, had_errors) = encoding.decode(body);
    if !had_errors {
        return Ok(decoded.into_owned());
    }
    if encoding == encoding_rs::UTF_8 {
        return Ok(String::from_utf8_lossy(body).into_owned());
    }
    Err(FetchError::Charset(format!(
        "failed to decode content with encoding: {}",
        encoding.name()
    )))
}
