use chrono::{DateTime, Utc};
use encoding_rs::Encoding;
use reqwest::StatusCode;
use url::Url;

/// Character encoding a response body was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charset(&'static Encoding);

impl Charset {
    pub const UTF_8: Charset = Charset(encoding_rs::UTF_8);

    pub fn from_encoding(encoding: &'static Encoding) -> Self {
        Self(encoding)
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.0
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }
}

/// A successfully fetched, decoded HTTP response.
#[derive(Debug)]
pub struct PageResponse {
    pub url_final: Url,
    pub status: StatusCode,
    pub content_type: String,
    pub body: String,
    pub charset: Charset,
    pub fetched_at: DateTime<Utc>,
}

impl PageResponse {
    pub fn is_html(&self) -> bool {
        is_html_content_type(&self.content_type)
    }
}

pub(crate) fn is_html_content_type(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.contains("text/html") || ct.contains("application/xhtml")
}
