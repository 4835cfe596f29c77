use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, ClientBuilder, header};
use tracing::{debug, instrument};

use crate::fetcher::{
    charset,
    errors::FetchError,
    types::{PageResponse, is_html_content_type},
};

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const MAX_REDIRECTS: usize = 10;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Browser-like identification; several publishers serve stripped pages or
/// 403s to obvious bots.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Shared HTTP client for feed, listing and article requests.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("en-US,en;q=0.9"),
        );

        let client = ClientBuilder::new()
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    /// Fetch an article page. Only HTML-family responses are accepted.
    #[instrument(skip(self))]
    pub async fn fetch_page(&self, url: &str) -> Result<PageResponse, FetchError> {
        self.get(url, true).await
    }

    /// Fetch a feed or API document; any content type is accepted.
    #[instrument(skip(self))]
    pub async fn fetch_document(&self, url: &str) -> Result<PageResponse, FetchError> {
        self.get(url, false).await
    }

    async fn get(&self, url: &str, html_only: bool) -> Result<PageResponse, FetchError> {
        let parsed_url = url::Url::parse(url)?;

        let mut response = self
            .client
            .get(parsed_url)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        if let Some(content_length) = response.content_length()
            && content_length > MAX_BODY_SIZE
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http { status });
        }

        let url_final = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if html_only && !is_html_content_type(&content_type) {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        // Content-Length may be absent or wrong
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(FetchError::from_reqwest_error)?
        {
            let read = (body.len() + chunk.len()) as u64;
            if read > MAX_BODY_SIZE {
                return Err(FetchError::BodyTooLarge(read));
            }
            body.extend_from_slice(&chunk);
        }

        let charset = charset::detect_charset(&content_type, &body);
        let body = charset::decode(&body, charset)?;
        debug!(
            status = %status,
            charset = charset.name(),
            bytes = body.len(),
            "fetched {}",
            url_final
        );

        Ok(PageResponse {
            url_final,
            status,
            content_type,
            body,
            charset,
            fetched_at: Utc::now(),
        })
    }
}
