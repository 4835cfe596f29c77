use async_trait::async_trait;
use tracing::instrument;

use crate::{
    collector::{api, errors::SourceError, feed, normalize::RawEntry, scrape},
    entities::{Source, SourceType},
    fetcher::HttpFetcher,
};

/// Fetches the raw entries of one source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntrySource: Send + Sync {
    async fn fetch_entries(&self, source: &Source) -> Result<Vec<RawEntry>, SourceError>;
}

/// Network-backed [`EntrySource`] dispatching on the source type.
#[derive(Debug, Clone)]
pub struct HttpEntrySource {
    fetcher: HttpFetcher,
}

impl HttpEntrySource {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl EntrySource for HttpEntrySource {
    #[instrument(skip_all, fields(source = %source.name, kind = ?source.kind))]
    async fn fetch_entries(&self, source: &Source) -> Result<Vec<RawEntry>, SourceError> {
        match source.kind {
            SourceType::Feed => {
                let doc = self.fetcher.fetch_document(&source.url).await?;
                feed::parse(doc.body.as_bytes())
            }
            SourceType::Api => {
                let doc = self.fetcher.fetch_document(&source.url).await?;
                api::parse(&doc.body)
            }
            SourceType::Scrape => {
                let page = self.fetcher.fetch_page(&source.url).await?;
                Ok(scrape::parse(&page.body, &page.url_final))
            }
        }
    }
}
