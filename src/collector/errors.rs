use thiserror::Error;

use crate::fetcher::FetchError;

/// Failure to obtain entries from a single source. Never aborts collection.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("malformed {kind} document: {reason}")]
    Parse { kind: &'static str, reason: String },
}

impl SourceError {
    pub fn parse(kind: &'static str, reason: impl ToString) -> Self {
        Self::Parse {
            kind,
            reason: reason.to_string(),
        }
    }
}
