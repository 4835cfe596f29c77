use thiserror::Error;

use crate::fetcher::FetchError;

/// Per-item extraction failure. Recorded on the result, never propagated
/// past the extractor.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("content extraction failed")]
    NoContent,

    #[error("content conversion failed: {0}")]
    Conversion(String),

    #[error("extracted content too short")]
    TooShort,
}
