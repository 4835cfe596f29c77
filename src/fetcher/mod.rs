pub mod charset;
pub mod client;
pub mod errors;
pub mod types;

pub use client::{DEFAULT_TIMEOUT, HttpFetcher, USER_AGENT};
pub use errors::FetchError;
pub use types::{Charset, PageResponse};
