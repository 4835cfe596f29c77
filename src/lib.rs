//! Discovery, deduplication, ranking and extraction of articles from a set of
//! declared sources, ending in a daily markdown digest.

pub mod collector;
pub mod config;
pub mod curator;
pub mod entities;
pub mod extractor;
pub mod fetcher;
pub mod pipeline;
pub mod sources;
pub mod state;
pub mod synthesis;
