// scraper/adapter.rs
use crate::domain::listing::Location;
use crate::domain::normalize::RawRecord;
use crate::scraper::ScraperError;
use serde::Serialize;

/// One strategy for obtaining listings from a specific upstream source.
///
/// Adapters return raw records; normalization and image resolution happen
/// once, in the aggregator, for every source alike.
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn acquire(&self, location: &Location) -> Result<Vec<RawRecord>, ScraperError>;
}

/// Raw-record key under which an adapter that answered with substitute data
/// records why its primary source failed.
pub const FALLBACK_REASON: &str = "fallback_reason";

/// What a single adapter call produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdapterOutcome {
    Listings { count: usize, dropped: usize },
    /// Listings came from the adapter's fallback path.
    Fallback { count: usize, dropped: usize, reason: String },
    Empty,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterReport {
    pub adapter: String,
    #[serde(flatten)]
    pub outcome: AdapterOutcome,
}
