// scraper/aggregate.rs
use crate::domain::images::resolve_images;
use crate::domain::listing::{Listing, Location};
use crate::domain::normalize::{normalize, RawRecord};
use crate::scraper::adapter::{AdapterOutcome, AdapterReport, SourceAdapter, FALLBACK_REASON};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, PartialEq)]
pub enum AcquireError {
    #[error("no source adapters configured")]
    NoAdapters,
}

#[derive(Debug, Clone, Copy)]
pub struct AcquisitionConfig {
    /// Stop consulting further adapters once this many listings are held.
    pub early_stop_threshold: usize,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self { early_stop_threshold: 3 }
    }
}

/// Result of one acquisition call for a location.
#[derive(Debug, Clone, Serialize)]
pub struct Acquisition {
    pub location: String,
    pub listings: Vec<Listing>,
    pub reports: Vec<AdapterReport>,
}

/// Runs source adapters in priority order and merges their output.
pub struct Aggregator {
    adapters: Vec<Box<dyn SourceAdapter>>,
    config: AcquisitionConfig,
}

impl Aggregator {
    pub fn new(
        adapters: Vec<Box<dyn SourceAdapter>>,
        config: AcquisitionConfig,
    ) -> Result<Self, AcquireError> {
        if adapters.is_empty() {
            return Err(AcquireError::NoAdapters);
        }
        Ok(Self { adapters, config })
    }

    pub fn adapter_names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Consults adapters in order, stopping after any call that leaves the
    /// accumulated listing count at or above the early-stop threshold. A
    /// failing adapter is logged and skipped. Every returned listing is
    /// normalized, has images and a URL that is unique within the result.
    pub fn acquire_all(&self, location: &str) -> Acquisition {
        let location = Location::parse(location);
        let mut listings: Vec<Listing> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut reports = Vec::with_capacity(self.adapters.len());
        let mut rng = rand::thread_rng();

        if location.raw.is_empty() {
            warn!("empty location, nothing to acquire");
            return Acquisition { location: location.raw, listings, reports };
        }

        for adapter in &self.adapters {
            let outcome = match adapter.acquire(&location) {
                Ok(records) if records.is_empty() => AdapterOutcome::Empty,
                Ok(records) => {
                    let mut count = 0;
                    let mut dropped = 0;

                    for record in &records {
                        let listing = match normalize(record) {
                            Ok(listing) => listing,
                            Err(e) => {
                                warn!(
                                    adapter = adapter.name(),
                                    error = %e,
                                    "dropping malformed record"
                                );
                                dropped += 1;
                                continue;
                            }
                        };

                        if !seen.insert(listing.url.clone()) {
                            dropped += 1;
                            continue;
                        }

                        listings.push(resolve_images(listing, &mut rng));
                        count += 1;
                    }

                    match fallback_reason(&records) {
                        Some(reason) => AdapterOutcome::Fallback { count, dropped, reason },
                        None => AdapterOutcome::Listings { count, dropped },
                    }
                }
                Err(e) => {
                    warn!(adapter = adapter.name(), error = %e, "adapter failed");
                    AdapterOutcome::Failed { reason: e.to_string() }
                }
            };

            info!(adapter = adapter.name(), ?outcome, total = listings.len(), "adapter finished");
            reports.push(AdapterReport { adapter: adapter.name().to_string(), outcome });

            if listings.len() >= self.config.early_stop_threshold {
                break;
            }
        }

        info!(location = %location, total = listings.len(), "acquisition complete");
        Acquisition { location: location.raw, listings, reports }
    }
}

fn fallback_reason(records: &[RawRecord]) -> Option<String> {
    records
        .iter()
        .find_map(|r| r.get(FALLBACK_REASON).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::demo::DemoAdapter;
    use crate::scraper::extract::LIVE_SOURCE;
    use crate::scraper::webdriver::{BrowserLauncher, BrowserSession};
    use crate::scraper::zillow::{DelayRange, LiveSiteConfig, ZillowAdapter, FALLBACK_SOURCE};
    use crate::scraper::ScraperError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingAdapter {
        name: &'static str,
        inner: DemoAdapter,
        calls: Arc<AtomicUsize>,
    }

    impl SourceAdapter for CountingAdapter {
        fn name(&self) -> &str {
            self.name
        }

        fn acquire(&self, location: &Location) -> Result<Vec<RawRecord>, ScraperError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.acquire(location)
        }
    }

    struct FailingAdapter;

    impl SourceAdapter for FailingAdapter {
        fn name(&self) -> &str {
            "broken"
        }

        fn acquire(&self, _: &Location) -> Result<Vec<RawRecord>, ScraperError> {
            Err(ScraperError::Network("connection refused".into()))
        }
    }

    /// Returns fixed records, including duplicates and one without a URL.
    struct FixedAdapter(Vec<Value>);

    impl SourceAdapter for FixedAdapter {
        fn name(&self) -> &str {
            "fixed"
        }

        fn acquire(&self, _: &Location) -> Result<Vec<RawRecord>, ScraperError> {
            Ok(self
                .0
                .iter()
                .filter_map(|v| v.as_object().cloned())
                .collect())
        }
    }

    struct FixtureLauncher(Option<&'static str>);
    struct FixtureSession(Option<&'static str>);

    impl BrowserLauncher for FixtureLauncher {
        type Session = FixtureSession;

        fn launch(&self, _: &str) -> Result<FixtureSession, ScraperError> {
            match self.0 {
                Some(_) => Ok(FixtureSession(self.0)),
                None => Err(ScraperError::Network("chromedriver unreachable".into())),
            }
        }
    }

    impl BrowserSession for FixtureSession {
        fn add_init_script(&mut self, _: &str) -> Result<(), ScraperError> {
            Ok(())
        }
        fn navigate(&mut self, _: &str) -> Result<(), ScraperError> {
            Ok(())
        }
        fn execute(&mut self, _: &str) -> Result<Value, ScraperError> {
            Ok(json!(1000))
        }
        fn move_pointer(&mut self, _: i64, _: i64) -> Result<(), ScraperError> {
            Ok(())
        }
        fn page_source(&mut self) -> Result<String, ScraperError> {
            Ok(self.0.unwrap_or_default().to_string())
        }
        fn quit(&mut self) -> Result<(), ScraperError> {
            Ok(())
        }
    }

    const THREE_CARDS: &str = r#"<html><body>
        <article data-test="property-card"><a href="/homedetails/a/1_zpid/">1 Elm Street</a> $450,000 3 bds 2 ba 1,800 sqft House for sale</article>
        <article data-test="property-card"><a href="/homedetails/b/2_zpid/">2 Elm Street</a> $520,000 4 bds 3 ba 2,100 sqft</article>
        <article data-test="property-card"><a href="/homedetails/c/3_zpid/">3 Elm Street</a> $299,000 Condo for sale</article>
    </body></html>"#;

    fn live(page: Option<&'static str>) -> Box<dyn SourceAdapter> {
        let config = LiveSiteConfig {
            settle_delay: DelayRange::NONE,
            scroll_delay: DelayRange::NONE,
            ..LiveSiteConfig::default()
        };
        Box::new(ZillowAdapter::new(FixtureLauncher(page), config).unwrap())
    }

    fn counting_demo() -> (Box<dyn SourceAdapter>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let adapter = CountingAdapter {
            name: "demo",
            inner: DemoAdapter::new(),
            calls: calls.clone(),
        };
        (Box::new(adapter), calls)
    }

    fn assert_complete(listing: &Listing) {
        assert!(!listing.url.is_empty());
        assert!(!listing.address.is_empty());
        assert!(!listing.city.is_empty());
        assert!(!listing.state.is_empty());
        assert!(listing.price > 0);
        assert!(!listing.images.is_empty());
        assert!(!listing.source.is_empty());
    }

    #[test]
    fn requires_at_least_one_adapter() {
        let err = Aggregator::new(Vec::new(), AcquisitionConfig::default()).err();
        assert_eq!(err, Some(AcquireError::NoAdapters));
    }

    #[test]
    fn unavailable_live_site_falls_back_to_tagged_demo_data() {
        let (demo, demo_calls) = counting_demo();
        let aggregator =
            Aggregator::new(vec![live(None), demo], AcquisitionConfig::default()).unwrap();

        let result = aggregator.acquire_all("Austin, TX");

        assert!(!result.listings.is_empty());
        assert!(result.listings.iter().all(|l| l.source == FALLBACK_SOURCE));
        assert!(result.listings.iter().all(|l| l.city == "Austin" && l.state == "TX"));
        // Fallback already clears the threshold.
        assert_eq!(demo_calls.load(Ordering::SeqCst), 0);

        match &result.reports[0].outcome {
            AdapterOutcome::Fallback { count, reason, .. } => {
                assert_eq!(*count, result.listings.len());
                assert!(reason.contains("chromedriver unreachable"), "{reason}");
            }
            other => panic!("expected fallback outcome, got {other:?}"),
        }
    }

    #[test]
    fn zero_threshold_still_consults_first_adapter() {
        let (demo, demo_calls) = counting_demo();
        let config = AcquisitionConfig { early_stop_threshold: 0 };
        let aggregator = Aggregator::new(vec![demo], config).unwrap();

        let result = aggregator.acquire_all("Austin, TX");

        assert_eq!(demo_calls.load(Ordering::SeqCst), 1);
        assert!(!result.listings.is_empty());
        assert_eq!(result.reports.len(), 1);
    }

    #[test]
    fn zero_threshold_stops_after_first_adapter() {
        let (first, first_calls) = counting_demo();
        let (second, second_calls) = counting_demo();
        let config = AcquisitionConfig { early_stop_threshold: 0 };
        let aggregator = Aggregator::new(vec![first, second], config).unwrap();

        aggregator.acquire_all("Austin, TX");

        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stops_once_live_listings_reach_threshold() {
        let (demo, demo_calls) = counting_demo();
        let adapters = vec![live(Some(THREE_CARDS)), demo];
        let aggregator = Aggregator::new(adapters, AcquisitionConfig::default()).unwrap();

        let result = aggregator.acquire_all("Austin, TX");

        assert_eq!(result.listings.len(), 3);
        assert!(result.listings.iter().all(|l| l.source == LIVE_SOURCE));
        assert_eq!(demo_calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.reports.len(), 1);
    }

    #[test]
    fn failing_adapter_is_skipped() {
        let (demo, demo_calls) = counting_demo();
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(FailingAdapter), demo];
        let aggregator = Aggregator::new(adapters, AcquisitionConfig::default()).unwrap();

        let result = aggregator.acquire_all("Denver, CO");

        assert!(!result.listings.is_empty());
        assert_eq!(demo_calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result.reports[0].outcome, AdapterOutcome::Failed { .. }));
    }

    #[test]
    fn below_threshold_consults_next_adapter() {
        let (demo, demo_calls) = counting_demo();
        let fixed = FixedAdapter(vec![json!({ "url": "https://a.example/1", "price": 100 })]);
        let aggregator =
            Aggregator::new(vec![Box::new(fixed), demo], AcquisitionConfig::default()).unwrap();

        let result = aggregator.acquire_all("Denver, CO");

        assert_eq!(demo_calls.load(Ordering::SeqCst), 1);
        assert!(result.listings.len() > 1);
        assert_eq!(result.listings[0].url, "https://a.example/1");
    }

    #[test]
    fn malformed_and_duplicate_records_are_dropped() {
        let fixed = FixedAdapter(vec![
            json!({ "url": "https://a.example/1", "price": 100 }),
            json!({ "address": "no url here" }),
            json!({ "url": "https://a.example/1", "price": 200 }),
            json!({ "url": "https://a.example/2" }),
        ]);
        let aggregator =
            Aggregator::new(vec![Box::new(fixed)], AcquisitionConfig::default()).unwrap();

        let result = aggregator.acquire_all("Denver, CO");

        let urls: Vec<&str> = result.listings.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, ["https://a.example/1", "https://a.example/2"]);
        assert_eq!(result.listings[0].price, 100);
        assert_eq!(result.reports[0].outcome, AdapterOutcome::Listings { count: 2, dropped: 2 });
    }

    #[test]
    fn every_listing_is_complete_and_unique() {
        let (demo, _) = counting_demo();
        let config = AcquisitionConfig { early_stop_threshold: 50 };
        let aggregator = Aggregator::new(vec![live(Some(THREE_CARDS)), demo], config).unwrap();

        let result = aggregator.acquire_all("Austin, TX");

        let urls: HashSet<&str> = result.listings.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls.len(), result.listings.len());
        result.listings.iter().for_each(assert_complete);
    }

    #[test]
    fn empty_location_yields_nothing() {
        let (demo, demo_calls) = counting_demo();
        let aggregator = Aggregator::new(vec![demo], AcquisitionConfig::default()).unwrap();

        let result = aggregator.acquire_all("   ");

        assert!(result.listings.is_empty());
        assert_eq!(demo_calls.load(Ordering::SeqCst), 0);
    }
}
