// app.rs
use crate::config::Config;
use crate::db::scrapes::{end_scrape_run, start_scrape_run};
use crate::db::{save_listings, Database, SaveSummary};
use crate::domain::listing::Listing;
use crate::errors::ServerError;
use crate::scraper::{
    AcquireError, AcquisitionConfig, AdapterReport, Aggregator, DemoAdapter, SourceAdapter,
    WebDriverLauncher, ZillowAdapter,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Shared by every worker thread.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub aggregator: Arc<Aggregator>,
    pub scrape_timeout: Duration,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, AcquireError> {
        let mut adapters: Vec<Box<dyn SourceAdapter>> = Vec::new();

        if config.live_scraper {
            let launcher = WebDriverLauncher::new(
                config.webdriver_url.clone(),
                config.headless,
                config.browser_binary.clone(),
            )
            .and_then(|launcher| ZillowAdapter::new(launcher, config.live_site()));

            match launcher {
                Ok(adapter) => adapters.push(Box::new(adapter)),
                Err(e) => warn!(error = %e, "live scraper disabled"),
            }
        }
        adapters.push(Box::new(DemoAdapter::new()));

        Self::new(
            Database::new(config.database_path.clone()),
            adapters,
            config.acquisition(),
            config.scrape_timeout,
        )
    }

    pub fn new(
        db: Database,
        adapters: Vec<Box<dyn SourceAdapter>>,
        acquisition: AcquisitionConfig,
        scrape_timeout: Duration,
    ) -> Result<Self, AcquireError> {
        let aggregator = Aggregator::new(adapters, acquisition)?;

        info!(adapters = ?aggregator.adapter_names(), "acquisition pipeline ready");

        Ok(Self {
            db,
            aggregator: Arc::new(aggregator),
            scrape_timeout,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ScrapeOutcome {
    pub location: String,
    pub found: usize,
    #[serde(flatten)]
    pub saved: SaveSummary,
    pub outcomes: Vec<AdapterReport>,
    pub listings: Vec<Listing>,
}

/// Acquires listings for `location`, persists the new ones and records the
/// run. Acquisition runs on its own thread so a slow browser session is
/// bounded by the configured timeout.
pub fn run_scrape(state: &AppState, location: &str) -> Result<ScrapeOutcome, ServerError> {
    let location = location.trim().to_string();
    let run_id = state
        .db
        .with_conn(|conn| start_scrape_run(conn, &location, Utc::now().timestamp()))?;

    let finish = |found: usize, summary: SaveSummary, error: Option<String>| {
        state.db.with_conn(|conn| {
            end_scrape_run(conn, run_id, Utc::now().timestamp(), found, summary, error)
        })
    };

    let (tx, rx) = mpsc::channel();
    let aggregator = Arc::clone(&state.aggregator);
    let target = location.clone();
    thread::spawn(move || {
        // The receiver may have timed out and gone away.
        let _ = tx.send(aggregator.acquire_all(&target));
    });

    let acquisition = match rx.recv_timeout(state.scrape_timeout) {
        Ok(acquisition) => acquisition,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            let msg = format!("Scrape timed out after {}s", state.scrape_timeout.as_secs());
            warn!(location = %location, "{msg}");
            finish(0, SaveSummary::default(), Some(msg.clone()))?;
            return Err(ServerError::Timeout(msg));
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            finish(0, SaveSummary::default(), Some("acquisition thread panicked".into()))?;
            return Err(ServerError::InternalError);
        }
    };

    let found = acquisition.listings.len();
    if found == 0 {
        finish(0, SaveSummary::default(), Some("No listings found".into()))?;
        return Err(ServerError::NotFound("No listings found".into()));
    }

    let saved = save_listings(&state.db, &acquisition.listings)?;
    finish(found, saved, None)?;

    info!(
        location = %location,
        found,
        inserted = saved.inserted,
        skipped = saved.skipped,
        "scrape finished"
    );

    Ok(ScrapeOutcome {
        location: acquisition.location,
        found,
        saved,
        outcomes: acquisition.reports,
        listings: acquisition.listings,
    })
}
