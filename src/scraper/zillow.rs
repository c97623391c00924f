// scraper/zillow.rs
use crate::domain::listing::Location;
use crate::domain::normalize::RawRecord;
use crate::scraper::adapter::{SourceAdapter, FALLBACK_REASON};
use crate::scraper::demo::DemoAdapter;
use crate::scraper::extract::{CardExtractor, PageContext, PageLimits, LIVE_SOURCE};
use crate::scraper::stealth::{looks_blocked, random_user_agent, MASK_AUTOMATION_SCRIPT};
use crate::scraper::webdriver::{BrowserLauncher, BrowserSession, SessionGuard};
use crate::scraper::ScraperError;
use rand::Rng;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// `source` tag on records produced by the synthetic fallback path.
pub const FALLBACK_SOURCE: &str = "demo (zillow unavailable)";

const SEARCH_BASE: &str = "https://www.zillow.com/homes/for_sale";

/// Randomized pause between browser steps, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    #[cfg(test)]
    pub const NONE: DelayRange = DelayRange { min_ms: 0, max_ms: 0 };

    pub fn pause<R: Rng>(&self, rng: &mut R) {
        if self.max_ms == 0 {
            return;
        }
        let ms = rng.gen_range(self.min_ms..=self.max_ms.max(self.min_ms));
        std::thread::sleep(Duration::from_millis(ms));
    }
}

#[derive(Debug, Clone)]
pub struct LiveSiteConfig {
    pub page_cap: usize,
    pub selector_threshold: usize,
    pub max_scroll_cycles: usize,
    /// Wait after navigation before touching the page.
    pub settle_delay: DelayRange,
    /// Wait after each scroll for lazy-loaded cards.
    pub scroll_delay: DelayRange,
}

impl Default for LiveSiteConfig {
    fn default() -> Self {
        Self {
            page_cap: 20,
            selector_threshold: 2,
            max_scroll_cycles: 3,
            settle_delay: DelayRange { min_ms: 2000, max_ms: 5000 },
            scroll_delay: DelayRange { min_ms: 1000, max_ms: 3000 },
        }
    }
}

/// Browser-driven scraper for the live listings site.
///
/// Never fails past its own boundary: driver, navigation and markup
/// failures, as well as an empty results page, are answered with synthetic
/// listings tagged [`FALLBACK_SOURCE`]. The browser session is owned by a
/// [`SessionGuard`] and torn down on every exit path.
pub struct ZillowAdapter<L: BrowserLauncher> {
    launcher: L,
    config: LiveSiteConfig,
    extractor: CardExtractor,
    fallback: DemoAdapter,
}

impl<L: BrowserLauncher> ZillowAdapter<L> {
    pub fn new(launcher: L, config: LiveSiteConfig) -> Result<Self, ScraperError> {
        Ok(Self {
            launcher,
            config,
            extractor: CardExtractor::new()?,
            fallback: DemoAdapter::new(),
        })
    }

    fn scrape(&self, location: &Location) -> Result<Vec<RawRecord>, ScraperError> {
        let mut rng = rand::thread_rng();
        let search_url = search_url(location)?;

        let user_agent = random_user_agent(&mut rng);
        let mut session = SessionGuard::new(self.launcher.launch(user_agent)?);
        session.add_init_script(MASK_AUTOMATION_SCRIPT)?;

        info!(url = %search_url, "navigating to search results");
        session.navigate(search_url.as_str())?;
        self.config.settle_delay.pause(&mut rng);

        if let Err(e) = session.move_pointer(rng.gen_range(0..=100), rng.gen_range(0..=100)) {
            debug!(error = %e, "pointer move ignored");
        }

        self.scroll_until_stable(&mut *session, &mut rng)?;

        let html = session.page_source()?;
        if let Some(marker) = looks_blocked(&html) {
            return Err(ScraperError::Blocked(format!("bot check page ({marker})")));
        }

        let ctx = PageContext {
            city: &location.city,
            state: &location.region,
            page_url: &search_url,
        };
        let limits = PageLimits {
            selector_threshold: self.config.selector_threshold,
            page_cap: self.config.page_cap,
        };

        self.extractor.extract_page(&html, &ctx, limits, &mut rng)
    }

    /// Scrolls one viewport at a time until the document stops growing or
    /// the cycle budget runs out.
    fn scroll_until_stable<S: BrowserSession, R: Rng>(
        &self,
        session: &mut S,
        rng: &mut R,
    ) -> Result<(), ScraperError> {
        let mut last_height = page_height(session)?;

        for cycle in 1..=self.config.max_scroll_cycles {
            session.execute("window.scrollBy(0, window.innerHeight);")?;
            self.config.scroll_delay.pause(rng);

            let height = page_height(session)?;
            if height == last_height {
                debug!(cycle, height, "page height stable");
                break;
            }
            last_height = height;
        }

        Ok(())
    }

    fn demo_fallback(&self, location: &Location, reason: &str) -> Vec<RawRecord> {
        info!(location = %location, "using demo data");
        self.fallback
            .generate(location)
            .into_iter()
            .map(|mut record| {
                record.insert("source".into(), Value::from(FALLBACK_SOURCE));
                record.insert(FALLBACK_REASON.into(), Value::from(reason));
                record
            })
            .collect()
    }
}

impl<L: BrowserLauncher> SourceAdapter for ZillowAdapter<L> {
    fn name(&self) -> &str {
        LIVE_SOURCE
    }

    fn acquire(&self, location: &Location) -> Result<Vec<RawRecord>, ScraperError> {
        info!(location = %location, "scraping live listings");

        match self.scrape(location) {
            Ok(records) if !records.is_empty() => {
                info!(count = records.len(), "found live listings");
                Ok(records)
            }
            Ok(_) => {
                warn!("no live listings found, using demo fallback");
                Ok(self.demo_fallback(location, "no live listings found"))
            }
            Err(e) => {
                warn!(error = %e, "live scrape failed, using demo fallback");
                Ok(self.demo_fallback(location, &e.to_string()))
            }
        }
    }
}

/// Lowercase, spaces to hyphens.
pub fn slug(text: &str) -> String {
    text.trim().to_lowercase().replace(' ', "-")
}

pub fn search_url(location: &Location) -> Result<Url, ScraperError> {
    let area = if location.has_region() {
        format!("{}-{}", slug(&location.city), slug(&location.region))
    } else {
        slug(&location.city)
    };

    let raw = format!("{SEARCH_BASE}/{area}/?sort=days&status=ForSale");
    Url::parse(&raw).map_err(|e| ScraperError::Navigation(format!("{raw}: {e}")))
}

fn page_height<S: BrowserSession>(session: &mut S) -> Result<i64, ScraperError> {
    let value = session.execute("return document.body.scrollHeight")?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|h| h as i64))
        .ok_or_else(|| ScraperError::UnexpectedShape(format!("scroll height was {value}")))
}
