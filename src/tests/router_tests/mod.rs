mod api_tests;
mod page_tests;
mod scrape_tests;

use crate::scraper::{AcquisitionConfig, DemoAdapter};
use crate::tests::utils::{test_app, TestApp};
use std::time::Duration;

/// Fresh database plus the synthetic adapter only; no browser is started.
fn test_state() -> TestApp {
    test_app(
        vec![Box::new(DemoAdapter::new())],
        AcquisitionConfig::default(),
        Duration::from_secs(30),
    )
}
