pub mod adapter;
pub mod aggregate;
pub mod demo;
pub mod extract;
mod scraper_error;
pub mod stealth;
pub mod webdriver;
pub mod zillow;

pub use adapter::{AdapterReport, SourceAdapter};
pub use aggregate::{AcquireError, AcquisitionConfig, Aggregator};
pub use demo::DemoAdapter;
pub use scraper_error::ScraperError;
pub use webdriver::WebDriverLauncher;
pub use zillow::{LiveSiteConfig, ZillowAdapter};
