pub mod analytics;
pub mod home;
pub mod properties;
pub mod property;
pub mod scrape;

pub use analytics::analytics_page;
pub use home::{home_page, DashboardVm};
pub use properties::properties_page;
pub use property::property_page;
pub use scrape::scrape_page;
