pub mod connection;
pub mod properties;
pub mod reports;
pub mod scrapes;

pub use connection::Database;
pub use properties::{save_listings, PageRequest, PropertyFilter, SaveSummary};
