pub mod card;
pub mod chart;
pub mod error;
pub mod property_table;

pub use card::{card, money, stat_tile};
pub use chart::bar_chart;
pub use error::error_page;
pub use property_table::property_table;
