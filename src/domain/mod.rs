pub mod analysis;
pub mod images;
pub mod listing;
pub mod normalize;
pub mod seed;
pub mod words;
