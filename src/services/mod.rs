pub mod geocoding;
pub mod globe;
pub mod photos;
pub mod stats;
pub mod store;
