pub mod config;
pub mod currency;
pub mod format;
pub mod geo_lookup;
pub mod period;
pub mod warehouse;
