pub mod aggregation;
pub mod geo_join;
pub mod model;
pub mod repository;
pub mod service;

pub use service::{RealtimeSalesService, ReportError};
