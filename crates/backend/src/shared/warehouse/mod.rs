pub mod bigquery;
pub mod cache;
pub mod row;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use thiserror::Error;

pub use row::WarehouseRow;

/// Errors of the warehouse boundary; all of them abort the render pass
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("Warehouse unreachable: {0}")]
    Unreachable(String),

    #[error("Query rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Cannot decode warehouse response: {0}")]
    Decode(String),

    #[error("Warehouse not configured: {0}")]
    Config(String),
}

/// Read-only query execution against the warehouse
#[async_trait]
pub trait WarehouseClient: Send + Sync {
    /// Run `sql` and return its rows keyed by column name, in result order
    async fn run_query(&self, sql: &str) -> Result<Vec<WarehouseRow>, WarehouseError>;
}
