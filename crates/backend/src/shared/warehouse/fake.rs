use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{WarehouseClient, WarehouseError, WarehouseRow};

/// In-memory warehouse for tests
///
/// Queries mentioning `order_line` get the line rows, everything else the
/// order rows. Every executed query text is recorded.
#[derive(Default)]
pub struct FakeWarehouse {
    pub orders: Vec<WarehouseRow>,
    pub lines: Vec<WarehouseRow>,
    pub fail: bool,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl FakeWarehouse {
    pub fn new(orders: Vec<WarehouseRow>, lines: Vec<WarehouseRow>) -> Self {
        Self {
            orders,
            lines,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WarehouseClient for FakeWarehouse {
    async fn run_query(&self, sql: &str) -> Result<Vec<WarehouseRow>, WarehouseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(sql.to_string());
        if self.fail {
            return Err(WarehouseError::Unreachable("connection refused".to_string()));
        }
        if sql.contains("order_line") {
            Ok(self.lines.clone())
        } else {
            Ok(self.orders.clone())
        }
    }
}

/// Order row as the warehouse returns it
pub fn order_row(
    created_at: &str,
    country: Option<&str>,
    currency: &str,
    total_price: Option<f64>,
) -> WarehouseRow {
    serde_json::json!({
        "created_at": created_at,
        "shipping_address_country": country,
        "shipping_address_country_code": null,
        "presentment_currency": currency,
        "total_price": total_price.map(|p| p.to_string()),
    })
    .as_object()
    .cloned()
    .unwrap()
}

/// Line row as the warehouse returns it
pub fn line_row(created_at: &str, order_id: i64, title: Option<&str>, quantity: Option<f64>) -> WarehouseRow {
    serde_json::json!({
        "created_at": created_at,
        "id": order_id.to_string(),
        "quantity": quantity.map(|q| q.to_string()),
        "title": title,
        "variant_title": null,
        "vendor": title.map(|_| "Beck Søndergaard"),
    })
    .as_object()
    .cloned()
    .unwrap()
}
