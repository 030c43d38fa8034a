use std::sync::Arc;
use std::time::Duration;

use super::model::{Order, OrderLine};
use crate::shared::currency::{normalize, Currency};
use crate::shared::period::HourBucketing;
use crate::shared::warehouse::cache::QueryCache;
use crate::shared::warehouse::row::{cell_f64, cell_i64, cell_str, cell_timestamp};
use crate::shared::warehouse::{WarehouseClient, WarehouseError, WarehouseRow};

/// Loads order snapshots from every storefront dataset of the warehouse
pub struct SalesRepository {
    client: Arc<dyn WarehouseClient>,
    project_id: String,
    storefronts: Vec<String>,
    bucketing: HourBucketing,
    orders: QueryCache<Vec<Order>>,
    order_lines: QueryCache<Vec<OrderLine>>,
}

impl SalesRepository {
    pub fn new(
        client: Arc<dyn WarehouseClient>,
        project_id: impl Into<String>,
        storefronts: Vec<String>,
        bucketing: HourBucketing,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            client,
            project_id: project_id.into(),
            storefronts,
            bucketing,
            orders: QueryCache::new(cache_ttl),
            order_lines: QueryCache::new(cache_ttl),
        }
    }

    /// Orders of all storefronts, cached per query text
    pub async fn load_orders(&self) -> Result<Arc<Vec<Order>>, WarehouseError> {
        let sql = orders_query(&self.project_id, &self.storefronts);
        self.orders
            .get_or_try_fetch(&sql, || async {
                let rows = self.client.run_query(&sql).await?;
                let orders = rows
                    .iter()
                    .map(|row| order_from_row(row, self.bucketing))
                    .collect::<Result<Vec<_>, _>>()?;
                tracing::info!("D402: loaded {} orders", orders.len());
                Ok::<_, WarehouseError>(orders)
            })
            .await
    }

    /// Line items of all storefronts, cached per query text
    pub async fn load_order_lines(&self) -> Result<Arc<Vec<OrderLine>>, WarehouseError> {
        let sql = order_lines_query(&self.project_id, &self.storefronts);
        self.order_lines
            .get_or_try_fetch(&sql, || async {
                let rows = self.client.run_query(&sql).await?;
                let lines = rows
                    .iter()
                    .map(|row| order_line_from_row(row, self.bucketing))
                    .collect::<Result<Vec<_>, _>>()?;
                tracing::info!("D402: loaded {} order lines", lines.len());
                Ok::<_, WarehouseError>(lines)
            })
            .await
    }

    /// Drop all cached snapshots; returns the number of cached queries
    pub fn invalidate(&self) -> usize {
        self.orders.invalidate_all() + self.order_lines.invalidate_all()
    }
}

/// Orders query: one SELECT per storefront dataset joined with UNION ALL
pub fn orders_query(project_id: &str, storefronts: &[String]) -> String {
    storefronts
        .iter()
        .map(|dataset| {
            format!(
                r#"SELECT created_at, shipping_address_country, shipping_address_country_code, presentment_currency, total_price
FROM `{project}.{dataset}.order`"#,
                project = project_id,
                dataset = dataset
            )
        })
        .collect::<Vec<_>>()
        .join("\nUNION ALL\n")
}

/// Ordered products query: order ⟕ order_line per storefront joined with UNION ALL
pub fn order_lines_query(project_id: &str, storefronts: &[String]) -> String {
    storefronts
        .iter()
        .map(|dataset| {
            format!(
                r#"SELECT o.created_at, o.id, ol.quantity, ol.title, ol.variant_title, ol.vendor
FROM `{project}.{dataset}.order` AS o
LEFT JOIN `{project}.{dataset}.order_line` AS ol
ON o.id = ol.order_id"#,
                project = project_id,
                dataset = dataset
            )
        })
        .collect::<Vec<_>>()
        .join("\nUNION ALL\n")
}

fn required_created_at(
    row: &WarehouseRow,
) -> Result<chrono::DateTime<chrono::Utc>, WarehouseError> {
    cell_timestamp(row, "created_at")?
        .ok_or_else(|| WarehouseError::Decode("row without created_at".to_string()))
}

pub fn order_from_row(row: &WarehouseRow, bucketing: HourBucketing) -> Result<Order, WarehouseError> {
    let created_at = required_created_at(row)?;
    let presentment_currency =
        Currency::from_code(&cell_str(row, "presentment_currency").unwrap_or_default());
    let total_price = cell_f64(row, "total_price")?;
    let total_price_converted = total_price.map(|amount| normalize(&presentment_currency, amount));

    Ok(Order {
        created_at,
        created_at_hour: bucketing.bucket(created_at),
        shipping_address_country: cell_str(row, "shipping_address_country"),
        shipping_address_country_code: cell_str(row, "shipping_address_country_code"),
        presentment_currency,
        total_price,
        total_price_converted,
    })
}

pub fn order_line_from_row(
    row: &WarehouseRow,
    bucketing: HourBucketing,
) -> Result<OrderLine, WarehouseError> {
    let created_at = required_created_at(row)?;

    Ok(OrderLine {
        created_at,
        created_at_hour: bucketing.bucket(created_at),
        order_id: cell_i64(row, "id")?,
        quantity: cell_f64(row, "quantity")?,
        title: cell_str(row, "title"),
        variant_title: cell_str(row, "variant_title"),
        vendor: cell_str(row, "vendor"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::warehouse::fake::{line_row, order_row, FakeWarehouse};
    use chrono::{TimeZone, Utc};

    fn storefronts() -> Vec<String> {
        vec!["shopify_dk".to_string(), "shopify_de".to_string()]
    }

    fn repository(fake: Arc<FakeWarehouse>) -> SalesRepository {
        SalesRepository::new(
            fake,
            "proj",
            storefronts(),
            HourBucketing::Round,
            Duration::from_secs(600),
        )
    }

    #[test]
    fn test_orders_query_unions_every_storefront() {
        let sql = orders_query("proj", &storefronts());
        assert_eq!(sql.matches("SELECT").count(), 2);
        assert_eq!(sql.matches("UNION ALL").count(), 1);
        assert!(sql.contains("`proj.shopify_dk.order`"));
        assert!(sql.contains("`proj.shopify_de.order`"));
        assert!(!sql.contains("order_line"));
    }

    #[test]
    fn test_order_lines_query_left_joins_per_storefront() {
        let sql = order_lines_query("proj", &storefronts());
        assert_eq!(sql.matches("LEFT JOIN").count(), 2);
        assert!(sql.contains("LEFT JOIN `proj.shopify_de.order_line` AS ol"));
        assert_eq!(sql.matches("UNION ALL").count(), 1);
    }

    #[test]
    fn test_order_from_row_converts_price_and_bucket() {
        let row = order_row("2024-01-01T10:50:00Z", Some("Germany"), "EUR", Some(10.0));
        let order = order_from_row(&row, HourBucketing::Round).unwrap();

        assert_eq!(order.presentment_currency, Currency::Eur);
        assert_eq!(order.total_price, Some(10.0));
        assert_eq!(order.total_price_converted, Some(74.5));
        assert_eq!(order.created_at_hour, Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap());
        assert_eq!(order.shipping_address_country.as_deref(), Some("Germany"));

        let floored = order_from_row(&row, HourBucketing::Floor).unwrap();
        assert_eq!(floored.created_at_hour, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_order_from_row_unknown_currency_and_null_price() {
        let row = order_row("2024-01-01T10:00:00Z", None, "USD", Some(50.0));
        let order = order_from_row(&row, HourBucketing::Round).unwrap();
        assert_eq!(order.total_price_converted, Some(50.0));
        assert_eq!(order.shipping_address_country, None);

        let row = order_row("2024-01-01T10:00:00Z", None, "DKK", None);
        let order = order_from_row(&row, HourBucketing::Round).unwrap();
        assert_eq!(order.total_price_converted, None);
    }

    #[test]
    fn test_row_without_created_at_is_error() {
        let mut row = order_row("2024-01-01T10:00:00Z", None, "DKK", Some(1.0));
        row.insert("created_at".to_string(), serde_json::Value::Null);
        assert!(matches!(
            order_from_row(&row, HourBucketing::Round),
            Err(WarehouseError::Decode(_))
        ));
    }

    #[test]
    fn test_order_line_without_line_keeps_nulls() {
        let row = line_row("2024-01-01T10:00:00Z", 7, None, None);
        let line = order_line_from_row(&row, HourBucketing::Round).unwrap();
        assert_eq!(line.order_id, Some(7));
        assert_eq!(line.title, None);
        assert_eq!(line.quantity, None);
        assert_eq!(line.vendor, None);
    }

    #[tokio::test]
    async fn test_loads_are_cached_per_query() {
        let fake = Arc::new(FakeWarehouse::new(
            vec![order_row("2024-01-01T10:00:00Z", Some("Denmark"), "DKK", Some(100.0))],
            vec![line_row("2024-01-01T10:00:00Z", 1, Some("Hat"), Some(2.0))],
        ));
        let repo = repository(Arc::clone(&fake));

        let first = repo.load_orders().await.unwrap();
        let second = repo.load_orders().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fake.calls(), 1);

        let lines = repo.load_order_lines().await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(fake.calls(), 2);

        assert_eq!(repo.invalidate(), 2);
        repo.load_orders().await.unwrap();
        assert_eq!(fake.calls(), 3);
    }

    #[tokio::test]
    async fn test_warehouse_failure_propagates() {
        let repo = repository(Arc::new(FakeWarehouse::failing()));
        assert!(matches!(
            repo.load_orders().await,
            Err(WarehouseError::Unreachable(_))
        ));
    }

    #[tokio::test]
    async fn test_decode_failure_is_not_cached() {
        let mut bad = order_row("2024-01-01T10:00:00Z", None, "DKK", Some(1.0));
        bad.insert("total_price".to_string(), serde_json::json!("n/a"));
        let fake = Arc::new(FakeWarehouse::new(vec![bad], vec![]));
        let repo = repository(Arc::clone(&fake));

        assert!(repo.load_orders().await.is_err());
        assert!(repo.load_orders().await.is_err());
        assert_eq!(fake.calls(), 2);
    }
}
