use chrono::{NaiveDate, Utc};
use contracts::dashboards::d402_realtime_sales::{
    RealtimeSalesRequest, RealtimeSalesResponse, ReportPeriod, REPORTING_CURRENCY,
};
use std::sync::Arc;
use thiserror::Error;

use super::aggregation::{hourly_sales, scorecards, top_products};
use super::geo_join::shipping_countries;
use super::repository::SalesRepository;
use crate::shared::geo_lookup::GeoLookup;
use crate::shared::period::{DateRange, PeriodError};
use crate::shared::warehouse::WarehouseError;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Period(#[from] PeriodError),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),
}

/// Realtime sales dashboard: one render pass per request
pub struct RealtimeSalesService {
    repository: SalesRepository,
    geo: Arc<GeoLookup>,
    top_products_limit: usize,
}

impl RealtimeSalesService {
    pub fn new(repository: SalesRepository, geo: Arc<GeoLookup>, top_products_limit: usize) -> Self {
        Self {
            repository,
            geo,
            top_products_limit,
        }
    }

    /// Resolve the date selection, load both snapshots and build every view
    ///
    /// Any warehouse failure aborts the whole pass; no partial views.
    pub async fn get_realtime_sales(
        &self,
        request: RealtimeSalesRequest,
        today: NaiveDate,
    ) -> Result<RealtimeSalesResponse, ReportError> {
        let range = DateRange::resolve(request.date_from, request.date_to, today)?;

        let orders = self.repository.load_orders().await?;
        let lines = self.repository.load_order_lines().await?;

        let response = RealtimeSalesResponse {
            period: ReportPeriod {
                date_from: range.date_from,
                date_to: range.date_to,
            },
            currency: REPORTING_CURRENCY.to_string(),
            hourly_sales: hourly_sales(&orders, &range),
            scorecards: scorecards(&orders, &range),
            shipping_countries: shipping_countries(&orders, &self.geo, &range),
            top_products: top_products(&lines, &range, self.top_products_limit),
            generated_at: Utc::now(),
        };

        tracing::debug!(
            "D402: {}..{} -> {} orders, {} hours, {} countries",
            range.date_from,
            range.date_to,
            response.scorecards.orders,
            response.hourly_sales.len(),
            response.shipping_countries.len()
        );

        Ok(response)
    }

    /// Drop cached snapshots so the next pass hits the warehouse
    pub fn refresh(&self) -> usize {
        let invalidated = self.repository.invalidate();
        tracing::info!("D402: cache invalidated ({} entries)", invalidated);
        invalidated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::geo_lookup::GeoPoint;
    use crate::shared::period::HourBucketing;
    use crate::shared::warehouse::fake::{line_row, order_row, FakeWarehouse};
    use std::time::Duration;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn fake() -> Arc<FakeWarehouse> {
        Arc::new(FakeWarehouse::new(
            vec![
                order_row("2024-01-01T10:15:00Z", Some("Denmark"), "DKK", Some(100.0)),
                order_row("2024-01-01T10:50:00Z", Some("Germany"), "EUR", Some(10.0)),
                order_row("2024-01-01T12:05:00Z", Some("Atlantis"), "GBP", Some(1.0)),
                order_row("2024-01-05T09:00:00Z", Some("Denmark"), "DKK", Some(999.0)),
            ],
            vec![
                line_row("2024-01-01T10:15:00Z", 1, Some("Hat"), Some(2.0)),
                line_row("2024-01-01T10:50:00Z", 2, Some("Scarf"), Some(1.0)),
                line_row("2024-01-01T10:50:00Z", 2, Some("Hat"), Some(1.0)),
                line_row("2024-01-01T12:05:00Z", 3, None, None),
            ],
        ))
    }

    fn service(fake: Arc<FakeWarehouse>, bucketing: HourBucketing) -> RealtimeSalesService {
        let repository = SalesRepository::new(
            fake,
            "proj",
            vec!["shopify_dk".to_string()],
            bucketing,
            Duration::from_secs(600),
        );
        let geo: GeoLookup = [
            ("Denmark".to_string(), GeoPoint { latitude: 56.0, longitude: 10.0 }),
            ("Germany".to_string(), GeoPoint { latitude: 51.0, longitude: 9.0 }),
        ]
        .into_iter()
        .collect();
        RealtimeSalesService::new(repository, Arc::new(geo), 10)
    }

    fn single_day(d: u32) -> RealtimeSalesRequest {
        RealtimeSalesRequest {
            date_from: Some(date(d)),
            date_to: None,
        }
    }

    #[tokio::test]
    async fn test_render_pass_builds_every_view() {
        let svc = service(fake(), HourBucketing::Floor);
        let report = svc.get_realtime_sales(single_day(1), date(10)).await.unwrap();

        assert_eq!(report.period, ReportPeriod { date_from: date(1), date_to: date(1) });
        assert_eq!(report.currency, "DKK");
        assert_eq!(report.hourly_sales.len(), 2);
        assert_eq!(report.hourly_sales[0].total, 174.5);
        assert_eq!(report.scorecards.orders, 3);
        assert_eq!(report.scorecards.total_sales, 183.16);

        // Atlantis counts in the totals but not on the map
        let countries: Vec<_> = report.shipping_countries.iter().map(|c| c.country.as_str()).collect();
        assert_eq!(countries, vec!["Denmark", "Germany"]);

        let titles: Vec<_> = report.top_products.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Hat", "Scarf"]);
        assert_eq!(report.top_products[0].pct, 75.0);
    }

    #[tokio::test]
    async fn test_default_selection_and_empty_range() {
        let svc = service(fake(), HourBucketing::Round);
        let report = svc
            .get_realtime_sales(RealtimeSalesRequest::default(), date(20))
            .await
            .unwrap();

        assert_eq!(report.period, ReportPeriod { date_from: date(19), date_to: date(20) });
        assert!(report.hourly_sales.is_empty());
        assert!(report.shipping_countries.is_empty());
        assert!(report.top_products.is_empty());
        assert_eq!(report.scorecards.orders, 0);
        assert_eq!(report.scorecards.avg_basket, 0.0);
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected_before_loading() {
        let fake = fake();
        let svc = service(Arc::clone(&fake), HourBucketing::Round);
        let request = RealtimeSalesRequest {
            date_from: Some(date(5)),
            date_to: Some(date(2)),
        };

        let result = svc.get_realtime_sales(request, date(10)).await;
        assert!(matches!(result, Err(ReportError::Period(_))));
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn test_warehouse_failure_aborts_pass() {
        let svc = service(Arc::new(FakeWarehouse::failing()), HourBucketing::Round);
        let result = svc.get_realtime_sales(single_day(1), date(10)).await;
        assert!(matches!(result, Err(ReportError::Warehouse(_))));
    }

    #[tokio::test]
    async fn test_repeated_passes_share_cached_snapshots_until_refresh() {
        let fake = fake();
        let svc = service(Arc::clone(&fake), HourBucketing::Round);

        svc.get_realtime_sales(single_day(1), date(10)).await.unwrap();
        svc.get_realtime_sales(single_day(5), date(10)).await.unwrap();
        assert_eq!(fake.calls(), 2);

        assert_eq!(svc.refresh(), 2);
        svc.get_realtime_sales(single_day(1), date(10)).await.unwrap();
        assert_eq!(fake.calls(), 4);
    }
}
