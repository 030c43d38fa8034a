use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Reporting currency all monetary values are expressed in
pub const REPORTING_CURRENCY: &str = "DKK";

/// Request for the realtime sales dashboard
///
/// Both dates are optional: the backend defaults to yesterday..today and
/// uses `date_from` as the end date when only the start is given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealtimeSalesRequest {
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}

/// Response for the realtime sales dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeSalesResponse {
    /// Resolved date range after defaults and clamping
    pub period: ReportPeriod,
    /// Currency code of every monetary value (always "DKK")
    pub currency: String,
    /// Bar chart series, ascending by hour, one point per hour with orders
    pub hourly_sales: Vec<HourlySalesPoint>,
    pub scorecards: Scorecards,
    /// Bubble map points, one per geocoded country
    pub shipping_countries: Vec<CountryShipments>,
    /// Top 10 products by quantity
    pub top_products: Vec<TopProductRow>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySalesPoint {
    pub hour: DateTime<Utc>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecards {
    /// Sum of converted order totals, rounded to 2 decimals
    pub total_sales: f64,
    /// Abbreviated total, e.g. "1.2M"
    pub total_sales_display: String,
    /// Number of orders carrying a price
    pub orders: u64,
    /// Mean converted order total, rounded to 2 decimals (0 without orders)
    pub avg_basket: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryShipments {
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProductRow {
    pub title: String,
    pub quantity: f64,
    /// Share of the grand total quantity in percent, rounded to 2 decimals
    pub pct: f64,
}

/// Response of the manual refresh endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub invalidated: usize,
}
