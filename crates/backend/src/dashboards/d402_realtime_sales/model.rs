use chrono::{DateTime, Utc};

use crate::shared::currency::Currency;

/// One storefront order, prices already normalized to DKK
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub created_at: DateTime<Utc>,
    pub created_at_hour: DateTime<Utc>,
    pub shipping_address_country: Option<String>,
    pub shipping_address_country_code: Option<String>,
    pub presentment_currency: Currency,
    pub total_price: Option<f64>,
    pub total_price_converted: Option<f64>,
}

/// One line item row of the order ⟕ order_line join
///
/// Orders without lines still produce a row with the line fields empty.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub created_at: DateTime<Utc>,
    pub created_at_hour: DateTime<Utc>,
    pub order_id: Option<i64>,
    pub quantity: Option<f64>,
    pub title: Option<String>,
    pub variant_title: Option<String>,
    pub vendor: Option<String>,
}
