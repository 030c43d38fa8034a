use contracts::dashboards::d402_realtime_sales::CountryShipments;
use std::collections::HashMap;

use super::model::Order;
use crate::shared::geo_lookup::GeoLookup;
use crate::shared::period::DateRange;

/// Bubble map points: orders per shipping country in range
///
/// Countries missing from the lookup (and orders without a country) are
/// left off the map; they still count in the scorecards. Sorted by count
/// descending, then country name.
pub fn shipping_countries(
    orders: &[Order],
    geo: &GeoLookup,
    range: &DateRange,
) -> Vec<CountryShipments> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for order in orders.iter().filter(|o| range.contains(o.created_at_hour)) {
        if let Some(country) = order.shipping_address_country.as_deref() {
            *counts.entry(country).or_insert(0) += 1;
        }
    }

    let mut unmatched = 0usize;
    let mut points: Vec<CountryShipments> = counts
        .into_iter()
        .filter_map(|(country, count)| match geo.get(country) {
            Some(point) => Some(CountryShipments {
                country: country.to_string(),
                latitude: point.latitude,
                longitude: point.longitude,
                count,
            }),
            None => {
                unmatched += 1;
                None
            }
        })
        .collect();

    if unmatched > 0 {
        tracing::debug!("D402: {} shipping countries without coordinates", unmatched);
    }

    points.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.country.cmp(&b.country)));
    points
}
