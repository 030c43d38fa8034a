use chrono::{DateTime, Utc};
use contracts::dashboards::d402_realtime_sales::{HourlySalesPoint, Scorecards, TopProductRow};
use std::collections::BTreeMap;

use super::model::{Order, OrderLine};
use crate::shared::format::{millify, round2};
use crate::shared::period::DateRange;

fn orders_in_range<'a>(orders: &'a [Order], range: &'a DateRange) -> impl Iterator<Item = &'a Order> {
    orders.iter().filter(move |o| range.contains(o.created_at_hour))
}

/// Bar chart series: converted sales summed per hour bucket, ascending
///
/// Only hours with at least one order appear.
pub fn hourly_sales(orders: &[Order], range: &DateRange) -> Vec<HourlySalesPoint> {
    let mut by_hour: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
    for order in orders_in_range(orders, range) {
        *by_hour.entry(order.created_at_hour).or_insert(0.0) +=
            order.total_price_converted.unwrap_or(0.0);
    }

    by_hour
        .into_iter()
        .map(|(hour, total)| HourlySalesPoint { hour, total })
        .collect()
}

/// Total sales, order count and average basket for the range
pub fn scorecards(orders: &[Order], range: &DateRange) -> Scorecards {
    let (sum, count) = orders_in_range(orders, range)
        .filter_map(|o| o.total_price_converted)
        .fold((0.0_f64, 0_u64), |(sum, count), price| (sum + price, count + 1));

    let total_sales = round2(sum);
    let avg_basket = if count > 0 {
        round2(sum / count as f64)
    } else {
        0.0
    };

    Scorecards {
        total_sales,
        total_sales_display: millify(total_sales, 2),
        orders: count,
        avg_basket,
    }
}

/// Every titled product in range ranked by summed quantity
///
/// Equal quantities keep ascending title order. `pct` is the share of the
/// grand total quantity.
pub fn product_ranking(lines: &[OrderLine], range: &DateRange) -> Vec<TopProductRow> {
    let mut by_title: BTreeMap<&str, f64> = BTreeMap::new();
    for line in lines.iter().filter(|l| range.contains(l.created_at_hour)) {
        if let Some(title) = line.title.as_deref() {
            *by_title.entry(title).or_insert(0.0) += line.quantity.unwrap_or(0.0);
        }
    }

    let grand_total: f64 = by_title.values().sum();
    let mut ranking: Vec<TopProductRow> = by_title
        .into_iter()
        .map(|(title, quantity)| TopProductRow {
            title: title.to_string(),
            quantity,
            pct: if grand_total > 0.0 {
                round2(quantity / grand_total * 100.0)
            } else {
                0.0
            },
        })
        .collect();

    // stable: ties stay in title order
    ranking.sort_by(|a, b| b.quantity.total_cmp(&a.quantity));
    ranking
}

pub fn top_products(lines: &[OrderLine], range: &DateRange, limit: usize) -> Vec<TopProductRow> {
    let mut ranking = product_ranking(lines, range);
    ranking.truncate(limit);
    ranking
}
