use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use super::WarehouseError;

/// One result row, column name → JSON cell
pub type WarehouseRow = Map<String, Value>;

/// Text cell; null, missing and empty cells are `None`
pub fn cell_str(row: &WarehouseRow, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Numeric cell, accepting JSON numbers and numeric strings
pub fn cell_f64(row: &WarehouseRow, column: &str) -> Result<Option<f64>, WarehouseError> {
    match row.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| decode_error(column, s)),
        Some(other) => Err(decode_error(column, &other.to_string())),
    }
}

pub fn cell_i64(row: &WarehouseRow, column: &str) -> Result<Option<i64>, WarehouseError> {
    match row.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| decode_error(column, &n.to_string())),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| decode_error(column, s)),
        Some(other) => Err(decode_error(column, &other.to_string())),
    }
}

pub fn cell_timestamp(
    row: &WarehouseRow,
    column: &str,
) -> Result<Option<DateTime<Utc>>, WarehouseError> {
    match row.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .and_then(from_epoch_seconds)
            .map(Some)
            .ok_or_else(|| decode_error(column, &n.to_string())),
        Some(Value::String(s)) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| decode_error(column, s)),
        Some(other) => Err(decode_error(column, &other.to_string())),
    }
}

/// Parse the timestamp encodings the warehouse may return
///
/// RFC 3339, `YYYY-MM-DD HH:MM:SS[.f][ UTC]` and epoch seconds
/// (`1.7041041E9` is how the BigQuery REST API encodes TIMESTAMP).
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }

    let without_zone = text
        .strip_suffix(" UTC")
        .or_else(|| text.strip_suffix('Z'))
        .unwrap_or(text);
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(without_zone, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(ts) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(ts.with_timezone(&Utc));
    }

    text.parse::<f64>().ok().and_then(from_epoch_seconds)
}

fn from_epoch_seconds(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let micros = (value * 1_000_000.0).round() as i64;
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(secs, nanos)
}

fn decode_error(column: &str, value: &str) -> WarehouseError {
    WarehouseError::Decode(format!("column '{}' has unexpected value '{}'", column, value))
}
