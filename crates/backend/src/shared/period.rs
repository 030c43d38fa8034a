use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use thiserror::Error;

const SECONDS_PER_HOUR: i64 = 3600;
const HALF_HOUR_NANOS: i64 = 30 * 60 * 1_000_000_000;

/// How `created_at` is mapped to its hour bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HourBucketing {
    /// Nearest hour, exactly :30:00 rounds up
    #[default]
    Round,
    /// Start of the hour
    Floor,
}

impl HourBucketing {
    pub fn bucket(self, ts: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            HourBucketing::Round => round_to_hour(ts),
            HourBucketing::Floor => floor_to_hour(ts),
        }
    }
}

/// Truncates to the start of the hour
pub fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    let secs = ts.timestamp();
    let into_hour = secs.rem_euclid(SECONDS_PER_HOUR);
    ts - Duration::seconds(into_hour) - Duration::nanoseconds(i64::from(ts.timestamp_subsec_nanos()))
}

/// Rounds to the nearest hour, half-up at the 30 minute mark
pub fn round_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    let floor = floor_to_hour(ts);
    let offset = (ts - floor).num_nanoseconds().unwrap_or(0);
    if offset >= HALF_HOUR_NANOS {
        floor + Duration::hours(1)
    } else {
        floor
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("date_from {from} is after date_to {to}")]
    Inverted { from: NaiveDate, to: NaiveDate },
}

/// Inclusive calendar date range selected on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

impl DateRange {
    /// Apply the selector rules: yesterday..today by default, a missing end
    /// date equals the start date, the end date never exceeds today.
    pub fn resolve(
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, PeriodError> {
        let (from, to) = match (date_from, date_to) {
            (None, None) => (today.pred_opt().unwrap_or(today), today),
            (Some(from), None) => (from, from),
            (None, Some(to)) => (to, to),
            (Some(from), Some(to)) => (from, to),
        };
        let to = to.min(today);

        if from > to {
            return Err(PeriodError::Inverted { from, to });
        }

        Ok(Self {
            date_from: from,
            date_to: to,
        })
    }

    /// Midnight UTC of the start date
    pub fn start(&self) -> DateTime<Utc> {
        self.date_from.and_time(NaiveTime::MIN).and_utc()
    }

    /// 23:59:59 UTC of the end date
    pub fn end(&self) -> DateTime<Utc> {
        self.date_to.and_time(NaiveTime::MIN).and_utc() + Duration::seconds(86_399)
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start() && ts <= self.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_round_minute_29_down_31_up() {
        assert_eq!(round_to_hour(at(2024, 1, 1, 10, 29, 59)), at(2024, 1, 1, 10, 0, 0));
        assert_eq!(round_to_hour(at(2024, 1, 1, 10, 31, 0)), at(2024, 1, 1, 11, 0, 0));
    }

    #[test]
    fn test_round_half_hour_goes_up() {
        assert_eq!(round_to_hour(at(2024, 1, 1, 10, 30, 0)), at(2024, 1, 1, 11, 0, 0));
        let just_before = at(2024, 1, 1, 10, 29, 59) + Duration::milliseconds(999);
        assert_eq!(round_to_hour(just_before), at(2024, 1, 1, 10, 0, 0));
    }

    #[test]
    fn test_round_crosses_midnight() {
        assert_eq!(round_to_hour(at(2024, 1, 1, 23, 59, 0)), at(2024, 1, 2, 0, 0, 0));
        assert_eq!(round_to_hour(at(2024, 1, 2, 0, 0, 0)), at(2024, 1, 2, 0, 0, 0));
    }

    #[test]
    fn test_round_stays_within_next_hour() {
        let ts = at(2024, 3, 5, 7, 45, 12);
        let bucket = round_to_hour(ts);
        assert!(bucket >= floor_to_hour(ts));
        assert!(bucket <= floor_to_hour(ts) + Duration::hours(1));
    }

    #[test]
    fn test_floor() {
        let ts = at(2024, 1, 1, 10, 50, 0) + Duration::microseconds(250);
        assert_eq!(floor_to_hour(ts), at(2024, 1, 1, 10, 0, 0));
        assert_eq!(HourBucketing::Floor.bucket(ts), at(2024, 1, 1, 10, 0, 0));
        assert_eq!(HourBucketing::Round.bucket(ts), at(2024, 1, 1, 11, 0, 0));
    }

    #[test]
    fn test_range_bounds() {
        let range = DateRange::resolve(Some(date(2024, 1, 1)), Some(date(2024, 1, 1)), date(2024, 6, 1)).unwrap();
        assert_eq!(range.start(), at(2024, 1, 1, 0, 0, 0));
        assert_eq!(range.end(), at(2024, 1, 1, 23, 59, 59));
        assert!(range.contains(at(2024, 1, 1, 0, 0, 0)));
        assert!(range.contains(at(2024, 1, 1, 23, 0, 0)));
        assert!(!range.contains(at(2024, 1, 2, 0, 0, 0)));
        assert!(!range.contains(at(2023, 12, 31, 23, 0, 0)));
    }

    #[test]
    fn test_resolve_defaults_to_yesterday_and_today() {
        let range = DateRange::resolve(None, None, date(2024, 3, 1)).unwrap();
        assert_eq!(range.date_from, date(2024, 2, 29));
        assert_eq!(range.date_to, date(2024, 3, 1));
    }

    #[test]
    fn test_resolve_clamps_to_today() {
        let range = DateRange::resolve(Some(date(2024, 1, 1)), Some(date(2024, 12, 31)), date(2024, 2, 1)).unwrap();
        assert_eq!(range.date_to, date(2024, 2, 1));
    }

    #[test]
    fn test_resolve_single_date() {
        let range = DateRange::resolve(Some(date(2024, 1, 5)), None, date(2024, 2, 1)).unwrap();
        assert_eq!(range.date_from, date(2024, 1, 5));
        assert_eq!(range.date_to, date(2024, 1, 5));
    }

    #[test]
    fn test_resolve_rejects_inverted_range() {
        let err = DateRange::resolve(Some(date(2024, 1, 5)), Some(date(2024, 1, 1)), date(2024, 2, 1)).unwrap_err();
        assert_eq!(
            err,
            PeriodError::Inverted {
                from: date(2024, 1, 5),
                to: date(2024, 1, 1)
            }
        );

        // a start date in the future ends up after the clamped end date
        assert!(DateRange::resolve(Some(date(2024, 3, 1)), None, date(2024, 2, 1)).is_err());
    }
}
