//! Settlement date + half-hourly period to absolute timestamps.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use crate::error::ForecastError;

pub const PERIODS_PER_DAY: i64 = 48;
pub const PERIOD_MINUTES: i64 = 30;

/// Start of a settlement period: `date + (period - 1) * 30 min`.
///
/// Periods outside `1..=48` are rejected rather than rolled into a
/// neighbouring day. This includes periods 49 and 50 of the autumn
/// clock-change day, so exports covering late October fail to load until
/// those rows are removed.
pub fn settlement_timestamp(date: NaiveDate, period: i64) -> Result<NaiveDateTime, ForecastError> {
    if !(1..=PERIODS_PER_DAY).contains(&period) {
        return Err(ForecastError::InvalidSettlementPeriod { period });
    }
    Ok(date.and_time(chrono::NaiveTime::MIN) + Duration::minutes((period - 1) * PERIOD_MINUTES))
}

/// Parse a settlement period cell. Integer-valued floats such as `"12.0"`
/// are accepted; fractional or non-numeric text is not.
pub fn parse_settlement_period(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(period) = value.parse::<i64>() {
        return Some(period);
    }
    let period = value.parse::<f64>().ok()?;
    if period.is_finite() && period.fract() == 0.0 && period.abs() < i64::MAX as f64 {
        Some(period as i64)
    } else {
        None
    }
}

/// Parse the date formats seen in demand data exports.
///
/// Accepts `2023-01-01`, `01-JAN-2023`, `2023-01-01 00:00:00`,
/// `2023-01-01T00:00:00` and RFC 3339 with an offset. For offset timestamps
/// the local calendar date is kept.
pub fn parse_settlement_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%d-%b-%Y") {
        return Some(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|datetime| datetime.date_naive())
}
