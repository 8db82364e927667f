//! Calendar features and cyclic encoding for the demand table.

use std::f64::consts::PI;

use chrono::{Datelike, Timelike};
use log::debug;
use polars::prelude::*;

use crate::demand_loader::{frame_f64, frame_timestamps, DEMAND_COLUMN};
use crate::error::ForecastError;

/// Model inputs, in the column order the booster is trained on.
pub const FEATURES: [&str; 8] = [
    "dayofyear",
    "hour_sin",
    "hour_cos",
    "dayofweek",
    "quarter",
    "month_sin",
    "month_cos",
    "year",
];

pub const TARGET: &str = DEMAND_COLUMN;

pub const MONTH_PERIOD: f64 = 12.0;
pub const HOUR_PERIOD: f64 = 24.0;

/// Append hour, dayofweek (Monday = 0), quarter, month, year, dayofyear,
/// dayofmonth and ISO weekofyear, all derived from `timestamp`.
pub fn add_calendar_features(df: &DataFrame) -> Result<DataFrame, ForecastError> {
    let timestamps = frame_timestamps(df)?;
    let n = timestamps.len();

    let mut hour = Vec::with_capacity(n);
    let mut dayofweek = Vec::with_capacity(n);
    let mut quarter = Vec::with_capacity(n);
    let mut month = Vec::with_capacity(n);
    let mut year = Vec::with_capacity(n);
    let mut dayofyear = Vec::with_capacity(n);
    let mut dayofmonth = Vec::with_capacity(n);
    let mut weekofyear = Vec::with_capacity(n);

    for ts in &timestamps {
        hour.push(ts.hour() as i32);
        dayofweek.push(ts.weekday().num_days_from_monday() as i32);
        quarter.push(((ts.month() - 1) / 3 + 1) as i32);
        month.push(ts.month() as i32);
        year.push(ts.year());
        dayofyear.push(ts.ordinal() as i32);
        dayofmonth.push(ts.day() as i32);
        weekofyear.push(ts.iso_week().week() as i32);
    }

    let mut out = df.clone();
    for (name, values) in [
        ("hour", hour),
        ("dayofweek", dayofweek),
        ("quarter", quarter),
        ("month", month),
        ("year", year),
        ("dayofyear", dayofyear),
        ("dayofmonth", dayofmonth),
        ("weekofyear", weekofyear),
    ] {
        out.with_column(Series::new(name.into(), values))?;
    }

    debug!("Derived calendar features for {} rows", n);
    Ok(out)
}

/// Map a periodic value onto the unit circle.
pub fn cyclic_pair(value: f64, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * value / period;
    (angle.sin(), angle.cos())
}

/// Replace `column` with `<column>_sin` and `<column>_cos`.
pub fn encode_cyclic_feature(
    df: &DataFrame,
    column: &str,
    period: f64,
) -> Result<DataFrame, ForecastError> {
    if !period.is_finite() || period <= 0.0 {
        return Err(ForecastError::InvalidCyclePeriod {
            column: column.to_string(),
            period,
        });
    }

    let values = frame_f64(df, column)?;
    let (sin, cos): (Vec<f64>, Vec<f64>) =
        values.iter().map(|v| cyclic_pair(*v, period)).unzip();

    let mut out = df.clone();
    out.with_column(Series::new(format!("{column}_sin").into(), sin))?;
    out.with_column(Series::new(format!("{column}_cos").into(), cos))?;
    Ok(out.drop(column)?)
}

/// The full transform: calendar features, then month and hour encoded.
pub fn build_feature_table(df: &DataFrame) -> Result<DataFrame, ForecastError> {
    let df = add_calendar_features(df)?;
    let df = encode_cyclic_feature(&df, "month", MONTH_PERIOD)?;
    encode_cyclic_feature(&df, "hour", HOUR_PERIOD)
}

/// Row-major feature matrix in `FEATURES` order, plus the target column.
pub fn feature_matrix(df: &DataFrame) -> Result<(Vec<Vec<f64>>, Vec<f64>), ForecastError> {
    let columns = FEATURES
        .iter()
        .map(|name| frame_f64(df, name))
        .collect::<Result<Vec<_>, _>>()?;

    let rows = (0..df.height())
        .map(|i| columns.iter().map(|c| c[i]).collect())
        .collect();
    let target = frame_f64(df, TARGET)?;
    Ok((rows, target))
}

pub fn feature_names() -> Vec<String> {
    FEATURES.iter().map(|f| f.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand_loader::{records_to_frame, DemandRecord};
    use chrono::NaiveDate;

    fn frame(stamps: &[(i32, u32, u32, u32, u32)]) -> DataFrame {
        let records: Vec<DemandRecord> = stamps
            .iter()
            .enumerate()
            .map(|(i, &(y, m, d, h, min))| DemandRecord {
                timestamp: NaiveDate::from_ymd_opt(y, m, d)
                    .unwrap()
                    .and_hms_opt(h, min, 0)
                    .unwrap(),
                settlement_period: (h * 2 + min / 30 + 1) as i64,
                demand_mw: 20000.0 + i as f64,
            })
            .collect();
        records_to_frame(&records).unwrap()
    }

    fn i32_column(df: &DataFrame, name: &str) -> Vec<i32> {
        df.column(name)
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect()
    }

    #[test]
    fn test_calendar_features_for_known_date() {
        // 2023-01-02 was a Monday.
        let df = add_calendar_features(&frame(&[(2023, 1, 2, 13, 30)])).unwrap();

        assert_eq!(i32_column(&df, "hour"), vec![13]);
        assert_eq!(i32_column(&df, "dayofweek"), vec![0]);
        assert_eq!(i32_column(&df, "quarter"), vec![1]);
        assert_eq!(i32_column(&df, "month"), vec![1]);
        assert_eq!(i32_column(&df, "year"), vec![2023]);
        assert_eq!(i32_column(&df, "dayofyear"), vec![2]);
        assert_eq!(i32_column(&df, "dayofmonth"), vec![2]);
        assert_eq!(i32_column(&df, "weekofyear"), vec![1]);
    }

    #[test]
    fn test_calendar_features_year_edges() {
        let df = add_calendar_features(&frame(&[
            (2020, 12, 31, 23, 30),
            (2021, 1, 1, 0, 0),
        ]))
        .unwrap();

        assert_eq!(i32_column(&df, "dayofyear"), vec![366, 1]);
        assert_eq!(i32_column(&df, "quarter"), vec![4, 1]);
        // 2020-12-31 is Thursday of ISO week 53; 2021-01-01 still belongs to it.
        assert_eq!(i32_column(&df, "weekofyear"), vec![53, 53]);
        assert_eq!(i32_column(&df, "dayofweek"), vec![3, 4]);
    }

    #[test]
    fn test_cyclic_pair_on_unit_circle() {
        for period in [12.0, 24.0] {
            for v in 0..=(period as usize) {
                let (s, c) = cyclic_pair(v as f64, period);
                assert!((s * s + c * c - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_cyclic_pair_wraps() {
        let (s0, c0) = cyclic_pair(0.0, 12.0);
        let (s12, c12) = cyclic_pair(12.0, 12.0);
        assert!((s0 - s12).abs() < 1e-9);
        assert!((c0 - c12).abs() < 1e-9);

        let (s, c) = cyclic_pair(6.0, 24.0);
        assert!((s - 1.0).abs() < 1e-9);
        assert!(c.abs() < 1e-9);
    }

    #[test]
    fn test_encode_replaces_column() {
        let df = add_calendar_features(&frame(&[(2023, 3, 1, 0, 0)])).unwrap();
        let encoded = encode_cyclic_feature(&df, "month", MONTH_PERIOD).unwrap();

        assert!(encoded.get_column_index("month").is_none());
        let sin = frame_f64(&encoded, "month_sin").unwrap();
        let cos = frame_f64(&encoded, "month_cos").unwrap();
        assert!((sin[0] - 1.0).abs() < 1e-9);
        assert!(cos[0].abs() < 1e-9);
    }

    #[test]
    fn test_encoding_is_order_independent() {
        let df = add_calendar_features(&frame(&[(2022, 7, 14, 9, 30), (2022, 11, 2, 18, 0)]))
            .unwrap();

        let a = encode_cyclic_feature(
            &encode_cyclic_feature(&df, "month", MONTH_PERIOD).unwrap(),
            "hour",
            HOUR_PERIOD,
        )
        .unwrap();
        let b = encode_cyclic_feature(
            &encode_cyclic_feature(&df, "hour", HOUR_PERIOD).unwrap(),
            "month",
            MONTH_PERIOD,
        )
        .unwrap();

        for name in ["month_sin", "month_cos", "hour_sin", "hour_cos"] {
            assert_eq!(frame_f64(&a, name).unwrap(), frame_f64(&b, name).unwrap());
        }
    }

    #[test]
    fn test_encode_errors() {
        let df = frame(&[(2023, 1, 1, 0, 0)]);
        assert!(matches!(
            encode_cyclic_feature(&df, "month", 12.0),
            Err(ForecastError::MissingColumn { .. })
        ));
        let df = add_calendar_features(&df).unwrap();
        assert!(matches!(
            encode_cyclic_feature(&df, "month", 0.0),
            Err(ForecastError::InvalidCyclePeriod { .. })
        ));
    }

    #[test]
    fn test_feature_matrix_order() {
        let df = build_feature_table(&frame(&[(2021, 4, 5, 6, 0), (2021, 4, 5, 6, 30)])).unwrap();
        let (rows, target) = feature_matrix(&df).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), FEATURES.len());
        assert_eq!(rows[0][0], 95.0); // dayofyear
        assert_eq!(rows[0][3], 0.0); // Monday
        assert_eq!(rows[0][4], 2.0); // quarter
        assert_eq!(rows[0][7], 2021.0);
        assert_eq!(target, vec![20000.0, 20001.0]);
    }
}
