//! Demand CSV ingestion into timestamp-ordered records.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use polars::prelude::*;

use crate::error::ForecastError;
use crate::settlement::{parse_settlement_date, parse_settlement_period, settlement_timestamp};

pub const DATE_COLUMN: &str = "SETTLEMENT_DATE";
pub const PERIOD_COLUMN: &str = "SETTLEMENT_PERIOD";
pub const DEMAND_COLUMN: &str = "ND";
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// One half-hourly settlement period of national demand.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandRecord {
    pub timestamp: NaiveDateTime,
    pub settlement_period: i64,
    pub demand_mw: f64,
}

pub struct DemandLoader {
    show_progress: bool,
}

impl DemandLoader {
    pub fn new(show_progress: bool) -> Self {
        Self { show_progress }
    }

    /// Expand configured inputs. Plain paths pass through; glob patterns
    /// expand in sorted order and must match at least one file.
    pub fn resolve_inputs(inputs: &[String]) -> Result<Vec<PathBuf>, ForecastError> {
        let mut paths = Vec::new();
        for input in inputs {
            if !input.contains(['*', '?', '[']) {
                paths.push(PathBuf::from(input));
                continue;
            }

            let mut matched: Vec<PathBuf> = glob(input)
                .map_err(|source| ForecastError::InvalidInputPattern {
                    pattern: input.clone(),
                    source,
                })?
                .filter_map(Result::ok)
                .collect();
            if matched.is_empty() {
                return Err(ForecastError::InputNotFound {
                    path: PathBuf::from(input),
                });
            }
            matched.sort();
            paths.extend(matched);
        }
        Ok(paths)
    }

    /// Read one demand CSV into records, in file order.
    pub fn load_file(&self, path: &Path) -> Result<Vec<DemandRecord>, ForecastError> {
        if !path.is_file() {
            return Err(ForecastError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|source| ForecastError::ReadCsv {
                path: path.to_path_buf(),
                source,
            })?;

        for column in [DATE_COLUMN, PERIOD_COLUMN, DEMAND_COLUMN] {
            if df.get_column_index(column).is_none() {
                return Err(ForecastError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                });
            }
        }

        let date_series = df.column(DATE_COLUMN)?.cast(&DataType::String)?;
        // Periods are parsed from text so "1.5" or "x" are reported, not truncated.
        let period_series = df.column(PERIOD_COLUMN)?.cast(&DataType::String)?;
        let demand_series = df
            .column(DEMAND_COLUMN)?
            .strict_cast(&DataType::Float64)
            .map_err(|source| ForecastError::ReadCsv {
                path: path.to_path_buf(),
                source,
            })?;
        let dates = date_series.str()?;
        let periods = period_series.str()?;
        let demand = demand_series.f64()?;

        let mut records = Vec::with_capacity(df.height());
        for (idx, ((date, period), nd)) in dates
            .into_iter()
            .zip(periods.into_iter())
            .zip(demand.into_iter())
            .enumerate()
        {
            let row = idx + 1;
            let null = |column: &str| ForecastError::NullValue {
                path: path.to_path_buf(),
                row,
                column: column.to_string(),
            };

            let raw_date = date.ok_or_else(|| null(DATE_COLUMN))?;
            let raw_period = period.ok_or_else(|| null(PERIOD_COLUMN))?;
            let demand_mw = nd.ok_or_else(|| null(DEMAND_COLUMN))?;

            let date = parse_settlement_date(raw_date).ok_or_else(|| {
                ForecastError::InvalidSettlementDate {
                    path: path.to_path_buf(),
                    row,
                    value: raw_date.to_string(),
                }
            })?;
            let period = parse_settlement_period(raw_period).ok_or_else(|| {
                ForecastError::MalformedSettlementPeriod {
                    path: path.to_path_buf(),
                    row,
                    value: raw_period.to_string(),
                }
            })?;
            let timestamp = settlement_timestamp(date, period).map_err(|_| {
                ForecastError::InvalidSettlementPeriodAt {
                    path: path.to_path_buf(),
                    row,
                    period,
                }
            })?;

            records.push(DemandRecord {
                timestamp,
                settlement_period: period,
                demand_mw,
            });
        }

        debug!("Read {} records from {}", records.len(), path.display());
        Ok(records)
    }

    /// Load and concatenate every file, then sort chronologically.
    ///
    /// The sort is stable, so rows sharing a timestamp keep input order.
    pub fn load_all(&self, paths: &[PathBuf]) -> Result<Vec<DemandRecord>, ForecastError> {
        let pb = if self.show_progress {
            ProgressBar::new(paths.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut records = Vec::new();
        for path in paths {
            pb.set_message(path.display().to_string());
            records.extend(self.load_file(path)?);
            pb.inc(1);
        }
        pb.finish_and_clear();

        if records.is_empty() {
            return Err(ForecastError::EmptyDataset);
        }

        records.sort_by_key(|r| r.timestamp);

        info!(
            "Loaded {} demand records from {} files ({} to {})",
            records.len(),
            paths.len(),
            records[0].timestamp,
            records[records.len() - 1].timestamp
        );
        Ok(records)
    }
}

/// Build the timestamp-ordered table the feature stages work on.
pub fn records_to_frame(records: &[DemandRecord]) -> Result<DataFrame, ForecastError> {
    let millis: Vec<i64> = records
        .iter()
        .map(|r| r.timestamp.and_utc().timestamp_millis())
        .collect();
    let periods: Vec<i64> = records.iter().map(|r| r.settlement_period).collect();
    let demand: Vec<f64> = records.iter().map(|r| r.demand_mw).collect();

    let timestamp = Series::new(TIMESTAMP_COLUMN.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

    let df = DataFrame::new(vec![
        timestamp,
        Series::new(PERIOD_COLUMN.into(), periods),
        Series::new(DEMAND_COLUMN.into(), demand),
    ])?;
    Ok(df)
}

/// Read the `timestamp` column back as naive datetimes.
pub fn frame_timestamps(df: &DataFrame) -> Result<Vec<NaiveDateTime>, ForecastError> {
    if df.get_column_index(TIMESTAMP_COLUMN).is_none() {
        return Err(ForecastError::MissingColumn {
            path: PathBuf::from("<frame>"),
            column: TIMESTAMP_COLUMN.to_string(),
        });
    }
    let millis = df.column(TIMESTAMP_COLUMN)?.cast(&DataType::Int64)?;
    let values = millis
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(idx, ms)| {
            ms.and_then(DateTime::from_timestamp_millis)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| ForecastError::NullValue {
                    path: PathBuf::from("<frame>"),
                    row: idx + 1,
                    column: TIMESTAMP_COLUMN.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(values)
}

/// Read a numeric column as `f64`.
pub fn frame_f64(df: &DataFrame, column: &str) -> Result<Vec<f64>, ForecastError> {
    if df.get_column_index(column).is_none() {
        return Err(ForecastError::MissingColumn {
            path: PathBuf::from("<frame>"),
            column: column.to_string(),
        });
    }
    let series = df.column(column)?.cast(&DataType::Float64)?;
    let values = series
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(idx, v)| {
            v.ok_or_else(|| ForecastError::NullValue {
                path: PathBuf::from("<frame>"),
                row: idx + 1,
                column: column.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(values)
}
