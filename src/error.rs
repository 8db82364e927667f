use std::path::PathBuf;

use gbt_regressor::GbtError;
use polars::prelude::PolarsError;

/// Fatal pipeline failures. Nothing in the pipeline retries.
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("input pattern '{pattern}' is invalid")]
    InvalidInputPattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("failed to read CSV {path}")]
    ReadCsv { path: PathBuf, source: PolarsError },

    #[error("{path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("{path} row {row}: column '{column}' is empty")]
    NullValue {
        path: PathBuf,
        row: usize,
        column: String,
    },

    #[error("{path} row {row}: cannot parse settlement date '{value}'")]
    InvalidSettlementDate {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("settlement period {period} is outside 1..=48 (autumn clock-change periods 49 and 50 are not supported)")]
    InvalidSettlementPeriod { period: i64 },

    #[error("{path} row {row}: settlement period {period} is outside 1..=48 (autumn clock-change periods 49 and 50 are not supported)")]
    InvalidSettlementPeriodAt {
        path: PathBuf,
        row: usize,
        period: i64,
    },

    #[error("{path} row {row}: settlement period '{value}' is not a whole number")]
    MalformedSettlementPeriod {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("cycle period for '{column}' must be positive and finite, got {period}")]
    InvalidCyclePeriod { column: String, period: f64 },

    #[error("train fraction must be in [0, 1], got {fraction}")]
    InvalidTrainFraction { fraction: f64 },

    #[error("no demand records were loaded")]
    EmptyDataset,

    #[error("model artifact not found: {path}")]
    ArtifactNotFound { path: PathBuf },

    #[error("model was trained on features {model:?}, pipeline provides {pipeline:?}")]
    FeatureMismatch {
        model: Vec<String>,
        pipeline: Vec<String>,
    },

    #[error(transparent)]
    Model(#[from] GbtError),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}
