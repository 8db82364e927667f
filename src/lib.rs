//! Half-hourly national demand (ND) forecasting.
//!
//! Demand CSVs are loaded and ordered by settlement timestamp, expanded into
//! calendar features, split chronologically, and fed to a gradient-boosted
//! regressor from the `gbt_regressor` crate.

pub mod config;
pub mod demand_loader;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod settlement;
pub mod split;
pub mod visualization;

pub use config::{ModelParams, PipelineConfig, RunMode};
pub use demand_loader::{DemandLoader, DemandRecord};
pub use error::ForecastError;
pub use pipeline::{ForecastPipeline, PipelineReport};
