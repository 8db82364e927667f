pub mod booster;
pub mod config;
pub mod error;
pub mod histogram;
pub mod importance;
pub mod metrics;
pub mod models;
pub mod serialize;
pub mod tree;

pub use booster::GradientBoostedRegressor;
pub use config::BoosterConfig;
pub use error::GbtError;
pub use importance::RankedFeature;
pub use metrics::{mae, rmse};
pub use models::{EvalRecord, EvalSet, FitResult};
pub use tree::RegressionTree;
