//! Run configuration: JSON file plus defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gbt_regressor::BoosterConfig;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// Whether the pipeline fits a new model or scores with a persisted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Train,
    Inference,
}

/// Booster hyperparameters as they appear in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub early_stopping_rounds: Option<usize>,
    pub reg_lambda: f64,
    pub n_bins: usize,
    pub verbose_every: usize,
}

impl Default for ModelParams {
    fn default() -> Self {
        let booster = BoosterConfig::default();
        Self {
            n_estimators: booster.n_estimators,
            max_depth: booster.max_depth,
            learning_rate: booster.learning_rate,
            early_stopping_rounds: booster.early_stopping_rounds,
            reg_lambda: booster.reg_lambda,
            n_bins: booster.n_bins,
            verbose_every: booster.verbose_every,
        }
    }
}

impl ModelParams {
    pub fn booster_config(&self) -> BoosterConfig {
        BoosterConfig::new(self.n_estimators)
            .with_max_depth(self.max_depth)
            .with_learning_rate(self.learning_rate)
            .with_early_stopping_rounds(self.early_stopping_rounds)
            .with_reg_lambda(self.reg_lambda)
            .with_n_bins(self.n_bins)
            .with_verbose_every(self.verbose_every)
    }
}

/// Everything a pipeline run needs. Every field has a default, so a config
/// file only lists what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Demand CSV paths or glob patterns, oldest year first.
    pub input_files: Vec<String>,
    pub model_path: PathBuf,
    pub output_dir: PathBuf,
    pub train_fraction: f64,
    pub mode: RunMode,
    /// Persist the model after training.
    pub save_model: bool,
    /// Add boxplots and the feature-importance chart.
    pub diagnostics: bool,
    pub render_plots: bool,
    pub model: ModelParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_files: vec![
                "demanddata_2020.csv".to_string(),
                "demanddata_2021.csv".to_string(),
                "demanddata_2022.csv".to_string(),
                "demanddata.csv".to_string(),
            ],
            model_path: PathBuf::from("demand_model.json"),
            output_dir: PathBuf::from("images"),
            train_fraction: 0.8,
            mode: RunMode::Train,
            save_model: true,
            diagnostics: false,
            render_plots: true,
            model: ModelParams::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file; missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        if !(0.0..=1.0).contains(&self.train_fraction) {
            return Err(ForecastError::InvalidTrainFraction {
                fraction: self.train_fraction,
            });
        }
        self.model.booster_config().validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_run() {
        let config = PipelineConfig::default();
        assert_eq!(config.input_files.len(), 4);
        assert_eq!(config.train_fraction, 0.8);
        assert_eq!(config.model.n_estimators, 1000);
        assert_eq!(config.model.max_depth, 3);
        assert_eq!(config.model.learning_rate, 0.01);
        assert_eq!(config.model.early_stopping_rounds, Some(50));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "mode": "inference", "diagnostics": true, "model": { "max_depth": 5 } }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.mode, RunMode::Inference);
        assert!(config.diagnostics);
        assert_eq!(config.model.max_depth, 5);
        assert_eq!(config.model.n_estimators, 1000);
        assert_eq!(config.output_dir, PathBuf::from("images"));
    }

    #[test]
    fn test_invalid_train_fraction() {
        let config = PipelineConfig {
            train_fraction: 1.2,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ForecastError::InvalidTrainFraction { .. }
        ));
    }

    #[test]
    fn test_invalid_model_params_surface_as_model_error() {
        let mut config = PipelineConfig::default();
        config.model.learning_rate = 0.0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ForecastError::Model(_)
        ));
    }

    #[test]
    fn test_booster_config_carries_params() {
        let params = ModelParams {
            n_estimators: 42,
            max_depth: 6,
            ..ModelParams::default()
        };
        let booster = params.booster_config();
        assert_eq!(booster.n_estimators, 42);
        assert_eq!(booster.max_depth, 6);
    }
}
