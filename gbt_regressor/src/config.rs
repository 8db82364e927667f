use serde::{Deserialize, Serialize};

use crate::error::GbtError;
use crate::models::{EvalSet, FitResult};

/// Hyperparameters for gradient-boosted regression trees.
///
/// | Parameter               | Default    |
/// |-------------------------|------------|
/// | `n_estimators`          | 1000       |
/// | `max_depth`             | 3          |
/// | `learning_rate`         | 0.01       |
/// | `early_stopping_rounds` | `Some(50)` |
/// | `reg_lambda`            | 1.0        |
/// | `min_child_weight`      | 1.0        |
/// | `n_bins`                | 256        |
/// | `verbose_every`         | 100        |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoosterConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    /// Rounds without improvement on the last eval set before training halts.
    pub early_stopping_rounds: Option<usize>,
    /// L2 penalty on leaf weights.
    pub reg_lambda: f64,
    /// Minimum hessian sum (sample count for squared error) in each child.
    pub min_child_weight: f64,
    pub n_bins: usize,
    /// Log eval scores every this many rounds; 0 disables the periodic log.
    pub verbose_every: usize,
}

impl Default for BoosterConfig {
    fn default() -> Self {
        Self {
            n_estimators: 1000,
            max_depth: 3,
            learning_rate: 0.01,
            early_stopping_rounds: Some(50),
            reg_lambda: 1.0,
            min_child_weight: 1.0,
            n_bins: 256,
            verbose_every: 100,
        }
    }
}

impl BoosterConfig {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    #[must_use]
    pub fn with_early_stopping_rounds(mut self, rounds: Option<usize>) -> Self {
        self.early_stopping_rounds = rounds;
        self
    }

    #[must_use]
    pub fn with_reg_lambda(mut self, reg_lambda: f64) -> Self {
        self.reg_lambda = reg_lambda;
        self
    }

    #[must_use]
    pub fn with_min_child_weight(mut self, min_child_weight: f64) -> Self {
        self.min_child_weight = min_child_weight;
        self
    }

    #[must_use]
    pub fn with_n_bins(mut self, n_bins: usize) -> Self {
        self.n_bins = n_bins;
        self
    }

    #[must_use]
    pub fn with_verbose_every(mut self, verbose_every: usize) -> Self {
        self.verbose_every = verbose_every;
        self
    }

    /// Check every hyperparameter against its allowed range.
    pub fn validate(&self) -> Result<(), GbtError> {
        if self.n_estimators == 0 {
            return Err(GbtError::InvalidEstimatorCount {
                n_estimators: self.n_estimators,
            });
        }
        if self.max_depth == 0 {
            return Err(GbtError::InvalidMaxDepth {
                max_depth: self.max_depth,
            });
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(GbtError::InvalidLearningRate {
                learning_rate: self.learning_rate,
            });
        }
        if !self.reg_lambda.is_finite() || self.reg_lambda < 0.0 {
            return Err(GbtError::InvalidRegLambda {
                reg_lambda: self.reg_lambda,
            });
        }
        if !(2..=u16::MAX as usize).contains(&self.n_bins) {
            return Err(GbtError::InvalidBinCount {
                n_bins: self.n_bins,
            });
        }
        Ok(())
    }

    /// Train a booster on row-major `features[sample][feature]`.
    ///
    /// Every entry of `eval_sets` is scored with RMSE after each round; early
    /// stopping watches the last one.
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        targets: &[f64],
        feature_names: &[String],
        eval_sets: &[EvalSet<'_>],
    ) -> Result<FitResult, GbtError> {
        crate::booster::train(self, features, targets, feature_names, eval_sets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BoosterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.n_estimators, 1000);
        assert_eq!(config.early_stopping_rounds, Some(50));
    }

    #[test]
    fn test_rejects_zero_estimators() {
        let err = BoosterConfig::new(0).validate().unwrap_err();
        assert!(matches!(err, GbtError::InvalidEstimatorCount { .. }));
    }

    #[test]
    fn test_rejects_bad_learning_rate() {
        for lr in [0.0, -0.1, 1.5, f64::NAN] {
            let err = BoosterConfig::new(10)
                .with_learning_rate(lr)
                .validate()
                .unwrap_err();
            assert!(matches!(err, GbtError::InvalidLearningRate { .. }));
        }
    }

    #[test]
    fn test_rejects_bin_count_out_of_range() {
        let err = BoosterConfig::new(10).with_n_bins(1).validate().unwrap_err();
        assert!(matches!(err, GbtError::InvalidBinCount { n_bins: 1 }));
        let err = BoosterConfig::new(10)
            .with_n_bins(70_000)
            .validate()
            .unwrap_err();
        assert!(matches!(err, GbtError::InvalidBinCount { .. }));
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = BoosterConfig::new(200).with_max_depth(5);
        let json = serde_json::to_string(&config).unwrap();
        let back: BoosterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
