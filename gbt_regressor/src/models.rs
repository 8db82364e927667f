use serde::{Deserialize, Serialize};

use crate::booster::GradientBoostedRegressor;
use crate::importance::RankedFeature;

/// A named validation set scored after every boosting round.
#[derive(Debug, Clone, Copy)]
pub struct EvalSet<'a> {
    pub name: &'a str,
    pub features: &'a [Vec<f64>],
    pub targets: &'a [f64],
}

impl<'a> EvalSet<'a> {
    pub fn new(name: &'a str, features: &'a [Vec<f64>], targets: &'a [f64]) -> Self {
        Self {
            name,
            features,
            targets,
        }
    }
}

/// RMSE of every eval set after one boosting round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRecord {
    pub iteration: usize,
    pub scores: Vec<(String, f64)>,
}

impl EvalRecord {
    pub fn score(&self, name: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|(set, _)| set == name)
            .map(|(_, score)| *score)
    }
}

/// Outcome of a training run.
#[derive(Debug, Clone)]
pub struct FitResult {
    pub model: GradientBoostedRegressor,
    pub history: Vec<EvalRecord>,
    /// Zero-based round with the lowest score on the watched eval set.
    pub best_iteration: Option<usize>,
    pub best_score: Option<f64>,
    pub rounds_trained: usize,
    pub stopped_early: bool,
}

impl FitResult {
    pub fn into_model(self) -> GradientBoostedRegressor {
        self.model
    }

    pub fn importances(&self) -> Vec<RankedFeature> {
        self.model.ranked_importances()
    }
}
