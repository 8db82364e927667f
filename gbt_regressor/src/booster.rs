use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::BoosterConfig;
use crate::error::GbtError;
use crate::histogram::FeatureBins;
use crate::importance::{self, RankedFeature};
use crate::metrics::root_mean_squared;
use crate::models::{EvalRecord, EvalSet, FitResult};
use crate::tree::{RegressionTree, TreeParams};

/// A fitted squared-error gradient-boosted tree ensemble.
///
/// Prediction is `base_score` plus the sum of every tree's leaf value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedRegressor {
    pub(crate) trees: Vec<RegressionTree>,
    pub(crate) base_score: f64,
    pub(crate) n_features: usize,
    pub(crate) feature_names: Vec<String>,
    pub(crate) best_iteration: Option<usize>,
}

impl GradientBoostedRegressor {
    pub fn predict(&self, sample: &[f64]) -> Result<f64, GbtError> {
        if sample.len() != self.n_features {
            return Err(GbtError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        Ok(self.predict_row(sample))
    }

    /// Predict every row of a row-major matrix in parallel.
    pub fn predict_batch(&self, samples: &[Vec<f64>]) -> Result<Vec<f64>, GbtError> {
        if let Some(row) = samples.iter().find(|r| r.len() != self.n_features) {
            return Err(GbtError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: row.len(),
            });
        }
        Ok(samples.par_iter().map(|row| self.predict_row(row)).collect())
    }

    fn predict_row(&self, sample: &[f64]) -> f64 {
        self.base_score
            + self
                .trees
                .iter()
                .map(|tree| tree.predict_row(sample))
                .sum::<f64>()
    }

    /// Normalized total-gain importance, aligned with the training columns.
    pub fn feature_importances(&self) -> Vec<f64> {
        let per_tree: Vec<Vec<f64>> = self.trees.iter().map(|t| t.gain_by_feature()).collect();
        importance::total_gain(&per_tree, self.n_features)
    }

    pub fn ranked_importances(&self) -> Vec<RankedFeature> {
        importance::rank(&self.feature_importances(), &self.feature_names)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn best_iteration(&self) -> Option<usize> {
        self.best_iteration
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

fn validate_matrix(features: &[Vec<f64>], n_features: usize) -> Result<(), GbtError> {
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(GbtError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(GbtError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(())
}

fn validate_eval_set(set: &EvalSet<'_>, n_features: usize) -> Result<(), GbtError> {
    let invalid = |reason: String| GbtError::InvalidEvalSet {
        name: set.name.to_string(),
        reason,
    };
    if set.targets.is_empty() {
        return Err(invalid("no samples".to_string()));
    }
    if set.features.len() != set.targets.len() {
        return Err(invalid(format!(
            "{} feature rows but {} targets",
            set.features.len(),
            set.targets.len()
        )));
    }
    if let Some(row) = set.features.iter().find(|r| r.len() != n_features) {
        return Err(invalid(format!(
            "row has {} features, expected {}",
            row.len(),
            n_features
        )));
    }
    Ok(())
}

/// Boosting loop: one tree per round on the current residuals, eval sets
/// scored after every round, optional early stopping on the last set.
pub(crate) fn train(
    config: &BoosterConfig,
    features: &[Vec<f64>],
    targets: &[f64],
    feature_names: &[String],
    eval_sets: &[EvalSet<'_>],
) -> Result<FitResult, GbtError> {
    config.validate()?;

    if features.is_empty() {
        return Err(GbtError::EmptyDataset);
    }
    let n_samples = features.len();
    let n_features = features[0].len();
    if n_features == 0 {
        return Err(GbtError::ZeroFeatures);
    }
    if targets.len() != n_samples {
        return Err(GbtError::TargetLengthMismatch {
            n_samples,
            n_targets: targets.len(),
        });
    }
    if feature_names.len() != n_features {
        return Err(GbtError::FeatureNameMismatch {
            n_features,
            n_names: feature_names.len(),
        });
    }
    validate_matrix(features, n_features)?;
    if let Some(sample_index) = targets.iter().position(|t| !t.is_finite()) {
        return Err(GbtError::NonFiniteTarget { sample_index });
    }
    for set in eval_sets {
        validate_eval_set(set, n_features)?;
    }

    info!(
        "Training booster: {} samples, {} features, up to {} rounds (depth {}, eta {})",
        n_samples, n_features, config.n_estimators, config.max_depth, config.learning_rate
    );

    let columns: Vec<Vec<f64>> = (0..n_features)
        .map(|f| features.iter().map(|row| row[f]).collect())
        .collect();
    let bins = FeatureBins::build(&columns, config.n_bins);
    let binned = bins.bin_columns(&columns);

    let base_score = targets.iter().sum::<f64>() / n_samples as f64;
    let params = TreeParams {
        max_depth: config.max_depth,
        learning_rate: config.learning_rate,
        reg_lambda: config.reg_lambda,
        min_child_weight: config.min_child_weight,
    };

    let mut train_pred = vec![base_score; n_samples];
    let mut eval_preds: Vec<Vec<f64>> = eval_sets
        .iter()
        .map(|set| vec![base_score; set.targets.len()])
        .collect();

    let mut trees: Vec<RegressionTree> = Vec::with_capacity(config.n_estimators);
    let mut history: Vec<EvalRecord> = Vec::new();
    let mut best: Option<(usize, f64)> = None;
    let mut rounds_without_improvement = 0usize;
    let mut stopped_early = false;

    for iteration in 0..config.n_estimators {
        let gradients: Vec<f64> = train_pred
            .iter()
            .zip(targets)
            .map(|(pred, target)| pred - target)
            .collect();

        let tree = RegressionTree::grow(&binned, &bins, &gradients, params);

        train_pred
            .par_iter_mut()
            .zip(features.par_iter())
            .for_each(|(pred, row)| *pred += tree.predict_row(row));
        for (preds, set) in eval_preds.iter_mut().zip(eval_sets) {
            preds
                .par_iter_mut()
                .zip(set.features.par_iter())
                .for_each(|(pred, row)| *pred += tree.predict_row(row));
        }
        trees.push(tree);

        if eval_sets.is_empty() {
            continue;
        }

        let scores: Vec<(String, f64)> = eval_sets
            .iter()
            .zip(&eval_preds)
            .map(|(set, preds)| (set.name.to_string(), root_mean_squared(set.targets, preds)))
            .collect();

        if config.verbose_every > 0
            && (iteration % config.verbose_every == 0 || iteration + 1 == config.n_estimators)
        {
            let line: Vec<String> = scores
                .iter()
                .map(|(name, score)| format!("{}-rmse:{:.5}", name, score))
                .collect();
            info!("[{}]\t{}", iteration, line.join("\t"));
        }

        let watched = scores[scores.len() - 1].1;
        history.push(EvalRecord { iteration, scores });

        match best {
            Some((_, best_score)) if watched >= best_score => rounds_without_improvement += 1,
            _ => {
                best = Some((iteration, watched));
                rounds_without_improvement = 0;
            }
        }

        if let Some(patience) = config.early_stopping_rounds {
            if rounds_without_improvement >= patience {
                debug!(
                    "No improvement for {} rounds, stopping at round {}",
                    patience, iteration
                );
                stopped_early = true;
                break;
            }
        }
    }

    let rounds_trained = trees.len();
    let best_iteration = best.map(|(iteration, _)| iteration);
    if config.early_stopping_rounds.is_some() {
        if let Some(best_iteration) = best_iteration {
            trees.truncate(best_iteration + 1);
        }
    }

    match best {
        Some((iteration, score)) => info!(
            "Booster trained {} rounds, best iteration {} (rmse {:.5}), kept {} trees",
            rounds_trained,
            iteration,
            score,
            trees.len()
        ),
        None => info!("Booster trained {} rounds", rounds_trained),
    }

    let model = GradientBoostedRegressor {
        trees,
        base_score,
        n_features,
        feature_names: feature_names.to_vec(),
        best_iteration,
    };

    Ok(FitResult {
        model,
        history,
        best_iteration,
        best_score: best.map(|(_, score)| score),
        rounds_trained,
        stopped_early,
    })
}
