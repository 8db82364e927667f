//! Gain-based feature importance.

use serde::{Deserialize, Serialize};

/// A feature with its normalized importance and 1-based rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFeature {
    pub name: String,
    pub importance: f64,
    pub rank: usize,
}

/// Sum per-tree gains by feature and normalize the totals to 1.0.
///
/// All zeros when no tree ever split.
pub(crate) fn total_gain(per_tree: &[Vec<f64>], n_features: usize) -> Vec<f64> {
    let mut totals = vec![0.0f64; n_features];
    for gains in per_tree {
        for (total, gain) in totals.iter_mut().zip(gains) {
            *total += gain;
        }
    }

    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        totals.iter_mut().for_each(|v| *v /= sum);
    }
    totals
}

/// Pair importances with names, sort descending, and assign ranks.
pub(crate) fn rank(importances: &[f64], names: &[String]) -> Vec<RankedFeature> {
    let mut features: Vec<RankedFeature> = names
        .iter()
        .zip(importances)
        .map(|(name, &importance)| RankedFeature {
            name: name.clone(),
            importance,
            rank: 0,
        })
        .collect();

    features.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for (i, feature) in features.iter_mut().enumerate() {
        feature.rank = i + 1;
    }
    features
}
