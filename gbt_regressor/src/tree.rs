use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::GbtError;
use crate::histogram::FeatureBins;

/// A node of a regression tree stored in a flat arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Split {
        feature: usize,
        /// Samples with `value <= threshold` go left.
        threshold: f64,
        left: usize,
        right: usize,
        /// Loss reduction achieved by this split.
        gain: f64,
        n_samples: usize,
    },
    Leaf {
        /// Output already scaled by the learning rate.
        value: f64,
        n_samples: usize,
    },
}

/// A depth-limited regression tree fitted to squared-error gradients.
///
/// The root is always `nodes[0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub max_depth: usize,
    pub learning_rate: f64,
    pub reg_lambda: f64,
    pub min_child_weight: f64,
}

struct GrowContext<'a> {
    binned: &'a [Vec<u16>],
    bins: &'a FeatureBins,
    gradients: &'a [f64],
    params: TreeParams,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    bin: usize,
    gain: f64,
}

impl RegressionTree {
    /// Grow one tree on pre-binned columns.
    ///
    /// For squared error every sample has hessian 1, so hessian sums are
    /// sample counts.
    pub(crate) fn grow(
        binned: &[Vec<u16>],
        bins: &FeatureBins,
        gradients: &[f64],
        params: TreeParams,
    ) -> Self {
        let ctx = GrowContext {
            binned,
            bins,
            gradients,
            params,
        };
        let indices: Vec<usize> = (0..gradients.len()).collect();
        let mut nodes = Vec::new();
        build_node(&ctx, &indices, 0, &mut nodes);

        Self {
            nodes,
            n_features: bins.n_features(),
        }
    }

    pub fn predict(&self, sample: &[f64]) -> Result<f64, GbtError> {
        if sample.len() != self.n_features {
            return Err(GbtError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        Ok(self.predict_row(sample))
    }

    /// Caller guarantees `sample.len() == n_features`.
    pub(crate) fn predict_row(&self, sample: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value, .. } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if sample[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Total split gain per feature column.
    pub fn gain_by_feature(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Split { feature, gain, .. } = node {
                totals[*feature] += gain;
            }
        }
        totals
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Every child index points forward into the arena and every split
    /// feature is in range. Used to reject corrupt model files.
    pub(crate) fn is_well_formed(&self) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        self.nodes.iter().enumerate().all(|(idx, node)| match node {
            Node::Leaf { value, .. } => value.is_finite(),
            Node::Split {
                feature,
                threshold,
                left,
                right,
                ..
            } => {
                *feature < self.n_features
                    && !threshold.is_nan()
                    && *left > idx
                    && *right > idx
                    && *left < self.nodes.len()
                    && *right < self.nodes.len()
            }
        })
    }
}

fn build_node(
    ctx: &GrowContext<'_>,
    indices: &[usize],
    depth: usize,
    nodes: &mut Vec<Node>,
) -> usize {
    let n_samples = indices.len();
    let grad_sum: f64 = indices.iter().map(|&i| ctx.gradients[i]).sum();
    let params = ctx.params;
    let value = -grad_sum / (n_samples as f64 + params.reg_lambda) * params.learning_rate;

    let push_leaf = |nodes: &mut Vec<Node>| {
        nodes.push(Node::Leaf { value, n_samples });
        nodes.len() - 1
    };

    if depth >= params.max_depth || (n_samples as f64) < 2.0 * params.min_child_weight {
        return push_leaf(nodes);
    }

    let Some(split) = best_split(ctx, indices, grad_sum) else {
        return push_leaf(nodes);
    };

    let column = &ctx.binned[split.feature];
    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| (column[i] as usize) <= split.bin);

    // Reserve the slot so children land after their parent.
    let node_idx = nodes.len();
    nodes.push(Node::Leaf { value, n_samples });

    let left_idx = build_node(ctx, &left, depth + 1, nodes);
    let right_idx = build_node(ctx, &right, depth + 1, nodes);

    nodes[node_idx] = Node::Split {
        feature: split.feature,
        threshold: ctx.bins.threshold(split.feature, split.bin),
        left: left_idx,
        right: right_idx,
        gain: split.gain,
        n_samples,
    };

    node_idx
}

/// Scan per-bin gradient sums of every feature for the highest-gain split.
fn best_split(ctx: &GrowContext<'_>, indices: &[usize], grad_sum: f64) -> Option<SplitCandidate> {
    let n_total = indices.len();
    let lambda = ctx.params.reg_lambda;
    let min_child = ctx.params.min_child_weight;
    let parent_score = grad_sum * grad_sum / (n_total as f64 + lambda);
    let min_gain = 1e-12 * parent_score.max(1.0);

    let per_feature: Vec<Option<SplitCandidate>> = (0..ctx.bins.n_features())
        .into_par_iter()
        .map(|feature| {
            let n_bins = ctx.bins.n_bins_for_feature(feature);
            if n_bins == 0 {
                return None;
            }

            let column = &ctx.binned[feature];
            let mut bin_grad = vec![0.0f64; n_bins];
            let mut bin_count = vec![0usize; n_bins];
            for &i in indices {
                let b = column[i] as usize;
                bin_grad[b] += ctx.gradients[i];
                bin_count[b] += 1;
            }

            let mut best: Option<SplitCandidate> = None;
            let mut left_grad = 0.0f64;
            let mut left_count = 0usize;

            for bin in 0..n_bins - 1 {
                left_grad += bin_grad[bin];
                left_count += bin_count[bin];
                let right_count = n_total - left_count;

                if left_count == 0 || right_count == 0 {
                    continue;
                }
                if (left_count as f64) < min_child || (right_count as f64) < min_child {
                    continue;
                }

                let right_grad = grad_sum - left_grad;
                let gain = 0.5
                    * (left_grad * left_grad / (left_count as f64 + lambda)
                        + right_grad * right_grad / (right_count as f64 + lambda)
                        - parent_score);

                if gain > min_gain && best.map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate { feature, bin, gain });
                }
            }
            best
        })
        .collect();

    // Sequential reduction keeps ties on the lowest feature index.
    per_feature
        .into_iter()
        .flatten()
        .fold(None, |acc: Option<SplitCandidate>, c| match acc {
            Some(b) if b.gain >= c.gain => Some(b),
            _ => Some(c),
        })
}
