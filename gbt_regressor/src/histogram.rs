//! Quantile binning of feature columns.
//!
//! Bin edges are computed once per training run; every tree then searches
//! splits over per-bin gradient sums instead of sorted raw values.

/// Quantile bin edges for every feature column.
#[derive(Debug, Clone)]
pub(crate) struct FeatureBins {
    /// `edges[feature]` is strictly increasing. A value goes into the bin
    /// equal to the number of edges strictly below it.
    edges: Vec<Vec<f64>>,
}

impl FeatureBins {
    /// Build edges from column-major `columns[feature][sample]`.
    ///
    /// Constant columns get no edges and can never be split on.
    pub(crate) fn build(columns: &[Vec<f64>], n_bins: usize) -> Self {
        let edges = columns
            .iter()
            .map(|col| {
                if col.is_empty() {
                    return Vec::new();
                }

                let mut sorted = col.clone();
                sorted.sort_unstable_by(|a, b| a.total_cmp(b));

                let mut distinct = sorted.clone();
                distinct.dedup();
                if distinct.len() == 1 {
                    return Vec::new();
                }

                // Few distinct values: split between every neighbouring pair.
                if distinct.len() <= n_bins {
                    let mut mids: Vec<f64> = distinct
                        .windows(2)
                        .map(|w| w[0] + (w[1] - w[0]) / 2.0)
                        .collect();
                    mids.dedup();
                    return mids;
                }

                let n = sorted.len();

                let mut raw: Vec<f64> = (1..n_bins)
                    .map(|k| {
                        let pos = (k as f64 / n_bins as f64) * (n - 1) as f64;
                        let lo = pos.floor() as usize;
                        let hi = (lo + 1).min(n - 1);
                        let frac = pos - lo as f64;
                        sorted[lo] + frac * (sorted[hi] - sorted[lo])
                    })
                    .collect();

                raw.dedup_by(|a, b| *a == *b);
                raw.retain(|&e| e > sorted[0] && e < sorted[n - 1]);
                raw
            })
            .collect();

        Self { edges }
    }

    pub(crate) fn n_features(&self) -> usize {
        self.edges.len()
    }

    pub(crate) fn bin_index(&self, feature: usize, value: f64) -> usize {
        self.edges[feature].partition_point(|&e| e < value)
    }

    /// Number of bins for a feature; zero for constant columns.
    pub(crate) fn n_bins_for_feature(&self, feature: usize) -> usize {
        match self.edges[feature].len() {
            0 => 0,
            n => n + 1,
        }
    }

    /// Samples whose value is `<=` this threshold fall in bins `0..=bin`.
    pub(crate) fn threshold(&self, feature: usize, bin: usize) -> f64 {
        self.edges[feature][bin]
    }

    /// Map every column to its bin indices.
    pub(crate) fn bin_columns(&self, columns: &[Vec<f64>]) -> Vec<Vec<u16>> {
        columns
            .iter()
            .enumerate()
            .map(|(feature, col)| {
                col.iter()
                    .map(|&v| self.bin_index(feature, v) as u16)
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_column_has_no_bins() {
        let bins = FeatureBins::build(&[vec![3.0; 10]], 16);
        assert_eq!(bins.n_bins_for_feature(0), 0);
    }

    #[test]
    fn test_low_cardinality_uses_midpoints() {
        let bins = FeatureBins::build(&[vec![1.0, 2.0, 2.0, 4.0]], 16);
        assert_eq!(bins.n_bins_for_feature(0), 3);
        assert!((bins.threshold(0, 0) - 1.5).abs() < 1e-12);
        assert!((bins.threshold(0, 1) - 3.0).abs() < 1e-12);
        assert_eq!(bins.bin_index(0, 1.0), 0);
        assert_eq!(bins.bin_index(0, 2.0), 1);
        assert_eq!(bins.bin_index(0, 4.0), 2);
    }

    #[test]
    fn test_quantile_edges_are_strictly_increasing() {
        let col: Vec<f64> = (0..1000).map(|i| (i as f64).sqrt()).collect();
        let bins = FeatureBins::build(&[col], 32);
        let edges = &bins.edges[0];
        assert!(!edges.is_empty());
        assert!(edges.len() <= 31);
        assert!(edges.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_bin_order_matches_threshold_rule() {
        let col: Vec<f64> = (0..500).map(|i| i as f64 * 0.37).collect();
        let bins = FeatureBins::build(&[col.clone()], 20);
        let binned = bins.bin_columns(&[col.clone()]);
        for b in 0..bins.n_bins_for_feature(0) - 1 {
            let t = bins.threshold(0, b);
            for (v, &bin) in col.iter().zip(&binned[0]) {
                assert_eq!(*v <= t, (bin as usize) <= b);
            }
        }
    }
}
