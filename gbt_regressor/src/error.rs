use std::path::PathBuf;

/// Errors from booster configuration, training, prediction and persistence.
#[derive(Debug, thiserror::Error)]
pub enum GbtError {
    #[error("n_estimators must be at least 1, got {n_estimators}")]
    InvalidEstimatorCount { n_estimators: usize },

    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth { max_depth: usize },

    #[error("learning_rate must be in (0, 1], got {learning_rate}")]
    InvalidLearningRate { learning_rate: f64 },

    #[error("reg_lambda must be finite and non-negative, got {reg_lambda}")]
    InvalidRegLambda { reg_lambda: f64 },

    #[error("n_bins must be in [2, 65535], got {n_bins}")]
    InvalidBinCount { n_bins: usize },

    #[error("training dataset has zero samples")]
    EmptyDataset,

    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        expected: usize,
        got: usize,
        sample_index: usize,
    },

    #[error("got {n_targets} targets for {n_samples} samples")]
    TargetLengthMismatch { n_samples: usize, n_targets: usize },

    #[error("{n_names} feature names given for {n_features} feature columns")]
    FeatureNameMismatch { n_features: usize, n_names: usize },

    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        sample_index: usize,
        feature_index: usize,
    },

    #[error("non-finite target at sample {sample_index}")]
    NonFiniteTarget { sample_index: usize },

    #[error("eval set '{name}' is invalid: {reason}")]
    InvalidEvalSet { name: String, reason: String },

    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch { expected: usize, got: usize },

    #[error("metric inputs differ in length: {y_true} true values, {y_pred} predictions")]
    MetricLengthMismatch { y_true: usize, y_pred: usize },

    #[error("metric inputs are empty")]
    EmptyMetricInput,

    #[error("failed to serialize model")]
    SerializeModel { source: serde_json::Error },

    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write model to {path}")]
    WriteModel {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read model from {path}")]
    ReadModel {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("model file {path} is structurally invalid")]
    CorruptModel { path: PathBuf },

    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        expected: u32,
        found: u32,
        path: PathBuf,
    },
}
