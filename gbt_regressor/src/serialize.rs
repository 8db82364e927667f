//! JSON persistence for fitted boosters.

use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::booster::GradientBoostedRegressor;
use crate::error::GbtError;

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct ModelEnvelope {
    format_version: u32,
    n_trees: usize,
    feature_names: Vec<String>,
    model: GradientBoostedRegressor,
}

impl GradientBoostedRegressor {
    /// Write the model as a versioned JSON document.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), GbtError> {
        let path = path.as_ref();

        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_trees: self.trees.len(),
            feature_names: self.feature_names.clone(),
            model: self.clone(),
        };

        let bytes =
            serde_json::to_vec(&envelope).map_err(|e| GbtError::SerializeModel { source: e })?;

        std::fs::write(path, &bytes).map_err(|e| GbtError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            "Saved model with {} trees to {} ({} bytes)",
            self.trees.len(),
            path.display(),
            bytes.len()
        );
        Ok(())
    }

    /// Read a model written by [`GradientBoostedRegressor::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GbtError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| GbtError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: ModelEnvelope =
            serde_json::from_slice(&bytes).map_err(|e| GbtError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(GbtError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        let model = envelope.model;
        let consistent = model.feature_names.len() == model.n_features
            && model
                .trees
                .iter()
                .all(|t| t.n_features == model.n_features && t.is_well_formed());
        if !consistent {
            return Err(GbtError::CorruptModel {
                path: path.to_path_buf(),
            });
        }

        debug!(
            "Loaded model from {}: {} trees, features {:?}",
            path.display(),
            envelope.n_trees,
            envelope.feature_names
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::config::BoosterConfig;

    fn train_small_model() -> GradientBoostedRegressor {
        let x: Vec<Vec<f64>> = (0..60).map(|i| vec![i as f64, (i % 7) as f64]).collect();
        let y: Vec<f64> = x.iter().map(|r| r[0] * 2.0 + r[1]).collect();
        let names = vec!["a".to_string(), "b".to_string()];
        BoosterConfig::new(25)
            .with_learning_rate(0.3)
            .fit(&x, &y, &names, &[])
            .unwrap()
            .into_model()
    }

    #[test]
    fn test_save_load_preserves_predictions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        let model = train_small_model();

        model.save(&path).unwrap();
        let loaded = GradientBoostedRegressor::load(&path).unwrap();

        assert_eq!(loaded, model);
        for sample in [[3.0, 1.0], [41.5, 6.0], [-10.0, 0.0]] {
            assert_eq!(model.predict(&sample).unwrap(), loaded.predict(&sample).unwrap());
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = GradientBoostedRegressor::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, GbtError::ReadModel { .. }));
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let err = GradientBoostedRegressor::load(&path).unwrap_err();
        assert!(matches!(err, GbtError::DeserializeModel { .. }));
    }

    #[test]
    fn test_load_wrong_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("old.json");
        let model = train_small_model();
        let mut doc = serde_json::to_value(ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_trees: model.n_trees(),
            feature_names: model.feature_names.clone(),
            model,
        })
        .unwrap();
        doc["format_version"] = serde_json::json!(99);
        std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

        let err = GradientBoostedRegressor::load(&path).unwrap_err();
        assert!(matches!(
            err,
            GbtError::IncompatibleModelVersion { expected: 1, found: 99, .. }
        ));
    }
}
