//! End-to-end forecast run: ingest, featurize, fit or load, evaluate, report.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDateTime, Timelike};
use gbt_regressor::{mae, rmse, EvalSet, GradientBoostedRegressor, RankedFeature};
use log::{info, warn};
use polars::prelude::*;

use crate::config::{PipelineConfig, RunMode};
use crate::demand_loader::{frame_f64, frame_timestamps, records_to_frame, DemandLoader};
use crate::error::ForecastError;
use crate::features::{build_feature_table, feature_matrix, feature_names, TARGET};
use crate::split::train_test_split;
use crate::visualization::DemandVisualizer;

pub const PREDICTIONS_FILE: &str = "predictions.csv";

/// What a run produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub n_records: usize,
    pub n_train: usize,
    pub n_test: usize,
    /// `None` when the test partition is empty.
    pub rmse: Option<f64>,
    pub mae: Option<f64>,
    pub n_trees: usize,
    pub best_iteration: Option<usize>,
    pub importances: Vec<RankedFeature>,
    pub predictions_path: Option<PathBuf>,
    pub images: Vec<PathBuf>,
}

pub struct ForecastPipeline {
    config: PipelineConfig,
    loader: DemandLoader,
}

struct Partition {
    timestamps: Vec<NaiveDateTime>,
    features: Vec<Vec<f64>>,
    target: Vec<f64>,
}

impl Partition {
    fn from_frame(df: &DataFrame) -> Result<Self, ForecastError> {
        let timestamps = frame_timestamps(df)?;
        let (features, target) = feature_matrix(df)?;
        Ok(Self {
            timestamps,
            features,
            target,
        })
    }
}

impl ForecastPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate().context("invalid pipeline configuration")?;
        Ok(Self {
            config,
            loader: DemandLoader::new(true),
        })
    }

    /// Disable the ingestion progress bar.
    pub fn quiet(mut self) -> Self {
        self.loader = DemandLoader::new(false);
        self
    }

    pub fn run(&self) -> Result<PipelineReport> {
        let paths = DemandLoader::resolve_inputs(&self.config.input_files)?;
        info!("Loading {} demand files", paths.len());
        let records = self.loader.load_all(&paths)?;
        let raw = records_to_frame(&records)?;

        let table = build_feature_table(&raw).context("building features")?;
        let (train_df, test_df) = train_test_split(&table, self.config.train_fraction)?;
        info!(
            "Split {} rows into {} train / {} test",
            table.height(),
            train_df.height(),
            test_df.height()
        );

        let train = Partition::from_frame(&train_df)?;
        let test = Partition::from_frame(&test_df)?;

        let (model, best_iteration) = match self.config.mode {
            RunMode::Train => self.train_model(&train, &test)?,
            RunMode::Inference => {
                let model = load_model(&self.config.model_path)?;
                let best = model.best_iteration();
                (model, best)
            }
        };

        let predicted = model
            .predict_batch(&test.features)
            .map_err(ForecastError::from)?;

        let (rmse_value, mae_value) = if test.target.is_empty() {
            warn!("Test set is empty, skipping evaluation");
            (None, None)
        } else {
            let r = rmse(&test.target, &predicted).map_err(ForecastError::from)?;
            let m = mae(&test.target, &predicted).map_err(ForecastError::from)?;
            println!("RMSE on the test set: {:.2}", r);
            info!("MAE on the test set: {:.2}", m);
            (Some(r), Some(m))
        };

        std::fs::create_dir_all(&self.config.output_dir).with_context(|| {
            format!(
                "creating output directory {}",
                self.config.output_dir.display()
            )
        })?;
        let predictions_path = if test.target.is_empty() {
            None
        } else {
            let path = self.config.output_dir.join(PREDICTIONS_FILE);
            write_predictions(&path, &test.timestamps, &test.target, &predicted)?;
            Some(path)
        };

        let importances = model.ranked_importances();
        if self.config.diagnostics {
            for feature in &importances {
                info!(
                    "  #{} {:<10} {:.4}",
                    feature.rank, feature.name, feature.importance
                );
            }
        }

        let images = if self.config.render_plots {
            let all_timestamps: Vec<NaiveDateTime> = records.iter().map(|r| r.timestamp).collect();
            let all_demand = frame_f64(&table, TARGET)?;
            self.render(&all_timestamps, &all_demand, &test, &predicted, &importances)?
        } else {
            Vec::new()
        };

        Ok(PipelineReport {
            n_records: records.len(),
            n_train: train.target.len(),
            n_test: test.target.len(),
            rmse: rmse_value,
            mae: mae_value,
            n_trees: model.n_trees(),
            best_iteration,
            importances,
            predictions_path,
            images,
        })
    }

    fn train_model(
        &self,
        train: &Partition,
        test: &Partition,
    ) -> Result<(GradientBoostedRegressor, Option<usize>)> {
        let names = feature_names();
        let mut eval_sets = vec![EvalSet::new("train", &train.features, &train.target)];
        if !test.target.is_empty() {
            eval_sets.push(EvalSet::new("test", &test.features, &test.target));
        }

        let booster = self.config.model.booster_config();
        info!(
            "Training booster: {} rounds max, depth {}, learning rate {}",
            booster.n_estimators, booster.max_depth, booster.learning_rate
        );
        let fit = booster
            .fit(&train.features, &train.target, &names, &eval_sets)
            .map_err(ForecastError::from)
            .context("training booster")?;

        if fit.stopped_early {
            info!(
                "Early stopping after {} rounds, best round {:?} (rmse {:.2})",
                fit.rounds_trained,
                fit.best_iteration,
                fit.best_score.unwrap_or(f64::NAN)
            );
        }

        let best_iteration = fit.best_iteration;
        let model = fit.into_model();

        if self.config.save_model {
            model
                .save(&self.config.model_path)
                .map_err(ForecastError::from)?;
            info!("Saved model to {}", self.config.model_path.display());
        }
        Ok((model, best_iteration))
    }

    fn render(
        &self,
        timestamps: &[NaiveDateTime],
        demand: &[f64],
        test: &Partition,
        predicted: &[f64],
        importances: &[RankedFeature],
    ) -> Result<Vec<PathBuf>> {
        let viz = DemandVisualizer::new(&self.config.output_dir)?;
        let mut images = Vec::new();

        images.extend(viz.plot_demand_over_time(timestamps, demand)?);
        images.extend(viz.plot_true_vs_predicted(&test.timestamps, &test.target, predicted)?);

        if self.config.diagnostics {
            let months: Vec<i32> = timestamps.iter().map(|t| t.month() as i32).collect();
            let hours: Vec<i32> = timestamps.iter().map(|t| t.hour() as i32).collect();
            images.extend(viz.plot_demand_by_month(&months, demand)?);
            images.extend(viz.plot_demand_by_hour(&hours, demand)?);
            images.extend(viz.plot_feature_importance(importances)?);
        }

        Ok(images)
    }
}

/// Load a persisted booster and check it was trained on this pipeline's
/// feature columns.
pub fn load_model(path: &Path) -> Result<GradientBoostedRegressor, ForecastError> {
    if !path.is_file() {
        return Err(ForecastError::ArtifactNotFound {
            path: path.to_path_buf(),
        });
    }
    let model = GradientBoostedRegressor::load(path)?;
    let expected = feature_names();
    if model.feature_names() != expected.as_slice() {
        return Err(ForecastError::FeatureMismatch {
            model: model.feature_names().to_vec(),
            pipeline: expected,
        });
    }
    info!(
        "Loaded model with {} trees from {}",
        model.n_trees(),
        path.display()
    );
    Ok(model)
}

fn write_predictions(
    path: &Path,
    timestamps: &[NaiveDateTime],
    actual: &[f64],
    predicted: &[f64],
) -> Result<()> {
    let stamps: Vec<String> = timestamps
        .iter()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .collect();
    let mut df = DataFrame::new(vec![
        Series::new("timestamp".into(), stamps),
        Series::new("actual".into(), actual.to_vec()),
        Series::new("predicted".into(), predicted.to_vec()),
    ])?;

    CsvWriter::new(std::fs::File::create(path)?).finish(&mut df)?;
    info!("Wrote {} predictions to {}", df.height(), path.display());
    Ok(())
}
