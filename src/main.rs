use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;
use nd_forecast::{ForecastPipeline, PipelineConfig, RunMode};

#[derive(Parser)]
#[command(name = "nd_forecast")]
#[command(about = "Forecast national electricity demand from settlement-period history")]
struct Args {
    /// JSON config file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fit a new model or score with a saved one
    #[arg(short, long, value_enum)]
    mode: Option<RunMode>,

    /// Also render boxplots and feature importance
    #[arg(long)]
    diagnostics: bool,

    /// Skip all charts
    #[arg(long)]
    no_plots: bool,

    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Demand CSV or glob pattern (repeatable)
    #[arg(short, long = "input")]
    inputs: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if args.diagnostics {
        config.diagnostics = true;
    }
    if args.no_plots {
        config.render_plots = false;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(path) = args.model_path {
        config.model_path = path;
    }
    if !args.inputs.is_empty() {
        config.input_files = args.inputs;
    }

    info!("Running in {:?} mode", config.mode);
    let report = ForecastPipeline::new(config)?.run()?;

    info!(
        "Done: {} records, {} train / {} test, {} trees",
        report.n_records, report.n_train, report.n_test, report.n_trees
    );
    for image in &report.images {
        info!("  {}", image.display());
    }
    Ok(())
}
