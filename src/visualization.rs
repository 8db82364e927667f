//! PNG charts of demand history, forecasts and model diagnostics.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use gbt_regressor::RankedFeature;
use log::{info, warn};
use plotters::prelude::*;

pub const DEMAND_OVER_TIME: &str = "demand_over_time.png";
pub const TRUE_VS_PREDICTED: &str = "true_vs_predicted.png";
pub const DEMAND_BY_MONTH: &str = "demand_by_month.png";
pub const DEMAND_BY_HOUR: &str = "demand_by_hour.png";
pub const FEATURE_IMPORTANCE: &str = "feature_importance.png";

/// Renders the pipeline charts as PNG files into one output directory.
pub struct DemandVisualizer {
    output_dir: PathBuf,
}

impl DemandVisualizer {
    pub fn new(output_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_dir)?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Daily mean ND across the whole history.
    pub fn plot_demand_over_time(
        &self,
        timestamps: &[NaiveDateTime],
        demand: &[f64],
    ) -> Result<Option<PathBuf>> {
        let daily = daily_means(timestamps, demand);
        if daily.is_empty() {
            warn!("No demand to plot, skipping {}", DEMAND_OVER_TIME);
            return Ok(None);
        }

        let output_path = self.output_dir.join(DEMAND_OVER_TIME);
        let target = output_path.clone();
        let root = BitMapBackend::new(&target, (1200, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let (min_date, max_date) = date_bounds(&daily);
        let (lo, hi) = padded_bounds(daily.iter().map(|(_, v)| *v));

        let mut chart = ChartBuilder::on(&root)
            .caption("National Demand Over Time", ("sans-serif", 40).into_font())
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(min_date..max_date, lo..hi)?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("ND (MW, daily mean)")
            .draw()?;

        chart.draw_series(LineSeries::new(daily.iter().map(|(d, v)| (*d, *v)), &BLUE))?;

        root.present()?;
        info!("Saved {}", output_path.display());
        Ok(Some(output_path))
    }

    /// Test-period actuals against model output, both as daily means.
    pub fn plot_true_vs_predicted(
        &self,
        timestamps: &[NaiveDateTime],
        actual: &[f64],
        predicted: &[f64],
    ) -> Result<Option<PathBuf>> {
        let daily_actual = daily_means(timestamps, actual);
        let daily_predicted = daily_means(timestamps, predicted);
        if daily_actual.is_empty() {
            warn!("Test set is empty, skipping {}", TRUE_VS_PREDICTED);
            return Ok(None);
        }

        let output_path = self.output_dir.join(TRUE_VS_PREDICTED);
        let target = output_path.clone();
        let root = BitMapBackend::new(&target, (1200, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let (min_date, max_date) = date_bounds(&daily_actual);
        let (lo, hi) = padded_bounds(
            daily_actual
                .iter()
                .chain(daily_predicted.iter())
                .map(|(_, v)| *v),
        );

        let mut chart = ChartBuilder::on(&root)
            .caption("Actual vs Predicted Demand", ("sans-serif", 40).into_font())
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(min_date..max_date, lo..hi)?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("ND (MW, daily mean)")
            .draw()?;

        chart
            .draw_series(LineSeries::new(
                daily_actual.iter().map(|(d, v)| (*d, *v)),
                &BLUE,
            ))?
            .label("Actual")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &BLUE));

        chart
            .draw_series(LineSeries::new(
                daily_predicted.iter().map(|(d, v)| (*d, *v)),
                RED.stroke_width(2),
            ))?
            .label("Predicted")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &RED));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        info!("Saved {}", output_path.display());
        Ok(Some(output_path))
    }

    pub fn plot_demand_by_month(&self, months: &[i32], demand: &[f64]) -> Result<Option<PathBuf>> {
        self.boxplot(months, demand, 1..=12, "Month", "Demand by Month", DEMAND_BY_MONTH)
    }

    pub fn plot_demand_by_hour(&self, hours: &[i32], demand: &[f64]) -> Result<Option<PathBuf>> {
        self.boxplot(hours, demand, 0..=23, "Hour", "Demand by Hour", DEMAND_BY_HOUR)
    }

    fn boxplot(
        &self,
        keys: &[i32],
        values: &[f64],
        key_range: RangeInclusive<i32>,
        x_desc: &str,
        caption: &str,
        file_name: &str,
    ) -> Result<Option<PathBuf>> {
        let groups = group_by_key(keys, values, key_range.clone());
        if groups.iter().all(|(_, v)| v.is_empty()) {
            warn!("No demand to plot, skipping {}", file_name);
            return Ok(None);
        }

        let output_path = self.output_dir.join(file_name);
        let target = output_path.clone();
        let root = BitMapBackend::new(&target, (1000, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let (lo, hi) = padded_bounds(values.iter().copied());

        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 30).into_font())
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(
                (*key_range.start()..*key_range.end() + 1).into_segmented(),
                lo as f32..hi as f32,
            )?;

        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc("ND (MW)")
            .draw()?;

        chart.draw_series(groups.iter().filter(|(_, v)| !v.is_empty()).map(|(k, v)| {
            Boxplot::new_vertical(SegmentValue::CenterOf(*k), &Quartiles::new(v.as_slice()))
                .width(20)
                .style(&BLUE)
        }))?;

        root.present()?;
        info!("Saved {}", output_path.display());
        Ok(Some(output_path))
    }

    pub fn plot_feature_importance(&self, ranked: &[RankedFeature]) -> Result<Option<PathBuf>> {
        if ranked.is_empty() {
            return Ok(None);
        }

        let output_path = self.output_dir.join(FEATURE_IMPORTANCE);
        let target = output_path.clone();
        let root = BitMapBackend::new(&target, (1000, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let max_val = ranked.iter().map(|f| f.importance).fold(0.0, f64::max);
        let top = if max_val > 0.0 { max_val * 1.1 } else { 1.0 };
        let n = ranked.len();

        let mut chart = ChartBuilder::on(&root)
            .caption("Feature Importance (gain)", ("sans-serif", 30).into_font())
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(-0.5..(n as f64 - 0.5), 0.0..top)?;

        chart
            .configure_mesh()
            .x_desc("Feature")
            .y_desc("Share of total gain")
            .x_labels(n)
            .x_label_formatter(&|x| {
                let idx = x.round();
                if idx < 0.0 {
                    return String::new();
                }
                ranked
                    .get(idx as usize)
                    .map(|f| f.name.clone())
                    .unwrap_or_default()
            })
            .draw()?;

        chart.draw_series(ranked.iter().enumerate().map(|(i, feature)| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, feature.importance)], BLUE.filled())
        }))?;

        root.present()?;
        info!("Saved {}", output_path.display());
        Ok(Some(output_path))
    }
}

/// Mean value per calendar day, in date order.
pub fn daily_means(timestamps: &[NaiveDateTime], values: &[f64]) -> Vec<(NaiveDate, f64)> {
    let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for (ts, v) in timestamps.iter().zip(values) {
        let entry = sums.entry(ts.date()).or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(date, (sum, count))| (date, sum / count as f64))
        .collect()
}

/// Bucket values by integer key. Every key in `range` gets an entry, possibly
/// empty; keys outside the range are ignored.
pub fn group_by_key(
    keys: &[i32],
    values: &[f64],
    range: RangeInclusive<i32>,
) -> Vec<(i32, Vec<f64>)> {
    let mut groups: Vec<(i32, Vec<f64>)> = range.clone().map(|k| (k, Vec::new())).collect();
    let start = *range.start();
    for (k, v) in keys.iter().zip(values) {
        if range.contains(k) {
            groups[(k - start) as usize].1.push(*v);
        }
    }
    groups
}

fn date_bounds(daily: &[(NaiveDate, f64)]) -> (NaiveDate, NaiveDate) {
    let min_date = daily.first().map(|(d, _)| *d).unwrap_or_default();
    let max_date = daily.last().map(|(d, _)| *d).unwrap_or_default();
    if max_date > min_date {
        (min_date, max_date)
    } else {
        (min_date, min_date + Duration::days(1))
    }
}

fn padded_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(1.0);
    (lo - pad, hi + pad)
}
