//! Metrics for evaluating forecast performance

use crate::collaborators::Forecast;
use crate::error::{ForecastError, Result};
use crate::windows::ForecastWindow;
use serde::Serialize;
use tracing::{info, warn};

/// Aligned actual and predicted matrices.
///
/// Rows are forecast windows (one per entity window and target channel),
/// columns are forecast steps. Missing actual values are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    actual: Vec<Vec<Option<f64>>>,
    predicted: Vec<Vec<f64>>,
}

impl ForecastResult {
    pub fn new(actual: Vec<Vec<Option<f64>>>, predicted: Vec<Vec<f64>>) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(ForecastError::ShapeMismatch(format!(
                "actual has {} rows but predicted has {}",
                actual.len(),
                predicted.len()
            )));
        }
        Ok(Self { actual, predicted })
    }

    /// Pair each window's future targets with the model's forecast for it
    pub fn from_windows(windows: &[ForecastWindow], forecasts: &[Forecast]) -> Result<Self> {
        if windows.len() != forecasts.len() {
            return Err(ForecastError::ShapeMismatch(format!(
                "{} windows but {} forecasts",
                windows.len(),
                forecasts.len()
            )));
        }

        let mut actual = Vec::new();
        let mut predicted = Vec::new();
        for (window, forecast) in windows.iter().zip(forecasts) {
            if forecast.values.len() < window.target_count {
                return Err(ForecastError::ShapeMismatch(format!(
                    "forecast for entity '{}' has {} channels, expected {}",
                    window.entity,
                    forecast.values.len(),
                    window.target_count
                )));
            }
            for channel in 0..window.target_count {
                actual.push(window.future_values[channel].clone());
                predicted.push(forecast.values[channel].clone());
            }
        }

        Self::new(actual, predicted)
    }

    pub fn actual(&self) -> &[Vec<Option<f64>>] {
        &self.actual
    }

    pub fn predicted(&self) -> &[Vec<f64>] {
        &self.predicted
    }

    pub fn evaluate(&self, label: &str) -> Result<MetricReport> {
        compute_metrics(&self.actual, &self.predicted, label)
    }
}

/// Error metrics of one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricReport {
    label: String,
    mean_squared_error: f64,
    root_mean_squared_error: f64,
    mean_absolute_error: f64,
    rows_scored: usize,
    rows_masked: usize,
}

impl MetricReport {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn mean_squared_error(&self) -> f64 {
        self.mean_squared_error
    }

    pub fn root_mean_squared_error(&self) -> f64 {
        self.root_mean_squared_error
    }

    pub fn mean_absolute_error(&self) -> f64 {
        self.mean_absolute_error
    }

    /// Rows that contributed to the metrics
    pub fn rows_scored(&self) -> usize {
        self.rows_scored
    }

    /// Rows dropped because an actual value was missing
    pub fn rows_masked(&self) -> usize {
        self.rows_masked
    }
}

impl std::fmt::Display for MetricReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Performance Metrics ({}):", self.label)?;
        writeln!(f, "  MSE:     {:.4}", self.mean_squared_error)?;
        writeln!(f, "  RMSE:    {:.4}", self.root_mean_squared_error)?;
        writeln!(f, "  MAE:     {:.4}", self.mean_absolute_error)?;
        writeln!(f, "  Rows:    {} scored, {} masked", self.rows_scored, self.rows_masked)?;
        Ok(())
    }
}

fn is_missing(value: Option<f64>) -> bool {
    value.map_or(true, f64::is_nan)
}

fn uniform_width<T>(rows: &[Vec<T>], name: &str) -> Result<usize> {
    let width = rows.first().map_or(0, Vec::len);
    if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(ForecastError::ShapeMismatch(format!(
            "{} row {} has {} columns, expected {}",
            name,
            idx,
            row.len(),
            width
        )));
    }
    Ok(width)
}

/// Score predictions against actual values.
///
/// When the prediction horizon is shorter than the actual one, the actual
/// matrix is truncated to it; a longer prediction horizon is an error.
/// Rows with any missing actual value (after truncation) are dropped
/// before scoring. Missing predictions never drop a row.
pub fn compute_metrics(
    actual: &[Vec<Option<f64>>],
    predicted: &[Vec<f64>],
    label: &str,
) -> Result<MetricReport> {
    if actual.len() != predicted.len() {
        return Err(ForecastError::ShapeMismatch(format!(
            "actual has {} rows but predicted has {}",
            actual.len(),
            predicted.len()
        )));
    }

    let actual_width = uniform_width(actual, "actual")?;
    let width = uniform_width(predicted, "predicted")?;
    if width > actual_width {
        return Err(ForecastError::ShapeMismatch(format!(
            "predicted has {} columns but actual has only {}",
            width, actual_width
        )));
    }
    if width == 0 && !actual.is_empty() {
        return Err(ForecastError::ShapeMismatch(
            "predicted has no forecast steps".to_string(),
        ));
    }

    let mut squared_sum = 0.0;
    let mut absolute_sum = 0.0;
    let mut rows_scored = 0;

    for (actual_row, predicted_row) in actual.iter().zip(predicted) {
        let actual_row = &actual_row[..width];
        if actual_row.iter().any(|&v| is_missing(v)) {
            continue;
        }

        for (a, p) in actual_row.iter().flatten().zip(predicted_row) {
            let error = a - p;
            squared_sum += error * error;
            absolute_sum += error.abs();
        }
        rows_scored += 1;
    }

    let rows_masked = actual.len() - rows_scored;
    if rows_scored == 0 {
        return Err(ForecastError::EmptyMask {
            label: label.to_string(),
            rows: actual.len(),
        });
    }
    if rows_masked > 0 {
        warn!(label, rows_masked, "masked rows with missing actual values");
    }

    let cells = (rows_scored * width) as f64;
    let mean_squared_error = squared_sum / cells;
    let report = MetricReport {
        label: label.to_string(),
        mean_squared_error,
        root_mean_squared_error: mean_squared_error.sqrt(),
        mean_absolute_error: absolute_sum / cells,
        rows_scored,
        rows_masked,
    };

    info!(
        label,
        mse = report.mean_squared_error,
        rmse = report.root_mean_squared_error,
        mae = report.mean_absolute_error,
        "computed forecast metrics"
    );
    Ok(report)
}

/// Reports of several runs over the same test data, in insertion order
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricTable {
    reports: Vec<MetricReport>,
}

impl MetricTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a report, replacing any earlier report with the same label
    pub fn insert(&mut self, report: MetricReport) {
        match self.reports.iter_mut().find(|r| r.label == report.label) {
            Some(existing) => *existing = report,
            None => self.reports.push(report),
        }
    }

    pub fn get(&self, label: &str) -> Option<&MetricReport> {
        self.reports.iter().find(|r| r.label == label)
    }

    pub fn reports(&self) -> &[MetricReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.reports)?)
    }
}

impl std::fmt::Display for MetricTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label_width = self
            .reports
            .iter()
            .map(|r| r.label.len())
            .max()
            .unwrap_or(0)
            .max("run".len());

        writeln!(
            f,
            "{:<w$}  {:>10}  {:>10}  {:>10}",
            "run",
            "mse",
            "rmse",
            "mae",
            w = label_width
        )?;
        for report in &self.reports {
            writeln!(
                f,
                "{:<w$}  {:>10.4}  {:>10.4}  {:>10.4}",
                report.label,
                report.mean_squared_error,
                report.root_mean_squared_error,
                report.mean_absolute_error,
                w = label_width
            )?;
        }
        Ok(())
    }
}
