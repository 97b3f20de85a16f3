//! Capabilities supplied by an external forecasting runtime
//!
//! The crate prepares inputs for and consumes outputs of a pretrained
//! model library. These traits are the call contracts with that library;
//! any backing implementation can be plugged in.

use crate::config::ContextWindow;
use crate::data::{EntityKey, TimeSeriesTable};
use crate::error::{ForecastError, Result};
use crate::plotting::PlotSeries;
use crate::windows::ForecastWindow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Model output for one window: values per target channel, `[channel][step]`
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub values: Vec<Vec<f64>>,
}

impl Forecast {
    pub fn new(values: Vec<Vec<f64>>) -> Self {
        Self { values }
    }

    /// Realized horizon, taken from the first channel
    pub fn horizon(&self) -> usize {
        self.values.first().map_or(0, Vec::len)
    }
}

/// Static configuration handed to a forecasting model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub context_length: usize,
    pub prediction_length: usize,
    /// Channels the model forecasts
    pub prediction_channel_indices: Vec<usize>,
    /// Channels used only as covariates
    pub exogenous_channel_indices: Vec<usize>,
    /// Vocabulary size of each categorical column, by column name
    pub categorical_vocab_sizes: BTreeMap<String, usize>,
}

impl ModelConfig {
    /// Targets first, controls after, matching the window channel layout
    pub fn for_channels(window: &ContextWindow, targets: usize, controls: usize) -> Self {
        Self {
            context_length: window.context_length,
            prediction_length: window.prediction_length,
            prediction_channel_indices: (0..targets).collect(),
            exogenous_channel_indices: (targets..targets + controls).collect(),
            categorical_vocab_sizes: BTreeMap::new(),
        }
    }

    pub fn with_vocab_sizes(mut self, sizes: BTreeMap<String, usize>) -> Self {
        self.categorical_vocab_sizes = sizes;
        self
    }
}

/// Hyperparameters of a fine-tuning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingArgs {
    pub learning_rate: f64,
    pub num_epochs: usize,
    pub batch_size: usize,
    /// Epochs without improvement before stopping
    pub early_stopping_patience: usize,
    /// Minimum loss improvement that resets the patience counter
    pub early_stopping_threshold: f64,
}

impl Default for TrainingArgs {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            num_epochs: 50,
            batch_size: 64,
            early_stopping_patience: 10,
            early_stopping_threshold: 0.0,
        }
    }
}

impl TrainingArgs {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.num_epochs == 0 || self.batch_size == 0 {
            return Err(ForecastError::InvalidParameter(
                "num_epochs and batch_size must be at least 1".to_string(),
            ));
        }
        if self.early_stopping_threshold < 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "early_stopping_threshold must not be negative, got {}",
                self.early_stopping_threshold
            )));
        }
        Ok(())
    }
}

/// What a fine-tuning run reports back
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOutcome {
    /// Loss on the validation windows after the last epoch run
    pub eval_loss: f64,
    pub epochs_run: usize,
}

/// Fits scaling and encoding state on training data and applies it
pub trait Preprocessor {
    fn fit(&mut self, train: &TimeSeriesTable) -> Result<()>;

    /// Turn raw rows into model-ready rows
    fn transform(&self, table: &TimeSeriesTable) -> Result<TimeSeriesTable>;

    /// Map forecast values of one target channel back to original units
    fn inverse_transform_forecast(
        &self,
        entity: &EntityKey,
        channel: usize,
        values: &[f64],
    ) -> Result<Vec<f64>>;

    fn categorical_vocab_sizes(&self) -> BTreeMap<String, usize>;
}

/// A (pretrained) forecaster
pub trait ForecastModel {
    fn config(&self) -> &ModelConfig;

    /// One forecast per window, in window order
    fn predict(&self, windows: &[ForecastWindow]) -> Result<Vec<Forecast>>;
}

/// Iterative optimisation of a model on training windows
pub trait TrainingLoop<M: ForecastModel> {
    fn train(
        &mut self,
        model: &mut M,
        train: &[ForecastWindow],
        valid: &[ForecastWindow],
        args: &TrainingArgs,
    ) -> Result<TrainingOutcome>;
}

/// Visual comparison of actual and predicted values of one entity
pub trait Plotter {
    fn plot(&mut self, series: &PlotSeries) -> Result<()>;
}
