//! Experiment configuration

use crate::collaborators::TrainingArgs;
use crate::data::ColumnSpec;
use crate::error::{ForecastError, Result};
use crate::split::SplitConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// History consumed and horizon produced by the forecaster.
///
/// Fixed for a whole experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextWindow {
    pub context_length: usize,
    pub prediction_length: usize,
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self {
            context_length: 512,
            prediction_length: 96,
        }
    }
}

impl ContextWindow {
    pub fn new(context_length: usize, prediction_length: usize) -> Result<Self> {
        let window = Self {
            context_length,
            prediction_length,
        };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<()> {
        if self.context_length == 0 || self.prediction_length == 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Context and prediction lengths must be positive, got {} and {}",
                self.context_length, self.prediction_length
            )));
        }
        Ok(())
    }

    /// Rows spanned by one past-plus-future window
    pub fn total_length(&self) -> usize {
        self.context_length + self.prediction_length
    }
}

/// Everything a preparation and evaluation run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Input CSV file
    pub data_path: PathBuf,
    /// Directory receiving the split tables
    pub output_dir: PathBuf,
    pub columns: ColumnSpec,
    pub context: ContextWindow,
    pub split: SplitConfig,
    /// Offset between consecutive forecast windows
    pub stride: usize,
    /// Fraction of training windows kept for few-shot fine-tuning
    pub few_shot_fraction: Option<f64>,
    pub seed: u64,
    pub training: TrainingArgs,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data.csv"),
            output_dir: PathBuf::from("splits"),
            columns: ColumnSpec::default(),
            context: ContextWindow::default(),
            split: SplitConfig::default(),
            stride: 1,
            few_shot_fraction: None,
            seed: 42,
            training: TrainingArgs::default(),
        }
    }
}

impl ExperimentConfig {
    /// Read and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.context.validate()?;
        self.split.validate()?;
        self.training.validate()?;

        if self.columns.target_columns.is_empty() {
            return Err(ForecastError::ConfigError(
                "columns.target_columns must name at least one column".to_string(),
            ));
        }
        if self.stride == 0 {
            return Err(ForecastError::InvalidParameter(
                "stride must be at least 1".to_string(),
            ));
        }
        if let Some(fraction) = self.few_shot_fraction {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(ForecastError::InvalidParameter(format!(
                    "few_shot_fraction must be in (0, 1], got {}",
                    fraction
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_fills_defaults() {
        let config = ExperimentConfig::from_json_str(
            r#"{ "columns": { "timestamp_column": "ds", "target_columns": ["y"] } }"#,
        )
        .unwrap();

        assert_eq!(config.columns.timestamp_column, "ds");
        assert_eq!(config.context, ContextWindow::default());
        assert_eq!(config.seed, 42);
        assert_eq!(config.stride, 1);
        assert!(config.few_shot_fraction.is_none());
    }

    #[test]
    fn json_round_trip_preserves_config() {
        let mut config = ExperimentConfig::default();
        config.columns = ColumnSpec::new("date", &["sales"]).with_id_columns(&["region"]);
        config.few_shot_fraction = Some(0.05);

        let parsed = ExperimentConfig::from_json_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(ExperimentConfig::from_json_str(r#"{ "columns": { "target_columns": [] } }"#).is_err());
        assert!(ExperimentConfig::from_json_str(
            r#"{ "columns": { "target_columns": ["y"] }, "context": { "context_length": 0, "prediction_length": 4 } }"#
        )
        .is_err());
        assert!(ExperimentConfig::from_json_str(
            r#"{ "columns": { "target_columns": ["y"] }, "few_shot_fraction": 0.0 }"#
        )
        .is_err());
        assert!(ContextWindow::new(8, 0).is_err());
    }
}
