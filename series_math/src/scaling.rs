//! Standard (z-score) scaling of a single channel
//!
//! The scaler is fitted on the observed values of a training series and
//! then applied unchanged to validation, test and forecast values.

use crate::{observed, MathError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Standard deviations below this are treated as a constant series.
const MIN_SCALE: f64 = 1e-10;

/// Fitted mean and scale of one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: f64,
    scale: f64,
}

impl StandardScaler {
    /// Fit a scaler on the observed values of `values`.
    ///
    /// Missing and NaN entries are ignored. A constant series gets a scale
    /// of `1.0` so transforming it only removes the mean.
    pub fn fit(values: &[Option<f64>]) -> Result<Self> {
        let kept: Vec<f64> = observed(values).collect();
        if kept.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot fit a scaler without any observed values".to_string(),
            ));
        }

        let mean = kept.iter().mean();
        let std_dev = kept.iter().population_std_dev();
        let scale = if std_dev.is_finite() && std_dev > MIN_SCALE {
            std_dev
        } else {
            1.0
        };

        Ok(Self { mean, scale })
    }

    /// Build a scaler from known statistics
    pub fn from_parts(mean: f64, scale: f64) -> Result<Self> {
        if !mean.is_finite() {
            return Err(MathError::InvalidInput(format!("Mean must be finite, got {}", mean)));
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(MathError::InvalidInput(format!(
                "Scale must be positive and finite, got {}",
                scale
            )));
        }
        Ok(Self { mean, scale })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }

    pub fn inverse_transform(&self, value: f64) -> f64 {
        value * self.scale + self.mean
    }

    /// Scale a nullable series, keeping missing entries missing
    pub fn transform_series(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        values.iter().map(|v| v.map(|x| self.transform(x))).collect()
    }

    /// Map scaled values back to the original units
    pub fn inverse_transform_series(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.inverse_transform(v)).collect()
    }
}
