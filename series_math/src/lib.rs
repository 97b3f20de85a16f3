//! # Series Math
//!
//! Numeric helpers shared by the forecasting preparation pipeline:
//! standard scaling of target channels, label encoding of categorical
//! columns and trailing-window statistics.

use thiserror::Error;

pub mod encoding;
pub mod moving_averages;
pub mod scaling;

/// Errors that can occur in series calculations
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),
}

/// Result type for series math operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Returns the observed (non-missing, non-NaN) values of a nullable series.
pub fn observed(values: &[Option<f64>]) -> impl Iterator<Item = f64> + '_ {
    values.iter().filter_map(|v| v.filter(|x| !x.is_nan()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observed_skips_missing_and_nan() {
        let values = [Some(1.0), None, Some(f64::NAN), Some(4.0)];
        let kept: Vec<f64> = observed(&values).collect();
        assert_eq!(kept, vec![1.0, 4.0]);
    }
}
