//! Trailing-window averages over a history

use crate::{MathError, Result};

/// Mean of the last `period` values of `history`
pub fn trailing_mean(history: &[f64], period: usize) -> Result<f64> {
    if period == 0 {
        return Err(MathError::InvalidInput(
            "Period must be greater than zero".to_string(),
        ));
    }
    if history.len() < period {
        return Err(MathError::InsufficientData(format!(
            "Not enough data for a trailing mean. Need {} values, have {}.",
            period,
            history.len()
        )));
    }

    let tail = &history[history.len() - period..];
    Ok(tail.iter().sum::<f64>() / period as f64)
}

/// Mean of the last `period` observed values of a nullable history.
///
/// Missing entries are skipped, so the window reaches further back when
/// the tail has gaps.
pub fn trailing_observed_mean(history: &[Option<f64>], period: usize) -> Result<f64> {
    let observed: Vec<f64> = crate::observed(history).collect();
    trailing_mean(&observed, period)
}
