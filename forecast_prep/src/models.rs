//! Baseline forecasters
//!
//! Zero-shot reference points for a pretrained model: both forecast every
//! target channel from its own past values only.

use crate::collaborators::{Forecast, ForecastModel, ModelConfig};
use crate::error::{ForecastError, Result};
use crate::windows::ForecastWindow;
use series_math::moving_averages::trailing_observed_mean;

fn check_window(config: &ModelConfig, window: &ForecastWindow) -> Result<()> {
    if window.context_length() != config.context_length {
        return Err(ForecastError::ShapeMismatch(format!(
            "window for entity '{}' has {} past steps, model expects {}",
            window.entity,
            window.context_length(),
            config.context_length
        )));
    }
    if let Some(&channel) = config
        .prediction_channel_indices
        .iter()
        .find(|&&c| c >= window.channel_count())
    {
        return Err(ForecastError::ShapeMismatch(format!(
            "prediction channel {} is outside a window of {} channels",
            channel,
            window.channel_count()
        )));
    }
    Ok(())
}

/// Repeats the last observed value of each channel over the horizon
#[derive(Debug, Clone)]
pub struct NaiveForecaster {
    config: ModelConfig,
}

impl NaiveForecaster {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }
}

impl ForecastModel for NaiveForecaster {
    fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn predict(&self, windows: &[ForecastWindow]) -> Result<Vec<Forecast>> {
        windows
            .iter()
            .map(|window| {
                check_window(&self.config, window)?;
                let values = self
                    .config
                    .prediction_channel_indices
                    .iter()
                    .map(|&channel| {
                        let last = window.past_values[channel]
                            .iter()
                            .rev()
                            .find_map(|v| v.filter(|x| !x.is_nan()))
                            .ok_or_else(|| {
                                ForecastError::DataError(format!(
                                    "Entity '{}' has no observed past value in channel {}",
                                    window.entity, channel
                                ))
                            })?;
                        Ok(vec![last; self.config.prediction_length])
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Forecast::new(values))
            })
            .collect()
    }
}

/// Forecasts the mean of the last `window` observed values of each channel
#[derive(Debug, Clone)]
pub struct MovingAverageForecaster {
    config: ModelConfig,
    window: usize,
}

impl MovingAverageForecaster {
    pub fn new(config: ModelConfig, window: usize) -> Result<Self> {
        if window == 0 || window > config.context_length {
            return Err(ForecastError::InvalidParameter(format!(
                "Window size must be between 1 and the context length {}, got {}",
                config.context_length, window
            )));
        }
        Ok(Self { config, window })
    }
}

impl ForecastModel for MovingAverageForecaster {
    fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn predict(&self, windows: &[ForecastWindow]) -> Result<Vec<Forecast>> {
        let mut forecasts = Vec::with_capacity(windows.len());
        for window in windows {
            check_window(&self.config, window)?;
            let mut values = Vec::with_capacity(self.config.prediction_channel_indices.len());
            for &channel in &self.config.prediction_channel_indices {
                let level = trailing_observed_mean(&window.past_values[channel], self.window)?;
                values.push(vec![level; self.config.prediction_length]);
            }
            forecasts.push(Forecast::new(values));
        }
        Ok(forecasts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContextWindow;
    use crate::data::EntityKey;

    fn window(past: &[Option<f64>]) -> ForecastWindow {
        ForecastWindow {
            entity: EntityKey::new(vec!["a"]),
            offset: 0,
            target_count: 1,
            past_values: vec![past.to_vec()],
            future_values: vec![vec![Some(0.0); 2]],
            future_timestamps: Vec::new(),
        }
    }

    fn config(context: usize) -> ModelConfig {
        ModelConfig::for_channels(&ContextWindow::new(context, 2).unwrap(), 1, 0)
    }

    #[test]
    fn naive_repeats_last_observed_value() {
        let model = NaiveForecaster::new(config(3));
        let forecasts = model.predict(&[window(&[Some(1.0), Some(4.0), None])]).unwrap();
        assert_eq!(forecasts[0].values, vec![vec![4.0, 4.0]]);
        assert_eq!(forecasts[0].horizon(), 2);
    }

    #[test]
    fn moving_average_uses_trailing_window() {
        let model = MovingAverageForecaster::new(config(4), 2).unwrap();
        let forecasts = model
            .predict(&[window(&[Some(1.0), Some(2.0), Some(4.0), Some(6.0)])])
            .unwrap();
        assert_eq!(forecasts[0].values, vec![vec![5.0, 5.0]]);
    }

    #[test]
    fn wrong_context_length_is_rejected() {
        let model = NaiveForecaster::new(config(5));
        assert!(matches!(
            model.predict(&[window(&[Some(1.0)])]),
            Err(ForecastError::ShapeMismatch(_))
        ));
        assert!(MovingAverageForecaster::new(config(3), 4).is_err());
    }
}
