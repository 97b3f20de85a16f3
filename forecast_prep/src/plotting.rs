//! Actual-versus-predicted series for plotting

use crate::collaborators::{Forecast, Plotter};
use crate::data::EntityKey;
use crate::error::{ForecastError, Result};
use crate::windows::ForecastWindow;
use chrono::NaiveDateTime;
use std::fs::File;
use std::path::Path;

/// One entity's forecast next to its actual values, for one target channel
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub entity: EntityKey,
    pub channel: usize,
    pub timestamps: Vec<NaiveDateTime>,
    pub actual: Vec<Option<f64>>,
    pub predicted: Vec<f64>,
}

impl PlotSeries {
    pub fn from_window(window: &ForecastWindow, forecast: &Forecast, channel: usize) -> Result<Self> {
        let actual = window.future_target(channel).ok_or_else(|| {
            ForecastError::InvalidParameter(format!(
                "Channel {} is not a target channel ({} targets)",
                channel, window.target_count
            ))
        })?;
        let predicted = forecast.values.get(channel).ok_or_else(|| {
            ForecastError::ShapeMismatch(format!("forecast has no channel {}", channel))
        })?;
        if predicted.len() > actual.len() {
            return Err(ForecastError::ShapeMismatch(format!(
                "forecast has {} steps but only {} actual steps exist",
                predicted.len(),
                actual.len()
            )));
        }

        let horizon = predicted.len();
        Ok(Self {
            entity: window.entity.clone(),
            channel,
            timestamps: window.future_timestamps.iter().take(horizon).copied().collect(),
            actual: actual[..horizon].to_vec(),
            predicted: predicted.clone(),
        })
    }
}

/// Writes plot series as `entity,channel,step,timestamp,actual,predicted`
/// rows for an external plotting tool
pub struct CsvPlotExporter {
    writer: csv::Writer<File>,
}

impl CsvPlotExporter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["entity", "channel", "step", "timestamp", "actual", "predicted"])?;
        Ok(Self { writer })
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Plotter for CsvPlotExporter {
    fn plot(&mut self, series: &PlotSeries) -> Result<()> {
        let entity = series.entity.to_string();
        let channel = series.channel.to_string();

        for (step, predicted) in series.predicted.iter().enumerate() {
            let timestamp = series
                .timestamps
                .get(step)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();
            let actual = series
                .actual
                .get(step)
                .copied()
                .flatten()
                .map(|v| v.to_string())
                .unwrap_or_default();
            let step = step.to_string();
            let predicted = predicted.to_string();

            self.writer.write_record([
                entity.as_str(),
                channel.as_str(),
                step.as_str(),
                timestamp.as_str(),
                actual.as_str(),
                predicted.as_str(),
            ])?;
        }
        Ok(())
    }
}
