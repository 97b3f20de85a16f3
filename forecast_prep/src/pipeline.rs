//! End-to-end preparation and evaluation of one experiment
//!
//! The flow mirrors a fine-tuning workshop: split the raw table, fit the
//! preprocessor on the training split, window every split, optionally keep
//! a few-shot subset of the training windows, then score model forecasts
//! on the test windows.

use crate::collaborators::{
    ForecastModel, ModelConfig, Plotter, Preprocessor, TrainingLoop, TrainingOutcome,
};
use crate::config::ExperimentConfig;
use crate::data::TimeSeriesTable;
use crate::error::{ForecastError, Result};
use crate::metrics::{ForecastResult, MetricReport};
use crate::plotting::PlotSeries;
use crate::preprocessing::TimeSeriesPreprocessor;
use crate::sampling::sample_few_shot;
use crate::split::{split_by_entity, Partition, Splits};
use crate::windows::{
    build_windows, build_windows_with_history, select_windows, ForecastWindow,
};
use std::collections::{BTreeSet, HashSet};
use tracing::info;

/// Model-ready splits and their windows
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Train, validation and test tables as split, before preprocessing
    pub raw_splits: Splits,
    /// Preprocessed train, validation and test tables
    pub splits: Splits,
    /// Training windows, already reduced to the few-shot subset if any
    pub train_windows: Vec<ForecastWindow>,
    pub valid_windows: Vec<ForecastWindow>,
    pub test_windows: Vec<ForecastWindow>,
    /// Indices into the full training windows kept for few-shot runs
    pub few_shot_indices: Option<BTreeSet<usize>>,
}

/// Fail on the first entity of `table` that contributed no window
fn ensure_windows(
    table: &TimeSeriesTable,
    windows: &[ForecastWindow],
    partition: Partition,
    required: usize,
) -> Result<()> {
    let covered: HashSet<_> = windows.iter().map(|w| &w.entity).collect();
    match table
        .entities()?
        .into_iter()
        .find(|(entity, _)| !covered.contains(entity))
    {
        Some((entity, rows)) => Err(ForecastError::NoWindows {
            entity: entity.to_string(),
            partition,
            rows: rows.len(),
            required,
        }),
        None => Ok(()),
    }
}

/// One configured experiment and its fitted preprocessor
#[derive(Debug)]
pub struct Experiment<P: Preprocessor = TimeSeriesPreprocessor> {
    config: ExperimentConfig,
    preprocessor: P,
}

impl Experiment<TimeSeriesPreprocessor> {
    pub fn new(config: ExperimentConfig) -> Result<Self> {
        Self::with_preprocessor(config, TimeSeriesPreprocessor::new())
    }
}

impl<P: Preprocessor> Experiment<P> {
    pub fn with_preprocessor(config: ExperimentConfig, preprocessor: P) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            preprocessor,
        })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn preprocessor(&self) -> &P {
        &self.preprocessor
    }

    /// Read the configured CSV file
    pub fn load_table(&self) -> Result<TimeSeriesTable> {
        TimeSeriesTable::from_csv(&self.config.data_path, self.config.columns.clone())
    }

    /// Split, preprocess and window `table`
    pub fn prepare(&mut self, table: &TimeSeriesTable) -> Result<PreparedData> {
        let config = &self.config;
        let raw = split_by_entity(
            table,
            &config.columns.id_columns,
            &config.split,
            config.context.context_length,
        )?;

        self.preprocessor.fit(&raw.train)?;
        let splits = Splits {
            train: self.preprocessor.transform(&raw.train)?,
            valid: self.preprocessor.transform(&raw.valid)?,
            test: self.preprocessor.transform(&raw.test)?,
        };

        // Validation and test windows take their context from the end of
        // the previous partition.
        let context = &config.context;
        let mut train_windows = build_windows(&splits.train, context, config.stride)?;
        let valid_windows =
            build_windows_with_history(&splits.valid, &splits.train, context, config.stride)?;
        let test_windows =
            build_windows_with_history(&splits.test, &splits.valid, context, config.stride)?;

        ensure_windows(&splits.train, &train_windows, Partition::Train, context.total_length())?;
        ensure_windows(&splits.valid, &valid_windows, Partition::Valid, context.prediction_length)?;
        ensure_windows(&splits.test, &test_windows, Partition::Test, context.prediction_length)?;

        let few_shot_indices = match config.few_shot_fraction {
            Some(fraction) => {
                let indices = sample_few_shot(train_windows.len(), fraction, config.seed)?;
                info!(
                    kept = indices.len(),
                    of = train_windows.len(),
                    fraction,
                    seed = config.seed,
                    "selected few-shot training windows"
                );
                train_windows = select_windows(&train_windows, &indices)?;
                Some(indices)
            }
            None => None,
        };

        Ok(PreparedData {
            raw_splits: raw,
            splits,
            train_windows,
            valid_windows,
            test_windows,
            few_shot_indices,
        })
    }

    /// Model configuration matching the prepared channel layout
    pub fn model_config(&self) -> ModelConfig {
        let columns = &self.config.columns;
        ModelConfig::for_channels(
            &self.config.context,
            columns.target_columns.len(),
            columns.control_columns.len(),
        )
        .with_vocab_sizes(self.preprocessor.categorical_vocab_sizes())
    }

    /// Forecast `windows` with `model` and score the forecasts
    pub fn evaluate<M: ForecastModel>(
        &self,
        model: &M,
        windows: &[ForecastWindow],
        label: &str,
    ) -> Result<MetricReport> {
        let forecasts = model.predict(windows)?;
        ForecastResult::from_windows(windows, &forecasts)?.evaluate(label)
    }

    /// Fine-tune `model` on the prepared training windows, then score it
    /// on the test windows
    pub fn fine_tune_and_evaluate<M, T>(
        &self,
        trainer: &mut T,
        model: &mut M,
        prepared: &PreparedData,
        label: &str,
    ) -> Result<(TrainingOutcome, MetricReport)>
    where
        M: ForecastModel,
        T: TrainingLoop<M>,
    {
        let outcome = trainer.train(
            model,
            &prepared.train_windows,
            &prepared.valid_windows,
            &self.config.training,
        )?;
        info!(
            label,
            eval_loss = outcome.eval_loss,
            epochs = outcome.epochs_run,
            "fine-tuning finished"
        );

        let report = self.evaluate(model, &prepared.test_windows, label)?;
        Ok((outcome, report))
    }

    /// Hand the first `limit` windows' forecasts, in original units, to a
    /// plotter. Returns the number of series plotted.
    pub fn plot_forecasts<M, Pl>(
        &self,
        model: &M,
        windows: &[ForecastWindow],
        plotter: &mut Pl,
        limit: usize,
    ) -> Result<usize>
    where
        M: ForecastModel,
        Pl: Plotter,
    {
        let windows = &windows[..limit.min(windows.len())];
        let forecasts = model.predict(windows)?;

        let mut plotted = 0;
        for (window, forecast) in windows.iter().zip(&forecasts) {
            for channel in 0..window.target_count {
                let mut series = PlotSeries::from_window(window, forecast, channel)?;
                series.predicted = self.preprocessor.inverse_transform_forecast(
                    &window.entity,
                    channel,
                    &series.predicted,
                )?;
                series.actual = self.restore_actual(window, channel, &series.actual)?;
                plotter.plot(&series)?;
                plotted += 1;
            }
        }
        Ok(plotted)
    }

    fn restore_actual(
        &self,
        window: &ForecastWindow,
        channel: usize,
        actual: &[Option<f64>],
    ) -> Result<Vec<Option<f64>>> {
        let observed: Vec<f64> = actual.iter().map(|v| v.unwrap_or(0.0)).collect();
        let restored =
            self.preprocessor
                .inverse_transform_forecast(&window.entity, channel, &observed)?;
        Ok(actual
            .iter()
            .zip(restored)
            .map(|(original, value)| original.map(|_| value))
            .collect())
    }
}
