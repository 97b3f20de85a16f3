//! Sliding past/future windows over each entity
//!
//! One window is one model example: `context_length` past rows followed by
//! `prediction_length` future rows of the same entity. Channels are the
//! target columns followed by the control columns.

use crate::config::ContextWindow;
use crate::data::{EntityKey, TimeSeriesTable};
use crate::error::{ForecastError, Result};
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// A single past/future example of one entity
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastWindow {
    pub entity: EntityKey,
    /// Offset of the first past row inside the entity's series
    pub offset: usize,
    /// Number of leading channels that are forecast targets
    pub target_count: usize,
    /// Past values per channel, `[channel][step]`
    pub past_values: Vec<Vec<Option<f64>>>,
    /// Future values per channel, `[channel][step]`
    pub future_values: Vec<Vec<Option<f64>>>,
    pub future_timestamps: Vec<NaiveDateTime>,
}

impl ForecastWindow {
    pub fn channel_count(&self) -> usize {
        self.past_values.len()
    }

    pub fn context_length(&self) -> usize {
        self.past_values.first().map_or(0, Vec::len)
    }

    pub fn prediction_length(&self) -> usize {
        self.future_values.first().map_or(0, Vec::len)
    }

    pub fn past_target(&self, channel: usize) -> Option<&[Option<f64>]> {
        self.past_values[..self.target_count]
            .get(channel)
            .map(Vec::as_slice)
    }

    pub fn future_target(&self, channel: usize) -> Option<&[Option<f64>]> {
        self.future_values[..self.target_count]
            .get(channel)
            .map(Vec::as_slice)
    }
}

/// Build every window of `window.total_length()` rows, advancing by
/// `stride` rows, for every entity of `table`.
///
/// Entities shorter than one window contribute no windows.
pub fn build_windows(
    table: &TimeSeriesTable,
    window: &ContextWindow,
    stride: usize,
) -> Result<Vec<ForecastWindow>> {
    build(table, None, window, stride)
}

/// Like [`build_windows`], but each entity's series is preceded by its last
/// `context_length` rows in `history`, the chronologically previous
/// partition.
///
/// Every future row still comes from `table`, so its first rows are
/// forecast too, and an entity needs only `prediction_length` rows of its
/// own once its history covers the context. Offsets count from the first
/// borrowed history row.
pub fn build_windows_with_history(
    table: &TimeSeriesTable,
    history: &TimeSeriesTable,
    window: &ContextWindow,
    stride: usize,
) -> Result<Vec<ForecastWindow>> {
    build(table, Some(history), window, stride)
}

/// Per-channel values and timestamps of one table, rows addressed by index
struct RowSource {
    channels: Vec<Vec<Option<f64>>>,
    timestamps: Vec<NaiveDateTime>,
}

impl RowSource {
    fn read(table: &TimeSeriesTable) -> Result<Self> {
        let spec = table.column_spec();
        let channels = spec
            .target_columns
            .iter()
            .chain(&spec.control_columns)
            .map(|name| table.column_f64(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            channels,
            timestamps: table.timestamps()?,
        })
    }

    /// Append `other`, returning the index of its first row
    fn extend(&mut self, other: RowSource) -> Result<usize> {
        if other.channels.len() != self.channels.len() {
            return Err(ForecastError::ShapeMismatch(format!(
                "history has {} channels, table has {}",
                self.channels.len(),
                other.channels.len()
            )));
        }
        let first = self.timestamps.len();
        for (values, more) in self.channels.iter_mut().zip(other.channels) {
            values.extend(more);
        }
        self.timestamps.extend(other.timestamps);
        Ok(first)
    }

    fn gather(&self, rows: &[usize]) -> Vec<Vec<Option<f64>>> {
        self.channels
            .iter()
            .map(|values| rows.iter().map(|&r| values[r]).collect())
            .collect()
    }
}

fn build(
    table: &TimeSeriesTable,
    history: Option<&TimeSeriesTable>,
    window: &ContextWindow,
    stride: usize,
) -> Result<Vec<ForecastWindow>> {
    window.validate()?;
    if stride == 0 {
        return Err(ForecastError::InvalidParameter(
            "Window stride must be at least 1".to_string(),
        ));
    }

    // History rows come first in `source`; `table` rows follow at `base`.
    let own = RowSource::read(table)?;
    let (source, base, tails) = match history {
        Some(history) => {
            let tails: HashMap<EntityKey, Vec<usize>> = history
                .entities()?
                .into_iter()
                .map(|(entity, rows)| {
                    let skip = rows.len().saturating_sub(window.context_length);
                    (entity, rows[skip..].to_vec())
                })
                .collect();
            let mut source = RowSource::read(history)?;
            let base = source.extend(own)?;
            (source, base, tails)
        }
        None => (own, 0, HashMap::new()),
    };
    let target_count = table.column_spec().target_columns.len();
    let total = window.total_length();

    let mut windows = Vec::new();
    for (entity, own_rows) in table.entities()? {
        let mut rows = tails.get(&entity).cloned().unwrap_or_default();
        rows.extend(own_rows.iter().map(|&r| base + r));

        if rows.len() < total {
            debug!(%entity, rows = rows.len(), needed = total, "entity too short for a window");
            continue;
        }

        for offset in (0..=rows.len() - total).step_by(stride) {
            let past_rows = &rows[offset..offset + window.context_length];
            let future_rows = &rows[offset + window.context_length..offset + total];

            windows.push(ForecastWindow {
                entity: entity.clone(),
                offset,
                target_count,
                past_values: source.gather(past_rows),
                future_values: source.gather(future_rows),
                future_timestamps: future_rows.iter().map(|&r| source.timestamps[r]).collect(),
            });
        }
    }

    info!(
        windows = windows.len(),
        context_length = window.context_length,
        prediction_length = window.prediction_length,
        stride,
        with_history = history.is_some(),
        "built forecast windows"
    );
    Ok(windows)
}

/// Keep only the windows at `indices`, in index order
pub fn select_windows(
    windows: &[ForecastWindow],
    indices: &BTreeSet<usize>,
) -> Result<Vec<ForecastWindow>> {
    indices
        .iter()
        .map(|&i| {
            windows.get(i).cloned().ok_or_else(|| {
                ForecastError::InvalidParameter(format!(
                    "Window index {} is out of range for {} windows",
                    i,
                    windows.len()
                ))
            })
        })
        .collect()
}
