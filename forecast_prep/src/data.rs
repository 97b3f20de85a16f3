//! Multi-entity time series tables

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Timestamp layouts accepted in text columns, tried in order
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Role assignment of the columns of a time series table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    /// Name of the time column
    pub timestamp_column: String,
    /// Columns whose combined values identify one entity
    pub id_columns: Vec<String>,
    /// Numeric columns to forecast
    pub target_columns: Vec<String>,
    /// Numeric covariates known in the past and the future
    pub control_columns: Vec<String>,
    /// Categorical columns constant per entity
    pub static_categorical_columns: Vec<String>,
    /// Time-varying categorical columns
    pub categorical_columns: Vec<String>,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            timestamp_column: "date".to_string(),
            id_columns: Vec::new(),
            target_columns: Vec::new(),
            control_columns: Vec::new(),
            static_categorical_columns: Vec::new(),
            categorical_columns: Vec::new(),
        }
    }
}

impl ColumnSpec {
    pub fn new(timestamp_column: &str, target_columns: &[&str]) -> Self {
        Self {
            timestamp_column: timestamp_column.to_string(),
            target_columns: to_owned(target_columns),
            ..Self::default()
        }
    }

    pub fn with_id_columns(mut self, columns: &[&str]) -> Self {
        self.id_columns = to_owned(columns);
        self
    }

    pub fn with_control_columns(mut self, columns: &[&str]) -> Self {
        self.control_columns = to_owned(columns);
        self
    }

    pub fn with_static_categorical_columns(mut self, columns: &[&str]) -> Self {
        self.static_categorical_columns = to_owned(columns);
        self
    }

    pub fn with_categorical_columns(mut self, columns: &[&str]) -> Self {
        self.categorical_columns = to_owned(columns);
        self
    }

    /// Every column named by the spec, timestamp first
    pub fn all_columns(&self) -> impl Iterator<Item = &String> {
        std::iter::once(&self.timestamp_column)
            .chain(&self.id_columns)
            .chain(&self.target_columns)
            .chain(&self.control_columns)
            .chain(&self.static_categorical_columns)
            .chain(&self.categorical_columns)
    }
}

fn to_owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

/// Identity of one series inside a table: the values of its id columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey(Vec<String>);

impl EntityKey {
    pub fn new<S: Into<String>>(parts: Vec<S>) -> Self {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Key of a table without id columns, where all rows form one series
    pub fn whole_table() -> Self {
        Self(Vec::new())
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<all>")
        } else {
            write!(f, "{}", self.0.join("/"))
        }
    }
}

/// Time series table: a data frame plus the role of its columns.
///
/// Rows of one entity are expected in chronological order; operations
/// never reorder them.
#[derive(Debug, Clone)]
pub struct TimeSeriesTable {
    df: DataFrame,
    spec: ColumnSpec,
}

impl TimeSeriesTable {
    /// Load a table from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P, spec: ColumnSpec) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        debug!(path = %path.display(), rows = df.height(), "loaded csv table");
        Self::from_dataframe(df, spec)
    }

    /// Wrap an existing DataFrame, checking that every named column exists
    pub fn from_dataframe(df: DataFrame, spec: ColumnSpec) -> Result<Self> {
        if spec.target_columns.is_empty() {
            return Err(ForecastError::DataError(
                "At least one target column is required".to_string(),
            ));
        }

        let present = df.get_column_names();
        for name in spec.all_columns() {
            if !present.contains(&name.as_str()) {
                return Err(ForecastError::DataError(format!(
                    "Column '{}' not found in data",
                    name
                )));
            }
        }

        for name in spec.target_columns.iter().chain(&spec.control_columns) {
            let dtype = df.column(name)?.dtype();
            if !dtype.is_numeric() {
                return Err(ForecastError::DataError(format!(
                    "Column '{}' must be numeric, found {}",
                    name, dtype
                )));
            }
        }

        Ok(Self { df, spec })
    }

    /// Same column roles over a different frame
    pub(crate) fn with_frame(&self, df: DataFrame) -> Self {
        Self {
            df,
            spec: self.spec.clone(),
        }
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn column_spec(&self) -> &ColumnSpec {
        &self.spec
    }

    pub fn target_columns(&self) -> &[String] {
        &self.spec.target_columns
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    fn column(&self, name: &str) -> Result<&Series> {
        self.df.column(name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", name, e))
        })
    }

    /// Values of a numeric column as nullable f64
    pub fn column_f64(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let col = self.column(name)?;
        if !col.dtype().is_numeric() {
            return Err(ForecastError::DataError(format!(
                "Column '{}' cannot be converted to f64",
                name
            )));
        }

        let as_float = col.cast(&DataType::Float64)?;
        let values = as_float.f64()?;
        Ok(values.into_iter().collect())
    }

    /// Values of any column rendered as text
    pub fn column_strings(&self, name: &str) -> Result<Vec<Option<String>>> {
        let col = self.column(name)?;
        let as_text = col.cast(&DataType::Utf8)?;
        let values = as_text.utf8()?;
        Ok(values.into_iter().map(|v| v.map(str::to_string)).collect())
    }

    /// Entities in order of first appearance, each with its row indices
    pub fn entities(&self) -> Result<Vec<(EntityKey, Vec<usize>)>> {
        self.entities_by(&self.spec.id_columns)
    }

    /// Group rows by an arbitrary set of id columns
    pub fn entities_by(&self, id_columns: &[String]) -> Result<Vec<(EntityKey, Vec<usize>)>> {
        if id_columns.is_empty() {
            return Ok(vec![(EntityKey::whole_table(), (0..self.len()).collect())]);
        }

        let id_values = id_columns
            .iter()
            .map(|name| self.column_strings(name))
            .collect::<Result<Vec<_>>>()?;

        let mut groups: Vec<(EntityKey, Vec<usize>)> = Vec::new();
        let mut lookup: HashMap<EntityKey, usize> = HashMap::new();

        for row in 0..self.len() {
            let mut parts = Vec::with_capacity(id_columns.len());
            for (name, values) in id_columns.iter().zip(&id_values) {
                match &values[row] {
                    Some(value) => parts.push(value.clone()),
                    None => {
                        return Err(ForecastError::DataError(format!(
                            "Missing value in id column '{}' at row {}",
                            name, row
                        )))
                    }
                }
            }

            let key = EntityKey(parts);
            match lookup.get(&key) {
                Some(&slot) => groups[slot].1.push(row),
                None => {
                    lookup.insert(key.clone(), groups.len());
                    groups.push((key, vec![row]));
                }
            }
        }

        Ok(groups)
    }

    /// Parsed timestamps of every row
    pub fn timestamps(&self) -> Result<Vec<NaiveDateTime>> {
        let name = &self.spec.timestamp_column;
        let col = self.column(name)?;
        let missing = |row: usize| {
            ForecastError::DataError(format!("Missing timestamp in '{}' at row {}", name, row))
        };

        match col.dtype() {
            DataType::Utf8 => col
                .utf8()?
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    let text = value.ok_or_else(|| missing(row))?;
                    parse_timestamp(text).ok_or_else(|| {
                        ForecastError::DataError(format!(
                            "Cannot parse timestamp '{}' at row {}",
                            text, row
                        ))
                    })
                })
                .collect(),
            DataType::Date => {
                let days = col.cast(&DataType::Int32)?;
                let epoch = epoch_start();
                days.i32()?
                    .into_iter()
                    .enumerate()
                    .map(|(row, value)| {
                        let value = value.ok_or_else(|| missing(row))?;
                        Ok(epoch + Duration::days(value as i64))
                    })
                    .collect()
            }
            DataType::Datetime(unit, _) => {
                let unit = *unit;
                let raw = col.cast(&DataType::Int64)?;
                raw.i64()?
                    .into_iter()
                    .enumerate()
                    .map(|(row, value)| {
                        let value = value.ok_or_else(|| missing(row))?;
                        datetime_from_epoch(value, unit).ok_or_else(|| {
                            ForecastError::DataError(format!(
                                "Timestamp out of range at row {}",
                                row
                            ))
                        })
                    })
                    .collect()
            }
            other => Err(ForecastError::DataError(format!(
                "Column '{}' of type {} is not a timestamp",
                name, other
            ))),
        }
    }

    /// Check that every entity sits on a fixed-frequency grid.
    ///
    /// Returns the step of each entity with at least two rows.
    pub fn validate_frequency(&self) -> Result<Vec<(EntityKey, Duration)>> {
        let timestamps = self.timestamps()?;
        let mut steps = Vec::new();

        for (entity, rows) in self.entities()? {
            if rows.len() < 2 {
                continue;
            }

            let step = timestamps[rows[1]] - timestamps[rows[0]];
            if step <= Duration::zero() {
                return Err(ForecastError::DataError(format!(
                    "Entity '{}': timestamps are not strictly increasing at row {}",
                    entity, rows[1]
                )));
            }

            for pair in rows.windows(2) {
                if timestamps[pair[1]] - timestamps[pair[0]] != step {
                    return Err(ForecastError::DataError(format!(
                        "Entity '{}': timestamp at row {} breaks the {}s grid",
                        entity,
                        pair[1],
                        step.num_seconds()
                    )));
                }
            }

            steps.push((entity, step));
        }

        Ok(steps)
    }

    /// Owned copy of the given rows, in the given order
    pub fn take_rows(&self, rows: &[usize]) -> Result<Self> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.len()) {
            return Err(ForecastError::DataError(format!(
                "Row {} is out of bounds for a table of {} rows",
                bad,
                self.len()
            )));
        }

        let indices: Vec<IdxSize> = rows.iter().map(|&r| r as IdxSize).collect();
        let indices = IdxCa::from_vec("rows", indices);
        let df = self.df.take(&indices)?;
        Ok(self.with_frame(df))
    }

    /// Owned copy of a contiguous range of rows
    pub fn slice(&self, start: usize, len: usize) -> Self {
        self.with_frame(self.df.slice(start as i64, len))
    }

    /// Write the table as CSV with a header row
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        let mut df = self.df.clone();
        CsvWriter::new(&mut file).has_header(true).finish(&mut df)?;
        Ok(())
    }
}

fn epoch_start() -> NaiveDateTime {
    NaiveDateTime::default()
}

fn datetime_from_epoch(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let per_second: i64 = match unit {
        TimeUnit::Nanoseconds => 1_000_000_000,
        TimeUnit::Microseconds => 1_000_000,
        TimeUnit::Milliseconds => 1_000,
    };
    let secs = value.div_euclid(per_second);
    let nanos = value.rem_euclid(per_second) * (1_000_000_000 / per_second);
    NaiveDateTime::from_timestamp_opt(secs, nanos as u32)
}

/// Parse a timestamp in one of the accepted text layouts
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed);
        }
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_utc());
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}
