//! Error types for the forecast_prep crate

use crate::split::Partition;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the forecast_prep crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A split partition of one entity is shorter than the context window
    #[error(
        "Insufficient history for entity '{entity}': {partition} split has {rows} rows, \
         context length is {context_length}"
    )]
    InsufficientHistory {
        entity: String,
        partition: Partition,
        rows: usize,
        context_length: usize,
    },

    /// An entity's partition is too short to yield a single forecast window
    #[error(
        "Entity '{entity}' yields no forecast windows: {partition} split has {rows} rows, \
         {required} needed"
    )]
    NoWindows {
        entity: String,
        partition: Partition,
        rows: usize,
        required: usize,
    },

    /// A few-shot fraction that selects no examples
    #[error("Few-shot fraction {fraction} of {dataset_size} examples selects no examples")]
    EmptySample { dataset_size: usize, fraction: f64 },

    /// Actual and predicted matrices that cannot be aligned
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Every row of an evaluation was masked out by missing actual values
    #[error("All {rows} rows of '{label}' were masked out by missing actual values")]
    EmptyMask { label: String, rows: usize },

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from a collaborator (model, training loop, plotter)
    #[error("Collaborator error: {0}")]
    CollaboratorError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error writing delimited output
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error reading an experiment configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from scaling or encoding
    #[error("Math error: {0}")]
    MathError(#[from] series_math::MathError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}
