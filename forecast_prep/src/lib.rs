//! # Forecast Prep
//!
//! Data preparation and evaluation for fine-tuning pretrained multivariate
//! time series forecasters.
//!
//! ## Features
//!
//! - Multi-entity time series tables backed by polars (CSV in and out)
//! - Chronological per-entity train/validation/test splits
//! - Seeded few-shot subsampling of training windows
//! - Sliding context/horizon windows
//! - Per-entity scaling and categorical encoding
//! - MSE / RMSE / MAE scoring with horizon reconciliation and missing-value masking
//!
//! The forecasting model, training loop and plotting library are external;
//! see [`collaborators`] for the traits they implement.
//!
//! ## Quick Start
//!
//! ```no_run
//! use forecast_prep::data::{ColumnSpec, TimeSeriesTable};
//! use forecast_prep::metrics::compute_metrics;
//! use forecast_prep::sampling::sample_few_shot;
//! use forecast_prep::split::{split_by_entity, SplitConfig};
//!
//! # fn main() -> forecast_prep::Result<()> {
//! let spec = ColumnSpec::new("date", &["sales"]).with_id_columns(&["region"]);
//! let table = TimeSeriesTable::from_csv("sales.csv", spec)?;
//!
//! let splits = split_by_entity(
//!     &table,
//!     &["region".to_string()],
//!     &SplitConfig::new(0.7, 0.2)?,
//!     64,
//! )?;
//! println!("{} training rows", splits.train.len());
//!
//! let few_shot = sample_few_shot(1_000, 0.05, 42)?;
//! assert_eq!(few_shot.len(), 50);
//!
//! let report = compute_metrics(
//!     &[vec![Some(1.0), Some(2.0), Some(3.0)]],
//!     &[vec![1.0, 2.5]],
//!     "zero-shot",
//! )?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

pub mod collaborators;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod plotting;
pub mod preprocessing;
pub mod sampling;
pub mod split;
pub mod windows;

// Re-export commonly used types
pub use crate::collaborators::{Forecast, ForecastModel, Plotter, Preprocessor, TrainingLoop};
pub use crate::config::{ContextWindow, ExperimentConfig};
pub use crate::data::{ColumnSpec, EntityKey, TimeSeriesTable};
pub use crate::error::{ForecastError, Result};
pub use crate::metrics::{compute_metrics, ForecastResult, MetricReport, MetricTable};
pub use crate::sampling::sample_few_shot;
pub use crate::split::{split_by_entity, SplitConfig, Splits};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
