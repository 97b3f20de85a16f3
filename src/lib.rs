//! # TTM Workshop
//!
//! `ttm_workshop` bundles the pieces of a pretrained-forecaster fine-tuning
//! workshop: data preparation and evaluation from [`forecast_prep`] and the
//! numeric helpers of [`series_math`].
//!
//! ## Example
//!
//! ```
//! use ttm_workshop::{compute_metrics, sample_few_shot};
//!
//! let subset = sample_few_shot(100, 0.2, 42).unwrap();
//! assert_eq!(subset.len(), 20);
//!
//! let report = compute_metrics(
//!     &[vec![Some(1.0), Some(2.0), Some(3.0)], vec![Some(4.0), Some(5.0), Some(6.0)]],
//!     &[vec![1.0, 2.0], vec![4.0, 6.0]],
//!     "example",
//! )
//! .unwrap();
//! assert_eq!(report.mean_squared_error(), 0.25);
//! ```

pub use forecast_prep;
pub use series_math;

pub use forecast_prep::{
    compute_metrics, sample_few_shot, split_by_entity, ColumnSpec, ContextWindow,
    ExperimentConfig, ForecastError, MetricReport, SplitConfig, TimeSeriesTable,
};
