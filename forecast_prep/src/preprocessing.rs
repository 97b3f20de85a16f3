//! Reference preprocessor: per-entity standard scaling and label encoding

use crate::collaborators::Preprocessor;
use crate::data::{EntityKey, TimeSeriesTable};
use crate::error::{ForecastError, Result};
use polars::prelude::*;
use series_math::encoding::LabelEncoder;
use series_math::scaling::StandardScaler;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Scales target and control columns per entity and label-encodes
/// categorical columns, with all state fitted on the training split
#[derive(Debug, Clone)]
pub struct TimeSeriesPreprocessor {
    scaling: bool,
    /// Targets followed by controls, as fitted
    scaled_columns: Vec<String>,
    target_count: usize,
    scalers: HashMap<EntityKey, Vec<StandardScaler>>,
    encoders: BTreeMap<String, LabelEncoder>,
    fitted: bool,
}

impl Default for TimeSeriesPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSeriesPreprocessor {
    pub fn new() -> Self {
        Self {
            scaling: true,
            scaled_columns: Vec::new(),
            target_count: 0,
            scalers: HashMap::new(),
            encoders: BTreeMap::new(),
            fitted: false,
        }
    }

    /// Disable scaling; categorical encoding still applies
    pub fn with_scaling(mut self, scaling: bool) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Fitted scaler of one target or control column of one entity
    pub fn scaler(&self, entity: &EntityKey, column: &str) -> Option<&StandardScaler> {
        let idx = self.scaled_columns.iter().position(|c| c == column)?;
        self.scalers.get(entity).and_then(|s| s.get(idx))
    }

    fn ensure_fitted(&self) -> Result<()> {
        if self.fitted {
            Ok(())
        } else {
            Err(ForecastError::ValidationError(
                "Preprocessor must be fitted before use".to_string(),
            ))
        }
    }

    fn entity_scalers(&self, entity: &EntityKey) -> Result<&[StandardScaler]> {
        self.scalers.get(entity).map(Vec::as_slice).ok_or_else(|| {
            ForecastError::DataError(format!("Entity '{}' was not seen during fit", entity))
        })
    }
}

impl Preprocessor for TimeSeriesPreprocessor {
    fn fit(&mut self, train: &TimeSeriesTable) -> Result<()> {
        let spec = train.column_spec();
        self.scaled_columns = spec
            .target_columns
            .iter()
            .chain(&spec.control_columns)
            .cloned()
            .collect();
        self.target_count = spec.target_columns.len();
        self.scalers.clear();
        self.encoders.clear();

        if self.scaling {
            let columns = self
                .scaled_columns
                .iter()
                .map(|name| train.column_f64(name))
                .collect::<Result<Vec<_>>>()?;

            for (entity, rows) in train.entities()? {
                let mut fitted = Vec::with_capacity(columns.len());
                for values in &columns {
                    let entity_values: Vec<Option<f64>> = rows.iter().map(|&r| values[r]).collect();
                    fitted.push(StandardScaler::fit(&entity_values)?);
                }
                self.scalers.insert(entity, fitted);
            }
        }

        for name in spec
            .static_categorical_columns
            .iter()
            .chain(&spec.categorical_columns)
        {
            let labels = train.column_strings(name)?;
            let encoder = LabelEncoder::fit(labels.iter().flatten());
            debug!(column = %name, classes = encoder.len(), "fitted label encoder");
            self.encoders.insert(name.clone(), encoder);
        }

        self.fitted = true;
        debug!(entities = self.scalers.len(), "fitted preprocessor");
        Ok(())
    }

    fn transform(&self, table: &TimeSeriesTable) -> Result<TimeSeriesTable> {
        self.ensure_fitted()?;
        let mut df = table.dataframe().clone();

        if self.scaling {
            let entities = table.entities()?;
            for (idx, name) in self.scaled_columns.iter().enumerate() {
                let mut values = table.column_f64(name)?;
                for (entity, rows) in &entities {
                    let scaler = self.entity_scalers(entity)?[idx];
                    for &r in rows {
                        values[r] = values[r].map(|v| scaler.transform(v));
                    }
                }
                df.with_column(Series::new(name.as_str(), values))?;
            }
        }

        for (name, encoder) in &self.encoders {
            let codes = table
                .column_strings(name)?
                .iter()
                .map(|label| label.as_deref().map(|l| encoder.encode(l)).transpose())
                .collect::<std::result::Result<Vec<Option<u32>>, _>>()?;
            df.with_column(Series::new(name.as_str(), codes))?;
        }

        Ok(table.with_frame(df))
    }

    fn inverse_transform_forecast(
        &self,
        entity: &EntityKey,
        channel: usize,
        values: &[f64],
    ) -> Result<Vec<f64>> {
        self.ensure_fitted()?;
        if channel >= self.target_count {
            return Err(ForecastError::InvalidParameter(format!(
                "Channel {} is not a target channel ({} targets)",
                channel, self.target_count
            )));
        }
        if !self.scaling {
            return Ok(values.to_vec());
        }

        let scaler = self.entity_scalers(entity)?[channel];
        Ok(scaler.inverse_transform_series(values))
    }

    fn categorical_vocab_sizes(&self) -> BTreeMap<String, usize> {
        self.encoders
            .iter()
            .map(|(name, encoder)| (name.clone(), encoder.len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnSpec;
    use approx::assert_relative_eq;

    fn table(regions: &[&str], sales: &[f64], channel: &[&str]) -> TimeSeriesTable {
        let dates: Vec<String> = (0..sales.len())
            .map(|i| format!("2023-01-{:02}", i / regions.len().max(1) + 1))
            .collect();
        let df = df!(
            "date" => dates,
            "region" => regions,
            "sales" => sales,
            "channel" => channel
        )
        .unwrap();
        let spec = ColumnSpec::new("date", &["sales"])
            .with_id_columns(&["region"])
            .with_categorical_columns(&["channel"]);
        TimeSeriesTable::from_dataframe(df, spec).unwrap()
    }

    #[test]
    fn scales_each_entity_with_its_own_statistics() {
        let train = table(
            &["a", "b", "a", "b"],
            &[1.0, 100.0, 3.0, 300.0],
            &["web", "store", "web", "web"],
        );
        let mut pre = TimeSeriesPreprocessor::new();
        pre.fit(&train).unwrap();

        let scaled = pre.transform(&train).unwrap();
        let values: Vec<f64> = scaled.column_f64("sales").unwrap().into_iter().flatten().collect();
        assert_relative_eq!(values[0], -1.0);
        assert_relative_eq!(values[1], -1.0);
        assert_relative_eq!(values[2], 1.0);
        assert_relative_eq!(values[3], 1.0);

        let a = EntityKey::new(vec!["a"]);
        let restored = pre.inverse_transform_forecast(&a, 0, &[0.0, 1.0]).unwrap();
        assert_relative_eq!(restored[0], 2.0);
        assert_relative_eq!(restored[1], 3.0);
    }

    #[test]
    fn encodes_categories_and_reports_vocab_sizes() {
        let train = table(&["a", "a"], &[1.0, 2.0], &["web", "store"]);
        let mut pre = TimeSeriesPreprocessor::new();
        pre.fit(&train).unwrap();

        assert_eq!(pre.categorical_vocab_sizes().get("channel"), Some(&2));
        let encoded = pre.transform(&train).unwrap();
        assert_eq!(
            encoded.column_f64("channel").unwrap(),
            vec![Some(1.0), Some(0.0)]
        );
    }

    #[test]
    fn unseen_entity_or_category_is_rejected() {
        let train = table(&["a", "a"], &[1.0, 2.0], &["web", "web"]);
        let mut pre = TimeSeriesPreprocessor::new();
        pre.fit(&train).unwrap();

        let other_entity = table(&["b", "b"], &[1.0, 2.0], &["web", "web"]);
        assert!(pre.transform(&other_entity).is_err());

        let other_channel = table(&["a", "a"], &[1.0, 2.0], &["web", "phone"]);
        assert!(pre.transform(&other_channel).is_err());
    }

    #[test]
    fn unfitted_preprocessor_is_rejected() {
        let train = table(&["a"], &[1.0], &["web"]);
        let pre = TimeSeriesPreprocessor::new();
        assert!(matches!(pre.transform(&train), Err(ForecastError::ValidationError(_))));
    }

    #[test]
    fn disabled_scaling_passes_values_through() {
        let train = table(&["a", "a"], &[1.0, 5.0], &["web", "web"]);
        let mut pre = TimeSeriesPreprocessor::new().with_scaling(false);
        pre.fit(&train).unwrap();

        let out = pre.transform(&train).unwrap();
        assert_eq!(out.column_f64("sales").unwrap(), vec![Some(1.0), Some(5.0)]);
        let a = EntityKey::new(vec!["a"]);
        assert_eq!(pre.inverse_transform_forecast(&a, 0, &[2.0]).unwrap(), vec![2.0]);
    }
}
