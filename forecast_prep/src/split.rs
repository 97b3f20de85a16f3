//! Chronological per-entity train/validation/test splitting

use crate::data::TimeSeriesTable;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// One of the three chronological partitions of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Train,
    Valid,
    Test,
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Partition::Train => "train",
            Partition::Valid => "valid",
            Partition::Test => "test",
        };
        write!(f, "{}", name)
    }
}

/// Fractions of each entity's timeline used for training and testing.
///
/// Whatever remains between the two is validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    pub train_fraction: f64,
    pub test_fraction: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.7,
            test_fraction: 0.2,
        }
    }
}

impl SplitConfig {
    pub fn new(train_fraction: f64, test_fraction: f64) -> Result<Self> {
        let config = Self {
            train_fraction,
            test_fraction,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn valid_fraction(&self) -> f64 {
        1.0 - self.train_fraction - self.test_fraction
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("train_fraction", self.train_fraction),
            ("test_fraction", self.test_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ForecastError::InvalidParameter(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }
        if self.train_fraction + self.test_fraction > 1.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "train_fraction + test_fraction must not exceed 1, got {}",
                self.train_fraction + self.test_fraction
            )));
        }
        Ok(())
    }

    /// Row counts `(train, valid, test)` for a series of `rows` rows.
    ///
    /// Train and test sizes are floored; validation takes the remainder so
    /// every row lands in exactly one partition. The floor applies to the
    /// floating-point product, so `0.29 * 100` gives 28 train rows, not 29.
    pub fn partition_sizes(&self, rows: usize) -> (usize, usize, usize) {
        let train = (rows as f64 * self.train_fraction).floor() as usize;
        let test = ((rows as f64 * self.test_fraction).floor() as usize).min(rows - train);
        let valid = rows - train - test;
        (train, valid, test)
    }
}

/// The three owned partitions of a table
#[derive(Debug, Clone)]
pub struct Splits {
    pub train: TimeSeriesTable,
    pub valid: TimeSeriesTable,
    pub test: TimeSeriesTable,
}

impl Splits {
    pub fn get(&self, partition: Partition) -> &TimeSeriesTable {
        match partition {
            Partition::Train => &self.train,
            Partition::Valid => &self.valid,
            Partition::Test => &self.test,
        }
    }
}

/// Split every entity of `table` chronologically into train, validation
/// and test rows.
///
/// Each entity is split on its own length. Fails on the first entity whose
/// train, validation or test partition holds fewer than `context_length`
/// rows; no entity is dropped silently.
pub fn split_by_entity(
    table: &TimeSeriesTable,
    id_columns: &[String],
    config: &SplitConfig,
    context_length: usize,
) -> Result<Splits> {
    config.validate()?;

    let mut train_rows = Vec::new();
    let mut valid_rows = Vec::new();
    let mut test_rows = Vec::new();

    let entities = table.entities_by(id_columns)?;
    for (entity, rows) in &entities {
        let (train, valid, test) = config.partition_sizes(rows.len());

        for (partition, size) in [
            (Partition::Train, train),
            (Partition::Valid, valid),
            (Partition::Test, test),
        ] {
            if size < context_length {
                return Err(ForecastError::InsufficientHistory {
                    entity: entity.to_string(),
                    partition,
                    rows: size,
                    context_length,
                });
            }
        }

        debug!(%entity, train, valid, test, "split entity");
        train_rows.extend_from_slice(&rows[..train]);
        valid_rows.extend_from_slice(&rows[train..train + valid]);
        test_rows.extend_from_slice(&rows[train + valid..]);
    }

    info!(
        entities = entities.len(),
        train = train_rows.len(),
        valid = valid_rows.len(),
        test = test_rows.len(),
        "split table by entity"
    );

    Ok(Splits {
        train: table.take_rows(&train_rows)?,
        valid: table.take_rows(&valid_rows)?,
        test: table.take_rows(&test_rows)?,
    })
}
