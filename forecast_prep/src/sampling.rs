//! Seeded few-shot subsampling of training examples

use crate::error::{ForecastError, Result};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;
use tracing::debug;

/// Number of examples a few-shot fraction keeps out of `dataset_size`.
///
/// The floating-point product is floored as computed: a fraction of 0.29
/// keeps 28 of 100 examples.
pub fn few_shot_size(dataset_size: usize, fraction: f64) -> Result<usize> {
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "Few-shot fraction must be in (0, 1], got {}",
            fraction
        )));
    }

    let selected = (fraction * dataset_size as f64).floor() as usize;
    if selected == 0 {
        return Err(ForecastError::EmptySample {
            dataset_size,
            fraction,
        });
    }
    Ok(selected.min(dataset_size))
}

/// Pick `floor(fraction * dataset_size)` distinct example indices uniformly
/// at random, without replacement.
///
/// The generator is seeded from `seed` alone, so equal inputs select the
/// same indices in every process.
pub fn sample_few_shot(dataset_size: usize, fraction: f64, seed: u64) -> Result<BTreeSet<usize>> {
    let amount = few_shot_size(dataset_size, fraction)?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let selected: BTreeSet<usize> = index::sample(&mut rng, dataset_size, amount)
        .into_iter()
        .collect();

    debug!(dataset_size, fraction, seed, selected = selected.len(), "sampled few-shot subset");
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_floors_the_raw_product() {
        assert_eq!(few_shot_size(100, 0.29).unwrap(), 28);
        assert_eq!(few_shot_size(100, 0.5).unwrap(), 50);
    }

    #[test]
    fn full_fraction_keeps_everything() {
        let selected = sample_few_shot(10, 1.0, 7).unwrap();
        assert_eq!(selected, (0..10).collect());
    }

    #[test]
    fn indices_stay_in_range() {
        let selected = sample_few_shot(50, 0.5, 3).unwrap();
        assert_eq!(selected.len(), 25);
        assert!(selected.iter().all(|&i| i < 50));
    }

    #[test]
    fn out_of_range_fraction_is_invalid() {
        assert!(matches!(
            sample_few_shot(10, 0.0, 1),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            sample_few_shot(10, 1.5, 1),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(sample_few_shot(10, f64::NAN, 1).is_err());
    }

    #[test]
    fn empty_dataset_selects_nothing() {
        assert!(matches!(
            sample_few_shot(0, 0.5, 1),
            Err(ForecastError::EmptySample { dataset_size: 0, .. })
        ));
    }
}
