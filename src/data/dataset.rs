use std::ops::Index;

use log::debug;
use rand::Rng;
use rand_distr::LogNormal;

use crate::{IndexErr, Result, config::DatasetConfig};

/// An immutable, ascending sequence of keys.
///
/// The position of a key is its index, `keys[i] <= keys[i + 1]` always holds.
#[derive(Debug, Clone)]
pub struct KeyDataset {
    keys: Vec<f32>,
}

impl KeyDataset {
    /// Generates a dataset following `config`.
    ///
    /// # Arguments
    /// * `rng` - The source of randomness.
    /// * `config` - The distribution parameters.
    ///
    /// # Returns
    /// A new dataset or an error if the configuration is invalid.
    pub fn generate<R: Rng>(rng: &mut R, config: &DatasetConfig) -> Result<Self> {
        // rounding a fractional max would move the largest key off `max_value`
        if config.integral && config.max_value.fract() != 0. {
            return Err(IndexErr::invalid(format!(
                "integral keys need an integral max value, got {}",
                config.max_value
            )));
        }

        let mut dataset = Self::lognormal(
            rng,
            config.size,
            config.max_value,
            config.mean_log,
            config.std_log,
        )?;

        if config.integral {
            dataset.keys.iter_mut().for_each(|k| *k = k.round());
        }

        Ok(dataset)
    }

    /// Draws `size` keys from a lognormal distribution, sorts them and scales them linearly so
    /// that the largest one equals `max_value`.
    ///
    /// # Arguments
    /// * `rng` - The source of randomness.
    /// * `size` - The amount of keys.
    /// * `max_value` - The value of the largest key after scaling.
    /// * `mean_log`, `std_log` - The mean and standard deviation of the underlying normal.
    ///
    /// # Returns
    /// A new dataset or an `InvalidConfiguration` error if `size` is zero, `max_value` isn't a
    /// positive number or the distribution parameters are invalid.
    pub fn lognormal<R: Rng>(
        rng: &mut R,
        size: usize,
        max_value: f32,
        mean_log: f32,
        std_log: f32,
    ) -> Result<Self> {
        if size == 0 {
            return Err(IndexErr::invalid("the dataset size must be positive"));
        }

        if !(max_value.is_finite() && max_value > 0.) {
            return Err(IndexErr::invalid(format!(
                "the max value must be a positive number, got {max_value}"
            )));
        }

        if !(mean_log.is_finite() && std_log.is_finite() && std_log >= 0.) {
            return Err(IndexErr::invalid(format!(
                "invalid lognormal parameters: mean {mean_log}, std {std_log}"
            )));
        }

        let distribution = LogNormal::new(mean_log, std_log)?;
        let mut keys: Vec<f32> = (0..size).map(|_| rng.sample(distribution)).collect();
        keys.sort_by(f32::total_cmp);

        let raw_max = keys[size - 1];
        if !(raw_max.is_finite() && raw_max > 0.) {
            return Err(IndexErr::invalid(format!(
                "the lognormal({mean_log}, {std_log}) samples can't be scaled, their max is {raw_max}"
            )));
        }

        let factor = max_value / raw_max;
        keys.iter_mut().for_each(|k| *k = (*k * factor).min(max_value));
        keys[size - 1] = max_value;

        debug!(size = size, raw_max = raw_max, factor = factor; "generated lognormal keys");
        Ok(Self { keys })
    }

    /// Creates a dataset from arbitrary keys, sorting them.
    ///
    /// # Returns
    /// A new dataset or an `InvalidConfiguration` error if `keys` is empty or has non finite
    /// values.
    pub fn from_keys(mut keys: Vec<f32>) -> Result<Self> {
        if keys.is_empty() {
            return Err(IndexErr::invalid("the dataset size must be positive"));
        }

        if let Some(key) = keys.iter().find(|k| !k.is_finite()) {
            return Err(IndexErr::invalid(format!("keys must be finite, got {key}")));
        }

        keys.sort_by(f32::total_cmp);
        Ok(Self { keys })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the key at position `idx` (panics if out of bounds).
    #[inline]
    pub fn key(&self, idx: usize) -> f32 {
        self.keys[idx]
    }

    #[inline]
    pub fn keys(&self) -> &[f32] {
        &self.keys
    }

    /// Returns the largest key.
    pub fn max(&self) -> f32 {
        self.keys[self.keys.len() - 1]
    }
}

impl Index<usize> for KeyDataset {
    type Output = f32;

    fn index(&self, idx: usize) -> &f32 {
        &self.keys[idx]
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn config(size: usize, max_value: f32) -> DatasetConfig {
        DatasetConfig {
            size,
            max_value,
            ..Default::default()
        }
    }

    #[test]
    fn keys_are_sorted() {
        for seed in 0..5 {
            let mut rng = StdRng::seed_from_u64(seed);
            let dataset = KeyDataset::generate(&mut rng, &config(1000, 100.)).unwrap();

            assert_eq!(dataset.len(), 1000);
            assert!(dataset.keys().windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn max_key_equals_max_value() {
        let mut rng = StdRng::seed_from_u64(7);

        for max_value in [1., 100., 1e5] {
            let dataset = KeyDataset::generate(&mut rng, &config(500, max_value)).unwrap();
            assert_eq!(dataset.max(), max_value);
        }
    }

    #[test]
    fn keys_are_positive() {
        let mut rng = StdRng::seed_from_u64(3);
        let dataset = KeyDataset::generate(&mut rng, &config(1000, 100.)).unwrap();

        assert!(dataset.keys().iter().all(|&k| k > 0.));
    }

    #[test]
    fn integral_keys_stay_sorted() {
        let mut rng = StdRng::seed_from_u64(11);
        let cfg = DatasetConfig {
            integral: true,
            ..config(1000, 100.)
        };
        let dataset = KeyDataset::generate(&mut rng, &cfg).unwrap();

        assert!(dataset.keys().iter().all(|k| k.fract() == 0.));
        assert!(dataset.keys().windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(dataset.max(), 100.);
    }

    #[test]
    fn same_seed_same_dataset() {
        let a = KeyDataset::generate(&mut StdRng::seed_from_u64(1), &config(100, 10.)).unwrap();
        let b = KeyDataset::generate(&mut StdRng::seed_from_u64(1), &config(100, 10.)).unwrap();

        assert_eq!(a.keys(), b.keys());
    }

    #[test]
    fn single_key_is_the_max_value() {
        let mut rng = StdRng::seed_from_u64(0);
        let dataset = KeyDataset::lognormal(&mut rng, 1, 42., 0., 2.).unwrap();

        assert_eq!(dataset[0], 42.);
    }

    #[test]
    fn integral_keys_need_an_integral_max() {
        let mut rng = StdRng::seed_from_u64(0);
        let cfg = DatasetConfig {
            integral: true,
            ..config(1000, 100.5)
        };

        assert!(matches!(
            KeyDataset::generate(&mut rng, &cfg),
            Err(IndexErr::InvalidConfiguration(_))
        ));
        assert_eq!(KeyDataset::generate(&mut rng, &config(1000, 100.5)).unwrap().max(), 100.5);
    }

    #[test]
    fn empty_dataset_fails() {
        let mut rng = StdRng::seed_from_u64(0);

        assert!(matches!(
            KeyDataset::lognormal(&mut rng, 0, 100., 0., 2.),
            Err(IndexErr::InvalidConfiguration(_))
        ));
        assert!(matches!(
            KeyDataset::from_keys(vec![]),
            Err(IndexErr::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn invalid_distribution_fails() {
        let mut rng = StdRng::seed_from_u64(0);

        for (mean_log, std_log) in [(0., -1.), (0., f32::NAN), (0., f32::INFINITY), (f32::NAN, 2.)] {
            assert!(matches!(
                KeyDataset::lognormal(&mut rng, 10, 100., mean_log, std_log),
                Err(IndexErr::InvalidConfiguration(_))
            ));
        }
        assert!(KeyDataset::lognormal(&mut rng, 10, 0., 0., 2.).is_err());
        assert!(KeyDataset::lognormal(&mut rng, 10, f32::NAN, 0., 2.).is_err());
    }

    #[test]
    fn from_keys_sorts() {
        let dataset = KeyDataset::from_keys(vec![3., 1., 2.]).unwrap();
        assert_eq!(dataset.keys(), [1., 2., 3.]);
        assert!(KeyDataset::from_keys(vec![1., f32::INFINITY]).is_err());
    }
}
