use std::collections::BTreeSet;

use rand::Rng;

use crate::{IndexErr, Result};

/// Draws minibatches of distinct dataset positions uniformly at random.
#[derive(Debug, Clone, Copy)]
pub struct MinibatchSampler {
    batch_size: usize,
    dataset_size: usize,
}

impl MinibatchSampler {
    /// Creates a new `MinibatchSampler`.
    ///
    /// # Arguments
    /// * `batch_size` - The amount of distinct positions per batch.
    /// * `dataset_size` - The exclusive upper bound of the positions.
    ///
    /// # Returns
    /// A new sampler or an `InvalidConfiguration` error unless
    /// `0 < batch_size <= dataset_size`, otherwise sampling would never end.
    pub fn new(batch_size: usize, dataset_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(IndexErr::invalid("the batch size must be positive"));
        }

        if batch_size > dataset_size {
            return Err(IndexErr::invalid(format!(
                "the batch size ({batch_size}) exceeds the dataset size ({dataset_size})"
            )));
        }

        Ok(Self {
            batch_size,
            dataset_size,
        })
    }

    /// Samples exactly `batch_size` distinct positions in `[0, dataset_size)`.
    ///
    /// Positions are drawn uniformly and repeated ones are discarded and redrawn.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> BTreeSet<usize> {
        let mut indices = BTreeSet::new();

        while indices.len() < self.batch_size {
            indices.insert(rng.random_range(0..self.dataset_size));
        }

        indices
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn samples_distinct_indices_in_range() {
        let mut rng = StdRng::seed_from_u64(0);
        let sampler = MinibatchSampler::new(64, 1000).unwrap();

        for _ in 0..100 {
            let indices = sampler.sample(&mut rng);
            assert_eq!(indices.len(), 64);
            assert!(indices.iter().all(|&i| i < 1000));
        }
    }

    #[test]
    fn full_batch_is_the_whole_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let sampler = MinibatchSampler::new(50, 50).unwrap();

        let indices = sampler.sample(&mut rng);
        assert!(indices.into_iter().eq(0..50));
    }

    #[test]
    fn oversized_batch_fails_fast() {
        assert!(matches!(
            MinibatchSampler::new(65, 64),
            Err(IndexErr::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn empty_batch_fails() {
        assert!(MinibatchSampler::new(0, 64).is_err());
    }

    #[test]
    fn every_position_gets_sampled() {
        let mut rng = StdRng::seed_from_u64(2);
        let sampler = MinibatchSampler::new(4, 20).unwrap();
        let mut seen = BTreeSet::new();

        for _ in 0..200 {
            seen.extend(sampler.sample(&mut rng));
        }

        assert_eq!(seen.len(), 20);
    }
}
