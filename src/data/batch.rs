use ndarray::Array2;

use super::KeyDataset;
use crate::Result;

/// A minibatch laid out as two parallel `(len, 1)` columns: the keys fed to the model and
/// their true positions.
#[derive(Debug, Clone)]
pub struct Batch {
    pub indices: Vec<usize>,
    pub keys: Array2<f32>,
    pub positions: Array2<f32>,
}

impl Batch {
    /// Assembles a batch with the keys at the given positions of `dataset`.
    ///
    /// Rows follow the iteration order of `indices`.
    ///
    /// # Panics
    /// If any index is out of the dataset's bounds.
    pub fn assemble<I>(dataset: &KeyDataset, indices: I) -> Result<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        let indices: Vec<usize> = indices.into_iter().collect();
        let len = indices.len();

        let keys: Vec<f32> = indices.iter().map(|&i| dataset.key(i)).collect();
        let positions: Vec<f32> = indices.iter().map(|&i| i as f32).collect();

        Ok(Self {
            keys: Array2::from_shape_vec((len, 1), keys)?,
            positions: Array2::from_shape_vec((len, 1), positions)?,
            indices,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
