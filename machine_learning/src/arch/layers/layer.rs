use ndarray::{Array2, ArrayView2};

use super::{Activation, Dense};
use crate::{Result, arch::activations::ActFn};

/// A single stage of a `Sequential` model.
#[derive(Clone, Debug)]
pub enum Layer {
    Dense(Dense),
    Activation(Activation),
}

impl Layer {
    pub fn dense(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self::Dense(Dense::new(dim, act_fn))
    }

    pub fn activation(act_fn: ActFn) -> Self {
        Self::Activation(Activation::new(act_fn))
    }

    /// Returns the amount of parameters this layer has.
    pub fn size(&self) -> usize {
        match self {
            Self::Dense(l) => l.size(),
            Self::Activation(_) => 0,
        }
    }

    /// Returns the input and output widths, `None` if the layer preserves whatever width it's fed.
    pub fn dim(&self) -> Option<(usize, usize)> {
        match self {
            Self::Dense(l) => Some(l.dim()),
            Self::Activation(_) => None,
        }
    }

    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        match self {
            Self::Dense(l) => l.forward(params, x),
            Self::Activation(l) => Ok(l.forward(x)),
        }
    }

    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        d: Array2<f32>,
    ) -> Result<Array2<f32>> {
        match self {
            Self::Dense(l) => l.backward(params, grad, d),
            Self::Activation(l) => l.backward(d),
        }
    }
}
