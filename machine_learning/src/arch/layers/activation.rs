use ndarray::{Array2, ArrayView2};

use crate::{MlErr, Result, arch::activations::ActFn};

/// A parameterless layer applying an activation function element-wise.
#[derive(Clone, Debug)]
pub struct Activation {
    act_fn: ActFn,
    z: Option<Array2<f32>>,
}

impl Activation {
    pub fn new(act_fn: ActFn) -> Self {
        Self { act_fn, z: None }
    }

    pub fn forward(&mut self, z: ArrayView2<f32>) -> Array2<f32> {
        let a = z.mapv(|z| self.act_fn.f(z));
        self.z = Some(z.to_owned());
        a
    }

    pub fn backward(&mut self, mut d: Array2<f32>) -> Result<Array2<f32>> {
        let Some(z) = self.z.take() else {
            return Err(MlErr::SizeMismatch {
                what: "activation layer cached inputs",
                got: 0,
                expected: d.nrows(),
            });
        };

        if z.dim() != d.dim() {
            return Err(MlErr::SizeMismatch {
                what: "activation layer delta rows",
                got: d.nrows(),
                expected: z.nrows(),
            });
        }

        d.zip_mut_with(&z, |d, &z| *d *= self.act_fn.df(z));
        Ok(d)
    }
}
