use ndarray::{Array2, ArrayView2};

use crate::Result;

/// A trainable model that owns its parameters and its optimizer.
///
/// A training step is `forward`, `backward` with the derivative of the loss with respect to the
/// output, and `step`.
pub trait Model {
    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize;

    /// Makes a forward pass through the model, caching whatever `backward` needs.
    ///
    /// # Arguments
    /// * `x` - The input batch, one example per row.
    ///
    /// # Returns
    /// The prediction for the given input or an error if the shapes don't line up.
    fn forward(&mut self, x: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Backpropagates `d` through the model, **adding** the parameter gradient to the one
    /// accumulated since the last `step`.
    ///
    /// # Arguments
    /// * `d` - The derivative of the loss with respect to the output of the last `forward`.
    fn backward(&mut self, d: Array2<f32>) -> Result<()>;

    /// Updates the parameters with the accumulated gradient and clears it.
    fn step(&mut self) -> Result<()>;
}
