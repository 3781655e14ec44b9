use ndarray::{Array2, ArrayView2};

/// A loss function over a batch of predictions, reduced by its mean.
///
/// Both arguments must have the same shape.
pub trait LossFn {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32;
    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32>;
}
