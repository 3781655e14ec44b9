use ndarray::{Array2, ArrayView2};

use super::LossFn;

/// Huber (smooth L1) loss function.
///
/// Quadratic for errors within `delta` and linear beyond it, so the derivative of a single
/// error never exceeds `delta` in magnitude.
#[derive(Debug, Clone, Copy)]
pub struct Huber {
    delta: f32,
}

impl Huber {
    /// Returns a new `Huber`.
    ///
    /// # Arguments
    /// * `delta` - The error magnitude at which the loss switches from quadratic to linear.
    pub fn new(delta: f32) -> Self {
        Self { delta }
    }
}

impl Default for Huber {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl LossFn for Huber {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
        let delta = self.delta;

        (&y_pred - &y)
            .mapv(|e| {
                let abs = e.abs();

                if abs <= delta {
                    0.5 * e * e
                } else {
                    delta * (abs - 0.5 * delta)
                }
            })
            .mean()
            .unwrap_or_default()
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32> {
        let delta = self.delta;
        let n = y_pred.len() as f32;

        (&y_pred - &y).mapv(|e| e.clamp(-delta, delta) / n)
    }
}
