use ndarray::Array2;

/// Maps the model's normalized output to dataset positions and the loss gradient back.
///
/// The forward map multiplies by the dataset size and the gradient map divides by it, so the
/// model receives the derivative of the loss taken in normalized units: for a squared error
/// that's exactly the gradient of `(raw - position / size)^2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionScale {
    factor: f32,
}

impl PositionScale {
    pub fn new(dataset_size: usize) -> Self {
        Self {
            factor: dataset_size as f32,
        }
    }

    /// Scales a raw model output to the `[0, dataset_size)` position range.
    pub fn to_positions(&self, raw: Array2<f32>) -> Array2<f32> {
        raw * self.factor
    }

    /// Scales a loss gradient taken with respect to positions to the model's range.
    pub fn to_model_grad(&self, grad: Array2<f32>) -> Array2<f32> {
        grad / self.factor
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn scales_to_positions() {
        let scale = PositionScale::new(1000);
        assert_eq!(scale.to_positions(array![[0.5], [0.001]]), array![[500.0], [1.0]]);
    }

    #[test]
    fn gradient_map_inverts_the_forward_map() {
        let scale = PositionScale::new(1000);
        let raw = array![[0.25], [-1.5], [0.123], [7.0]];

        let back = scale.to_model_grad(scale.to_positions(raw.clone()));
        for (a, b) in back.iter().zip(raw.iter()) {
            assert!((a - b).abs() <= b.abs() * 1e-6);
        }
    }

    #[test]
    fn power_of_two_sizes_round_trip_exactly() {
        let scale = PositionScale::new(1024);
        let raw = array![[0.3], [-2.7]];

        assert_eq!(scale.to_model_grad(scale.to_positions(raw.clone())), raw);
    }
}
