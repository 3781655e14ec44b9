use std::mem;

use log::debug;
use ndarray::{Array2, ArrayView2};

use super::{Model, layers::Layer};
use crate::{MlErr, Result, initialization::ParamGen, optimization::Optimizer};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
///
/// The model owns a flat parameter buffer and a gradient buffer of the same length, each layer
/// reads the consecutive chunk that corresponds to it.
pub struct Sequential<O: Optimizer> {
    layers: Vec<Layer>,
    params: Vec<f32>,
    grad: Vec<f32>,
    optimizer: O,
}

impl<O: Optimizer> Sequential<O> {
    /// Creates a new `Sequential`.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    /// * `param_gen` - The generator of the initial parameters, in layer order.
    /// * `optimizer_factory` - Builds the optimizer given the amount of parameters.
    ///
    /// # Returns
    /// A new `Sequential` instance or an error if the layers are empty, their widths don't
    /// chain or the generator runs out of parameters.
    pub fn new<I, G, F>(layers: I, param_gen: &mut G, optimizer_factory: F) -> Result<Self>
    where
        I: IntoIterator<Item = Layer>,
        G: ParamGen + ?Sized,
        F: FnOnce(usize) -> O,
    {
        let layers: Vec<Layer> = layers.into_iter().collect();

        if layers.is_empty() {
            return Err(MlErr::EmptyModel);
        }

        let mut dims = layers.iter().filter_map(Layer::dim);
        if let Some((_, mut width)) = dims.next() {
            for (fan_in, fan_out) in dims {
                if fan_in != width {
                    return Err(MlErr::SizeMismatch {
                        what: "consecutive layer widths",
                        got: fan_in,
                        expected: width,
                    });
                }

                width = fan_out;
            }
        }

        let size: usize = layers.iter().map(Layer::size).sum();
        let params = param_gen.sample(size).unwrap_or_default();

        if params.len() != size {
            return Err(MlErr::ParamGenExhausted {
                got: params.len(),
                expected: size,
            });
        }

        debug!(layers = layers.len(), params = size; "built sequential model");

        Ok(Self {
            layers,
            grad: vec![0.; size],
            params,
            optimizer: optimizer_factory(size),
        })
    }

    /// Returns the current parameters of the model.
    pub fn params(&self) -> &[f32] {
        &self.params
    }

    /// Returns the gradient accumulated since the last `step`.
    pub fn grad(&self) -> &[f32] {
        &self.grad
    }
}

impl<O: Optimizer> Model for Sequential<O> {
    fn size(&self) -> usize {
        self.params.len()
    }

    fn forward(&mut self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let mut rest = self.params.as_slice();
        let mut y = x.to_owned();

        for layer in self.layers.iter_mut() {
            let (params, tail) = rest.split_at(layer.size());
            rest = tail;
            y = layer.forward(params, y.view())?;
        }

        Ok(y)
    }

    fn backward(&mut self, mut d: Array2<f32>) -> Result<()> {
        let mut params = self.params.as_slice();
        let mut grad = self.grad.as_mut_slice();

        for layer in self.layers.iter_mut().rev() {
            let at = params.len() - layer.size();

            let (head, layer_params) = params.split_at(at);
            params = head;

            let (head, layer_grad) = mem::take(&mut grad).split_at_mut(at);
            grad = head;

            d = layer.backward(layer_params, layer_grad, d)?;
        }

        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        self.optimizer.update_params(&self.grad, &mut self.params)?;
        self.grad.fill(0.);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::{
        arch::{
            activations::ActFn,
            loss::{LossFn, Mse},
        },
        initialization::{ChainedParamGen, ConstParamGen},
        optimization::GradientDescent,
    };

    fn linear(weight: f32, bias: f32, lr: f32) -> Sequential<GradientDescent> {
        let param_gens: Vec<Box<dyn ParamGen>> = vec![
            Box::new(ConstParamGen::new(weight, 1)),
            Box::new(ConstParamGen::new(bias, 1)),
        ];

        Sequential::new(
            [Layer::dense((1, 1), None)],
            &mut ChainedParamGen::new(param_gens),
            |_| GradientDescent::new(lr),
        )
        .unwrap()
    }

    #[test]
    fn size_is_the_sum_of_the_layers() {
        let mut param_gen = ConstParamGen::new(0.5, 100);
        let model = Sequential::new(
            [
                Layer::dense((1, 8), None),
                Layer::activation(ActFn::relu()),
                Layer::dense((8, 1), None),
            ],
            &mut param_gen,
            |_| GradientDescent::new(0.1),
        )
        .unwrap();

        assert_eq!(model.size(), 16 + 9);
        assert!(model.params().iter().all(|&p| p == 0.5));
    }

    #[test]
    fn mismatched_widths_fail() {
        let mut param_gen = ConstParamGen::new(0., 100);
        let res = Sequential::new(
            [Layer::dense((1, 4), None), Layer::dense((3, 1), None)],
            &mut param_gen,
            |_| GradientDescent::new(0.1),
        );

        assert!(matches!(
            res,
            Err(MlErr::SizeMismatch { got: 3, expected: 4, .. })
        ));
    }

    #[test]
    fn exhausted_param_gen_fails() {
        let mut param_gen = ConstParamGen::new(0., 1);
        let res = Sequential::new(
            [Layer::dense((1, 1), None)],
            &mut param_gen,
            |_| GradientDescent::new(0.1),
        );

        assert!(matches!(
            res,
            Err(MlErr::ParamGenExhausted { got: 1, expected: 2 })
        ));
    }

    #[test]
    fn empty_model_fails() {
        let mut param_gen = ConstParamGen::new(0., 1);
        let res = Sequential::new([], &mut param_gen, |_| GradientDescent::new(0.1));

        assert!(matches!(res, Err(MlErr::EmptyModel)));
    }

    #[test]
    fn step_applies_and_clears_gradient() {
        let mut model = linear(1.0, 0.0, 0.5);
        let x = array![[2.0]];

        let y = model.forward(x.view()).unwrap();
        assert_eq!(y, array![[2.0]]);

        model.backward(array![[1.0]]).unwrap();
        assert_eq!(model.grad(), [2.0, 1.0]);

        model.step().unwrap();
        assert_eq!(model.params(), [0.0, -0.5]);
        assert_eq!(model.grad(), [0.0, 0.0]);
    }

    #[test]
    fn learns_a_line() {
        let mut model = linear(0.0, 0.0, 0.05);
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![[1.0], [3.0], [5.0], [7.0]];

        for _ in 0..2000 {
            let y_pred = model.forward(x.view()).unwrap();
            let d = Mse.loss_prime(y_pred.view(), y.view());
            model.backward(d).unwrap();
            model.step().unwrap();
        }

        let y_pred = model.forward(x.view()).unwrap();
        assert!(Mse.loss(y_pred.view(), y.view()) < 1e-4);
    }
}
