use std::{cell::RefCell, rc::Rc};

use log::info;
use machine_learning::{
    arch::{
        Model, Sequential,
        activations::ActFn,
        layers::Layer,
        loss::{Huber, LossFn, Mse},
    },
    initialization::{ChainedParamGen, ConstParamGen, ParamGen, RandParamGen},
    optimization::{Adam, GradientDescent, Optimizer},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{ModelTrainer, Trainer};
use crate::{
    Result,
    config::{
        ActFnConfig, HarnessConfig, InitConfig, LayerConfig, LossFnConfig, ModelConfig,
        OptimizerConfig,
    },
    data::KeyDataset,
};

type SharedRng = Rc<RefCell<StdRng>>;

/// Builds `Trainer`s given a configuration.
#[derive(Default)]
pub struct TrainerBuilder;

impl TrainerBuilder {
    /// Creates a new `TrainerBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds a new `Trainer` following a configuration.
    ///
    /// Every random draw of the run (keys, initial weights and minibatches) derives from the
    /// configured seed, so two builds with the same seed train identically.
    ///
    /// # Arguments
    /// * `config` - The configuration of the experiment.
    ///
    /// # Returns
    /// An `InvalidConfiguration` error if the configuration doesn't validate.
    pub fn build(&self, config: &HarnessConfig) -> Result<Box<dyn Trainer>> {
        config.validate()?;

        let mut rng = self.generate_rng(config.training.seed);
        let dataset = KeyDataset::generate(&mut rng, &config.dataset)?;
        info!(
            keys = dataset.len(), max = dataset.max();
            "generated lognormal dataset"
        );

        let init_rng = Rc::new(RefCell::new(StdRng::seed_from_u64(rng.random())));
        self.resolve_optimizer(config, dataset, init_rng, rng)
    }

    fn resolve_optimizer(
        &self,
        config: &HarnessConfig,
        dataset: KeyDataset,
        init_rng: SharedRng,
        rng: StdRng,
    ) -> Result<Box<dyn Trainer>> {
        match config.training.optimizer {
            OptimizerConfig::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => {
                let factory = |len| Adam::new(len, learning_rate, beta1, beta2, epsilon);
                self.resolve_model(config, factory, dataset, init_rng, rng)
            }
            OptimizerConfig::GradientDescent { learning_rate } => {
                let factory = |_: usize| GradientDescent::new(learning_rate);
                self.resolve_model(config, factory, dataset, init_rng, rng)
            }
        }
    }

    fn resolve_model<O, F>(
        &self,
        config: &HarnessConfig,
        optimizer_factory: F,
        dataset: KeyDataset,
        init_rng: SharedRng,
        rng: StdRng,
    ) -> Result<Box<dyn Trainer>>
    where
        O: Optimizer + 'static,
        F: FnOnce(usize) -> O,
    {
        let ModelConfig::Sequential {
            layers: layer_specs,
        } = &config.model;

        let mut param_gens = Vec::with_capacity(layer_specs.len() * 2);
        let mut layers = Vec::with_capacity(layer_specs.len());

        for &spec in layer_specs {
            layers.push(self.resolve_layer(spec, &init_rng, &mut param_gens)?);
        }

        let mut param_gen = ChainedParamGen::new(param_gens);
        let model = Sequential::new(layers, &mut param_gen, optimizer_factory)?;
        info!(params = model.size(); "built sequential model");

        self.resolve_loss(config, model, dataset, rng)
    }

    fn resolve_layer(
        &self,
        spec: LayerConfig,
        init_rng: &SharedRng,
        param_gens: &mut Vec<Box<dyn ParamGen>>,
    ) -> Result<Layer> {
        match spec {
            LayerConfig::Dense { dim, init, act_fn } => {
                param_gens.push(self.resolve_init(init, dim, init_rng)?);
                param_gens.push(Box::new(ConstParamGen::new(0., dim.1)));

                let act_fn = act_fn.map(|spec| self.resolve_act_fn(spec));
                Ok(Layer::dense(dim, act_fn))
            }
            LayerConfig::Activation { act_fn } => {
                Ok(Layer::activation(self.resolve_act_fn(act_fn)))
            }
        }
    }

    // Dense parameters are laid out weights first, then biases.
    fn resolve_init(
        &self,
        spec: InitConfig,
        (fan_in, fan_out): (usize, usize),
        init_rng: &SharedRng,
    ) -> Result<Box<dyn ParamGen>> {
        let limit = fan_in * fan_out;
        let rng = Rc::clone(init_rng);

        let param_gen: Box<dyn ParamGen> = match spec {
            InitConfig::Const { value } => Box::new(ConstParamGen::new(value, limit)),
            InitConfig::Normal { mean, std_dev } => {
                Box::new(RandParamGen::normal(rng, limit, mean, std_dev)?)
            }
            InitConfig::GlorotNormal => {
                Box::new(RandParamGen::xavier(rng, limit, fan_in, fan_out)?)
            }
        };

        Ok(param_gen)
    }

    fn resolve_act_fn(&self, spec: ActFnConfig) -> ActFn {
        match spec {
            ActFnConfig::Sigmoid { amp } => ActFn::sigmoid(amp),
            ActFnConfig::Relu => ActFn::relu(),
        }
    }

    fn resolve_loss<M>(
        &self,
        config: &HarnessConfig,
        model: M,
        dataset: KeyDataset,
        rng: StdRng,
    ) -> Result<Box<dyn Trainer>>
    where
        M: Model + 'static,
    {
        match config.training.loss {
            LossFnConfig::Huber { delta } => {
                self.terminate_build(config, model, Huber::new(delta), dataset, rng)
            }
            LossFnConfig::Mse => self.terminate_build(config, model, Mse::new(), dataset, rng),
        }
    }

    fn terminate_build<M, L>(
        &self,
        config: &HarnessConfig,
        model: M,
        loss_fn: L,
        dataset: KeyDataset,
        rng: StdRng,
    ) -> Result<Box<dyn Trainer>>
    where
        M: Model + 'static,
        L: LossFn + 'static,
    {
        let training = &config.training;
        let trainer = ModelTrainer::new(
            model,
            loss_fn,
            dataset,
            training.batch_size,
            training.epochs,
            rng,
        )?
        .with_report_every(training.report_every);

        Ok(Box::new(trainer))
    }

    fn generate_rng(&self, seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
