use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{IndexErr, Result};

/// The distribution of the synthetic keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub size: usize,
    pub max_value: f32,
    #[serde(default)]
    pub mean_log: f32,
    #[serde(default = "default_std_log")]
    pub std_log: f32,
    /// Round every key to the nearest integer after scaling.
    #[serde(default)]
    pub integral: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            size: 1000,
            max_value: 100.,
            mean_log: 0.,
            std_log: default_std_log(),
            integral: false,
        }
    }
}

fn default_std_log() -> f32 {
    2.
}

/// The specification for an activation function.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActFnConfig {
    Sigmoid { amp: f32 },
    Relu,
}

/// How the weights of a dense layer are initialized, biases always start at zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitConfig {
    Const { value: f32 },
    Normal { mean: f32, std_dev: f32 },
    #[default]
    GlorotNormal,
}

/// The specification for a layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerConfig {
    Dense {
        dim: (usize, usize),
        #[serde(default)]
        init: InitConfig,
        #[serde(default)]
        act_fn: Option<ActFnConfig>,
    },
    Activation {
        act_fn: ActFnConfig,
    },
}

/// The specification for the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelConfig {
    Sequential { layers: Vec<LayerConfig> },
}

/// The specification for the optimizer attached to the network.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerConfig {
    Adam {
        learning_rate: f32,
        #[serde(default = "default_beta1")]
        beta1: f32,
        #[serde(default = "default_beta2")]
        beta2: f32,
        #[serde(default = "default_epsilon")]
        epsilon: f32,
    },
    GradientDescent {
        learning_rate: f32,
    },
}

impl OptimizerConfig {
    /// Adam with the usual moment hyperparameters.
    pub fn adam(learning_rate: f32) -> Self {
        Self::Adam {
            learning_rate,
            beta1: default_beta1(),
            beta2: default_beta2(),
            epsilon: default_epsilon(),
        }
    }

    pub fn learning_rate(&self) -> f32 {
        match *self {
            Self::Adam { learning_rate, .. }
            | Self::GradientDescent { learning_rate } => learning_rate,
        }
    }
}

fn default_beta1() -> f32 {
    0.9
}

fn default_beta2() -> f32 {
    0.999
}

fn default_epsilon() -> f32 {
    1e-8
}

/// The specification for the loss function.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossFnConfig {
    Huber {
        #[serde(default = "default_delta")]
        delta: f32,
    },
    Mse,
}

impl Default for LossFnConfig {
    fn default() -> Self {
        Self::Huber {
            delta: default_delta(),
        }
    }
}

fn default_delta() -> f32 {
    1.
}

/// The training loop's hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub batch_size: usize,
    pub epochs: usize,
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub loss: LossFnConfig,
    /// Seed for every random draw of the run, `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
    /// File the `epoch, loss` pairs are written to, truncated at the start of the run.
    #[serde(default)]
    pub loss_log: Option<PathBuf>,
    /// Log the loss at `info` level every this many epochs.
    #[serde(default = "default_report_every")]
    pub report_every: usize,
}

fn default_report_every() -> usize {
    1000
}

/// Everything needed to run one experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub dataset: DatasetConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
}

impl HarnessConfig {
    /// A single linear neuron over 1000 integral keys, the precursor of an index's second stage.
    pub fn linear() -> Self {
        Self {
            dataset: DatasetConfig {
                size: 1000,
                max_value: 100.,
                integral: true,
                ..Default::default()
            },
            model: ModelConfig::Sequential {
                layers: vec![LayerConfig::Dense {
                    dim: (1, 1),
                    init: InitConfig::GlorotNormal,
                    act_fn: None,
                }],
            },
            training: TrainingConfig {
                batch_size: 64,
                epochs: 10000,
                optimizer: OptimizerConfig::adam(0.01),
                loss: LossFnConfig::default(),
                seed: None,
                loss_log: Some(PathBuf::from("loss.csv")),
                report_every: default_report_every(),
            },
        }
    }

    /// A hidden layer of 8 rectified units over 100000 integral keys, the precursor of an index's
    /// first stage.
    pub fn network() -> Self {
        Self {
            dataset: DatasetConfig {
                size: 100_000,
                max_value: 1e5,
                integral: true,
                ..Default::default()
            },
            model: ModelConfig::Sequential {
                layers: vec![
                    LayerConfig::Dense {
                        dim: (1, 8),
                        init: InitConfig::GlorotNormal,
                        act_fn: None,
                    },
                    LayerConfig::Activation {
                        act_fn: ActFnConfig::Relu,
                    },
                    LayerConfig::Dense {
                        dim: (8, 1),
                        init: InitConfig::GlorotNormal,
                        act_fn: None,
                    },
                ],
            },
            training: TrainingConfig {
                batch_size: 256,
                epochs: 25000,
                optimizer: OptimizerConfig::adam(0.01),
                loss: LossFnConfig::default(),
                seed: None,
                loss_log: Some(PathBuf::from("loss.csv")),
                report_every: default_report_every(),
            },
        }
    }

    /// Returns one of the built-in configurations by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "linear" => Some(Self::linear()),
            "network" => Some(Self::network()),
            _ => None,
        }
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a JSON configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            IndexErr::invalid(format!("cannot read '{}': {e}", path.display()))
        })?;

        Self::from_json(&content)
    }

    /// Checks that the configuration describes a run that can make progress.
    ///
    /// # Returns
    /// An `InvalidConfiguration` error describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let DatasetConfig {
            size,
            max_value,
            mean_log,
            std_log,
            integral,
        } = self.dataset;

        if size == 0 {
            return Err(IndexErr::invalid("the dataset size must be positive"));
        }
        if !(max_value.is_finite() && max_value > 0.) {
            return Err(IndexErr::invalid(format!(
                "the max value must be a positive number, got {max_value}"
            )));
        }
        if integral && max_value.fract() != 0. {
            return Err(IndexErr::invalid(format!(
                "integral keys need an integral max value, got {max_value}"
            )));
        }
        if !mean_log.is_finite() || !(std_log.is_finite() && std_log >= 0.) {
            return Err(IndexErr::invalid(format!(
                "invalid lognormal parameters: mean {mean_log}, std {std_log}"
            )));
        }

        let TrainingConfig {
            batch_size,
            optimizer,
            report_every,
            ..
        } = &self.training;

        if *batch_size == 0 || *batch_size > size {
            return Err(IndexErr::invalid(format!(
                "the batch size must be in 1..={size}, got {batch_size}"
            )));
        }
        let lr = optimizer.learning_rate();
        if !(lr.is_finite() && lr > 0.) {
            return Err(IndexErr::invalid(format!(
                "the learning rate must be a positive number, got {lr}"
            )));
        }
        if *report_every == 0 {
            return Err(IndexErr::invalid("report_every must be positive"));
        }

        self.validate_layers()
    }

    // The network maps one key to one position, so the widths must chain from 1 to 1.
    fn validate_layers(&self) -> Result<()> {
        let ModelConfig::Sequential { layers } = &self.model;

        if layers.is_empty() {
            return Err(IndexErr::invalid("the model needs at least one layer"));
        }

        let mut width = 1;
        for (i, layer) in layers.iter().enumerate() {
            let LayerConfig::Dense { dim, .. } = layer else {
                continue;
            };

            if dim.0 != width {
                return Err(IndexErr::invalid(format!(
                    "layer {i} expects {} inputs but receives {width}",
                    dim.0
                )));
            }

            width = dim.1;
        }

        if width != 1 {
            return Err(IndexErr::invalid(format!(
                "the model must output a single position, it outputs {width}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        HarnessConfig::linear().validate().unwrap();
        HarnessConfig::network().validate().unwrap();
        assert!(HarnessConfig::preset("other").is_none());
    }

    #[test]
    fn presets_generate_integral_keys() {
        assert!(HarnessConfig::linear().dataset.integral);
        assert!(HarnessConfig::network().dataset.integral);
    }

    #[test]
    fn fractional_max_with_integral_keys_is_rejected() {
        let mut config = HarnessConfig::linear();
        config.dataset.max_value = 100.5;

        assert!(matches!(
            config.validate(),
            Err(IndexErr::InvalidConfiguration(_))
        ));

        config.dataset.integral = false;
        config.validate().unwrap();
    }

    #[test]
    fn parses_json_with_defaults() {
        let json = r#"{
            "dataset": { "size": 500, "max_value": 50.0 },
            "model": { "sequential": { "layers": [
                { "dense": { "dim": [1, 4], "act_fn": "relu" } },
                { "dense": { "dim": [4, 1], "init": { "const": { "value": 0.0 } } } }
            ] } },
            "training": {
                "batch_size": 32,
                "epochs": 10,
                "optimizer": { "adam": { "learning_rate": 0.001 } },
                "seed": 7
            }
        }"#;

        let config = HarnessConfig::from_json(json).unwrap();

        assert_eq!(config.dataset.std_log, 2.);
        assert!(!config.dataset.integral);
        assert!(matches!(config.training.loss, LossFnConfig::Huber { delta } if delta == 1.));
        assert!(matches!(
            config.training.optimizer,
            OptimizerConfig::Adam { beta1, .. } if beta1 == 0.9
        ));
        assert_eq!(config.training.seed, Some(7));
        assert!(config.training.loss_log.is_none());

        let ModelConfig::Sequential { layers } = &config.model;
        assert!(matches!(
            layers[0],
            LayerConfig::Dense {
                init: InitConfig::GlorotNormal,
                act_fn: Some(ActFnConfig::Relu),
                ..
            }
        ));
    }

    #[test]
    fn oversized_batch_is_rejected() {
        let mut config = HarnessConfig::linear();
        config.training.batch_size = 1001;

        assert!(matches!(
            config.validate(),
            Err(IndexErr::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let mut config = HarnessConfig::linear();
        config.dataset.size = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn widths_must_chain_from_one_to_one() {
        let mut config = HarnessConfig::linear();
        config.model = ModelConfig::Sequential {
            layers: vec![LayerConfig::Dense {
                dim: (1, 2),
                init: InitConfig::default(),
                act_fn: None,
            }],
        };
        assert!(config.validate().is_err());

        config.model = ModelConfig::Sequential {
            layers: vec![LayerConfig::Dense {
                dim: (2, 1),
                init: InitConfig::default(),
                act_fn: None,
            }],
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_an_invalid_configuration() {
        assert!(matches!(
            HarnessConfig::from_json("{ \"dataset\": 3 }"),
            Err(IndexErr::InvalidConfiguration(_))
        ));
    }
}
