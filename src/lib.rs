//! A harness for learning the position of a key in a sorted set of keys, the building block of a
//! learned index.
//!
//! A run generates a lognormal dataset, trains a small network on random minibatches of it and
//! evaluates the network on a fresh minibatch.

pub mod config;
pub mod data;
pub mod error;
pub mod loss_log;
pub mod training;

use std::io;

use log::info;

pub use error::{IndexErr, Result};

use config::HarnessConfig;
use loss_log::CsvLossLog;
use training::{Evaluation, TrainerBuilder};

/// Builds, trains and evaluates the experiment described by `config`.
///
/// The loss of every epoch is written to `config.training.loss_log` when set.
pub fn run(config: &HarnessConfig) -> Result<Evaluation> {
    let mut trainer = TrainerBuilder::new().build(config)?;

    match &config.training.loss_log {
        Some(path) => {
            let mut log = CsvLossLog::create(path)?;
            trainer.train(&mut log)?;
            log.finish()?;
            info!("loss log written to {}", path.display());
        }
        None => {
            trainer.train(&mut CsvLossLog::new(io::sink()))?;
        }
    }

    trainer.evaluate()
}
