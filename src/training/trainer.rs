use super::Evaluation;
use crate::{Result, loss_log::LossSink};

/// A configured experiment: a model, its data and the loop that trains it.
pub trait Trainer {
    /// Runs every training epoch, recording each epoch's loss into `sink`.
    ///
    /// # Returns
    /// The loss of every epoch, in order.
    fn train(&mut self, sink: &mut dyn LossSink) -> Result<Vec<f32>>;

    /// Predicts the positions of a fresh batch without updating the model.
    fn evaluate(&mut self) -> Result<Evaluation>;
}
