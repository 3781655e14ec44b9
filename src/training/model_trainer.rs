use std::time::Instant;

use log::{debug, info, trace};
use machine_learning::arch::{Model, loss::LossFn};
use ndarray::Array2;
use rand::Rng;

use super::{Evaluation, PositionScale, Prediction, Trainer};
use crate::{
    IndexErr, Result,
    data::{Batch, KeyDataset, MinibatchSampler},
    loss_log::LossSink,
};

/// A model `Trainer`. Fits a model mapping each key to its position in a sorted dataset.
pub struct ModelTrainer<M, L, R>
where
    M: Model,
    L: LossFn,
    R: Rng,
{
    model: M,
    loss_fn: L,
    dataset: KeyDataset,
    sampler: MinibatchSampler,
    scale: PositionScale,

    epochs: usize,
    report_every: usize,
    rng: R,
}

impl<M, L, R> ModelTrainer<M, L, R>
where
    M: Model,
    L: LossFn,
    R: Rng,
{
    /// Returns a new `ModelTrainer`.
    ///
    /// # Arguments
    /// * `model` - The model that will be trained, owning its optimizer.
    /// * `loss_fn` - Measures the difference between the predicted and the true positions.
    /// * `dataset` - The sorted keys the model learns to locate.
    /// * `batch_size` - The amount of distinct keys per epoch.
    /// * `epochs` - The amount of optimizer steps to take.
    /// * `rng` - Draws the minibatches.
    ///
    /// # Returns
    /// An error if the batch size is zero or larger than the dataset.
    pub fn new(
        model: M,
        loss_fn: L,
        dataset: KeyDataset,
        batch_size: usize,
        epochs: usize,
        rng: R,
    ) -> Result<Self> {
        let sampler = MinibatchSampler::new(batch_size, dataset.len())?;
        let scale = PositionScale::new(dataset.len());

        Ok(Self {
            model,
            loss_fn,
            dataset,
            sampler,
            scale,
            epochs,
            report_every: 1000,
            rng,
        })
    }

    /// Logs the loss at `info` level every `report_every` epochs instead of every 1000.
    pub fn with_report_every(mut self, report_every: usize) -> Self {
        self.report_every = report_every.max(1);
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Performs every epoch of training.
    ///
    /// # Arguments
    /// * `sink` - Receives the `(epoch, loss)` pair of every epoch as soon as it's computed.
    ///
    /// # Returns
    /// The loss of every epoch or the first error, `NumericInstability` if the loss diverges.
    pub fn train<S: LossSink + ?Sized>(&mut self, sink: &mut S) -> Result<Vec<f32>> {
        let mut losses = Vec::with_capacity(self.epochs);
        let start = Instant::now();

        for epoch in 0..self.epochs {
            let loss = self.train_epoch(epoch, sink)?;

            if epoch % self.report_every == 0 {
                info!("epoch {epoch}: loss {loss}");
            }

            losses.push(loss);
        }

        let elapsed = start.elapsed();
        info!(
            epochs = self.epochs, secs = elapsed.as_secs_f64();
            "training finished in {elapsed:.2?}"
        );

        Ok(losses)
    }

    /// Performs a single optimizer step over a fresh minibatch.
    pub fn train_epoch<S: LossSink + ?Sized>(&mut self, epoch: usize, sink: &mut S) -> Result<f32> {
        let batch = self.next_batch()?;
        let y_pred = self.predict(&batch)?;

        let loss = self.loss_fn.loss(y_pred.view(), batch.positions.view());
        if !loss.is_finite() {
            return Err(IndexErr::NumericInstability { epoch, loss });
        }

        trace!(epoch = epoch, loss = loss; "epoch finished");
        sink.record(epoch, loss)?;

        let d = self.loss_fn.loss_prime(y_pred.view(), batch.positions.view());
        self.model.backward(self.scale.to_model_grad(d))?;
        self.model.step()?;

        Ok(loss)
    }

    /// Predicts the positions of a fresh minibatch, leaving the model untouched.
    ///
    /// # Returns
    /// The predictions ordered by key.
    pub fn evaluate(&mut self) -> Result<Evaluation> {
        let batch = self.next_batch()?;
        let y_pred = self.predict(&batch)?;

        let predictions = batch
            .keys
            .iter()
            .zip(batch.positions.iter())
            .zip(y_pred.iter())
            .map(|((&key, &position), &predicted)| Prediction {
                key,
                position,
                predicted,
            })
            .collect();

        let evaluation = Evaluation::new(predictions);
        debug!(
            keys = evaluation.len(),
            spearman = evaluation.spearman(),
            mean_abs_error = evaluation.mean_abs_error();
            "evaluated model"
        );

        Ok(evaluation)
    }

    fn next_batch(&mut self) -> Result<Batch> {
        let indices = self.sampler.sample(&mut self.rng);
        Batch::assemble(&self.dataset, indices)
    }

    fn predict(&mut self, batch: &Batch) -> Result<Array2<f32>> {
        let raw = self.model.forward(batch.keys.view())?;

        if raw.dim() != batch.positions.dim() {
            return Err(IndexErr::invalid(format!(
                "the model outputs a {:?} tensor for a {:?} batch",
                raw.dim(),
                batch.positions.dim()
            )));
        }

        Ok(self.scale.to_positions(raw))
    }
}

impl<M, L, R> Trainer for ModelTrainer<M, L, R>
where
    M: Model,
    L: LossFn,
    R: Rng,
{
    fn train(&mut self, sink: &mut dyn LossSink) -> Result<Vec<f32>> {
        self.train(sink)
    }

    fn evaluate(&mut self) -> Result<Evaluation> {
        self.evaluate()
    }
}
