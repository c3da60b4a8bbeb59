mod logger;
mod settings;

use std::time::Instant;

use rand::Rng;

pub use logger::{ansi, set_cbcs};
pub use settings::{Solver, TrainingParams};

use crate::{
    dataset::{array_split, Dataset},
    optimiser::Update,
    rng, NetworkError, NetworkResult, NeuralNet,
};

/// Outcome of [`NeuralNet::train_and_validate`].
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationReport {
    /// Per-update loss history after training, if requested.
    pub loss_history: Option<Vec<f64>>,
    pub training_score: f64,
    pub validation_score: f64,
}

/// Effective batch size and number of batches per round for `len` examples.
///
/// A batch size above the dataset size is clamped to it, which leaves a
/// single batch; otherwise the count is `len / batch_size` rounded half to even.
pub fn batch_plan(len: usize, batch_size: usize) -> (usize, usize) {
    if batch_size > len {
        return (len, 1);
    }

    let count = (len as f64 / batch_size as f64).round_ties_even() as usize;
    (batch_size, count.max(1))
}

impl NeuralNet {
    /// Runs `training_rounds` passes over a freshly shuffled copy of
    /// `dataset`, updating the parameters once per example when the batch
    /// size is 1 and once per batch otherwise.
    ///
    /// Returns the whole per-update loss history, earlier calls included,
    /// when `return_error` is set.
    pub fn train_on_dataset<R: Rng + ?Sized>(
        &mut self,
        dataset: &Dataset,
        rng: &mut R,
    ) -> NetworkResult<Option<Vec<f64>>> {
        self.check_built()?;

        if dataset.is_empty() {
            return Err(NetworkError::EmptyDataset);
        }

        for (input, target) in dataset.inputs().iter().zip(dataset.targets()) {
            self.check_example(input, target)?;
        }

        let params = self.params;
        params.validate()?;

        let ntrain = dataset.len();
        let (batch_size, batches) = batch_plan(ntrain, params.batch_size);
        if params.batch_size > ntrain {
            log::warn!("batch size {} exceeds the {} available examples, using one batch", params.batch_size, ntrain);
        }

        log::info!(
            "training {} for {} rounds on {} examples ({} solver, {} per batch)",
            self,
            params.training_rounds,
            ntrain,
            params.solver,
            batch_size,
        );

        let timer = Instant::now();
        let mut history = Vec::new();
        let mut step = 1;

        for round in 1..=params.training_rounds {
            let round_timer = Instant::now();
            let order = rng::permutation(ntrain, rng);
            let start = history.len();

            if batch_size == 1 {
                for &i in &order {
                    let update = Update::new(&params, 1, step);
                    history.push(self.train_batch(dataset, &[i], &update)?);
                    step += 1;
                }
            } else {
                for batch in array_split(&order, batches) {
                    let update = Update::new(&params, batch.len(), step);
                    history.push(self.train_batch(dataset, batch, &update)?);
                    step += 1;
                }
            }

            let round_loss = history[start..].iter().sum::<f64>() / (history.len() - start) as f64;
            log::debug!("round {round}: mean loss {round_loss:.6}");

            if self.verbose {
                let elapsed = round_timer.elapsed().as_secs_f32();
                logger::report_round_finished(
                    round,
                    params.training_rounds,
                    round_loss,
                    elapsed,
                    timer.elapsed().as_secs_f32(),
                );
            }
        }

        self.sync_heads();
        self.loss_history.extend_from_slice(&history);

        let final_loss = history.last().copied().unwrap_or_default();
        log::info!("finished {} updates, last loss {:.6}", history.len(), final_loss);
        if self.verbose {
            logger::report_training_finished(history.len(), final_loss, timer.elapsed().as_secs_f32());
        }

        Ok(params.return_error.then(|| self.loss_history.clone()))
    }

    /// Accumulates gradients over the examples at `indices`, applies one
    /// update and returns their mean loss.
    fn train_batch(&mut self, dataset: &Dataset, indices: &[usize], update: &Update) -> NetworkResult<f64> {
        let mut loss = 0.0;

        for &i in indices {
            let target = dataset.target(i);
            self.forward_propagation(dataset.input(i))?;
            loss += self.example_loss(target)?;
            self.back_propagation(target)?;
        }

        for layer in &mut self.layers[1..] {
            layer.apply_update(update);
        }

        Ok(loss / indices.len() as f64)
    }

    /// Trains on a random `fraction` of `dataset` and scores the network on
    /// both parts.
    pub fn train_and_validate<R: Rng + ?Sized>(
        &mut self,
        dataset: &Dataset,
        fraction: f64,
        rng: &mut R,
    ) -> NetworkResult<ValidationReport> {
        if dataset.labels().is_none() {
            return Err(NetworkError::MissingLabels);
        }

        let (training, validation) = dataset.shuffle_and_split(fraction, rng)?;
        if training.is_empty() || validation.is_empty() {
            return Err(NetworkError::EmptyDataset);
        }

        let loss_history = self.train_on_dataset(&training, rng)?;

        Ok(ValidationReport {
            loss_history,
            training_score: self.validate(&training)?,
            validation_score: self.validate(&validation)?,
        })
    }

    /// Mean validation score over `folds` rounds of shuffling, holding out
    /// `1 / folds` of the data and training on the rest. The same network
    /// keeps training from fold to fold.
    pub fn cross_validation<R: Rng + ?Sized>(
        &mut self,
        dataset: &Dataset,
        folds: usize,
        rng: &mut R,
    ) -> NetworkResult<f64> {
        if folds == 0 {
            return Err(NetworkError::InvalidFolds);
        }

        if dataset.labels().is_none() {
            return Err(NetworkError::MissingLabels);
        }

        let fraction = 1.0 - 1.0 / folds as f64;
        let mut score = 0.0;

        for fold in 1..=folds {
            let (training, validation) = dataset.shuffle_and_split(fraction, rng)?;
            if training.is_empty() || validation.is_empty() {
                return Err(NetworkError::EmptyDataset);
            }

            self.train_on_dataset(&training, rng)?;
            let fold_score = self.validate(&validation)?;
            log::debug!("fold {fold}/{folds}: validation score {fold_score:.4}");

            score += fold_score;
        }

        Ok(score / folds as f64)
    }
}
