use crate::trainer::{Solver, TrainingParams};

/// One parameter update, resolved from the training parameters for the
/// current batch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Update {
    /// Gradient descent with a momentum term.
    Sgd { learning_rate: f64, momentum: f64, batch_size: usize, weight_decay: f64 },
    /// Adam with the weight decay folded into the gradient. `step` starts at 1.
    Adam { learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64, weight_decay: f64, step: usize },
}

impl Update {
    pub fn new(params: &TrainingParams, batch_size: usize, step: usize) -> Self {
        match params.solver {
            Solver::Sgd => Self::Sgd {
                learning_rate: params.learning_rate,
                momentum: params.momentum,
                batch_size,
                weight_decay: params.weight_decay,
            },
            Solver::Adam => Self::Adam {
                learning_rate: params.learning_rate,
                beta1: params.beta1,
                beta2: params.beta2,
                epsilon: params.epsilon,
                weight_decay: params.weight_decay,
                step,
            },
        }
    }
}

/// Per-parameter optimiser buffers, shaped like the parameters they track.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Moments {
    momentum: Vec<f64>,
    velocity: Vec<f64>,
    last_delta: Vec<f64>,
}

impl Moments {
    pub fn zeroed(size: usize) -> Self {
        Self { momentum: vec![0.0; size], velocity: vec![0.0; size], last_delta: vec![0.0; size] }
    }

    /// First moment estimate (Adam).
    pub fn momentum(&self) -> &[f64] {
        &self.momentum
    }

    /// Second moment estimate (Adam).
    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    /// Change applied by the previous SGD step.
    pub fn last_delta(&self) -> &[f64] {
        &self.last_delta
    }

    /// Applies `update` to `params` using the accumulated `grads`, then zeroes `grads`.
    /// Weight decay only touches the buffer when `decay` is set, biases are never decayed.
    pub fn apply(&mut self, update: &Update, params: &mut [f64], grads: &mut [f64], decay: bool) {
        assert_eq!(params.len(), grads.len());
        assert_eq!(params.len(), self.momentum.len());

        match *update {
            Update::Sgd { learning_rate, momentum, batch_size, weight_decay } => {
                let decay = if decay { weight_decay } else { 0.0 };
                let adj = 1.0 / batch_size as f64;

                for ((p, g), old) in params.iter_mut().zip(grads.iter()).zip(self.last_delta.iter_mut()) {
                    let delta = -learning_rate * (g * adj + decay * *p) + momentum * *old;
                    *p += delta;
                    *old = delta;
                }
            }
            Update::Adam { learning_rate, beta1, beta2, epsilon, weight_decay, step } => {
                let decay = if decay { weight_decay } else { 0.0 };
                let t = i32::try_from(step).unwrap_or(i32::MAX);
                let rate = learning_rate * (1.0 - beta2.powi(t)).sqrt() / (1.0 - beta1.powi(t));

                for (((p, g), m), v) in
                    params.iter_mut().zip(grads.iter()).zip(self.momentum.iter_mut()).zip(self.velocity.iter_mut())
                {
                    let grad = g + decay * *p;
                    *m = beta1 * *m + (1.0 - beta1) * grad;
                    *v = beta2 * *v + (1.0 - beta2) * grad * grad;
                    *p -= rate * *m / (v.sqrt() + epsilon);
                }
            }
        }

        grads.fill(0.0);
    }
}
