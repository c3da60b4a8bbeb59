use rand::Rng;
use rand_distr::NormalError;

use crate::{
    matrix::Matrix,
    optimiser::{Moments, Update},
    rng, NetworkError, NetworkResult,
};

/// Affine layer, `units = weights · previous + biases`.
///
/// Also serves as the affine part of every activated layer, which is why it
/// carries its own error signal (`deltas`) and gradient buffers.
#[derive(Clone, Debug, PartialEq)]
pub struct Linear {
    units: Vec<f64>,
    weights: Matrix,
    biases: Vec<f64>,
    grad_weights: Matrix,
    grad_biases: Vec<f64>,
    weight_moments: Moments,
    bias_moments: Moments,
    deltas: Vec<f64>,
}

impl Linear {
    /// A zero-initialised layer of `n` units fed by `nprevious` units.
    pub fn new(n: usize, nprevious: usize) -> Self {
        Self {
            units: vec![0.0; n],
            weights: Matrix::zeroed(n, nprevious),
            biases: vec![0.0; n],
            grad_weights: Matrix::zeroed(n, nprevious),
            grad_biases: vec![0.0; n],
            weight_moments: Moments::zeroed(n * nprevious),
            bias_moments: Moments::zeroed(n),
            deltas: vec![0.0; n],
        }
    }

    pub fn width(&self) -> usize {
        self.units.len()
    }

    /// Width of the layer feeding this one.
    pub fn inputs(&self) -> usize {
        self.weights.cols()
    }

    pub fn units(&self) -> &[f64] {
        &self.units
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    pub fn deltas(&self) -> &[f64] {
        &self.deltas
    }

    pub fn grad_weights(&self) -> &Matrix {
        &self.grad_weights
    }

    pub fn grad_biases(&self) -> &[f64] {
        &self.grad_biases
    }

    pub fn weight_moments(&self) -> &Moments {
        &self.weight_moments
    }

    pub fn bias_moments(&self) -> &Moments {
        &self.bias_moments
    }

    pub fn xavier_init<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), NormalError> {
        self.weights = rng::xavier(self.weights.rows(), self.weights.cols(), rng)?;
        Ok(())
    }

    pub fn set_weights(&mut self, weights: Matrix) -> NetworkResult<()> {
        if weights.shape() != self.weights.shape() {
            let (rows, cols) = self.weights.shape();
            return Err(NetworkError::DimensionMismatch { expected: rows * cols, actual: weights.vals().len() });
        }

        self.weights = weights;
        Ok(())
    }

    pub fn set_biases(&mut self, biases: Vec<f64>) -> NetworkResult<()> {
        if biases.len() != self.biases.len() {
            return Err(NetworkError::DimensionMismatch { expected: self.biases.len(), actual: biases.len() });
        }

        self.biases = biases;
        Ok(())
    }

    pub fn activate(&mut self, previous: &[f64]) {
        self.weights.affine(previous, &self.biases, &mut self.units);
    }

    /// Output-layer error signal under the sum-of-squares loss.
    pub fn delta_out(&mut self, target: &[f64]) {
        for ((d, u), t) in self.deltas.iter_mut().zip(&self.units).zip(target) {
            *d = u - t;
        }
    }

    /// Overwrites the error signal; used by the activated layers after
    /// applying their derivative.
    pub(crate) fn deltas_mut(&mut self) -> &mut [f64] {
        &mut self.deltas
    }

    pub fn update_gradients(&mut self, previous: &[f64]) {
        for (g, d) in self.grad_biases.iter_mut().zip(&self.deltas) {
            *g += d;
        }

        self.grad_weights.add_outer(&self.deltas, previous);
    }

    /// Applies one optimiser step and clears the accumulated gradients.
    pub fn apply_update(&mut self, update: &Update) {
        self.weight_moments.apply(update, self.weights.vals_mut(), self.grad_weights.vals_mut(), true);
        self.bias_moments.apply(update, &mut self.biases, &mut self.grad_biases, false);
    }

    pub fn pick_class(&self) -> usize {
        argmax(&self.units)
    }

    pub fn compute_error(&self, target: &[f64]) -> f64 {
        sum_of_squares(&self.units, target)
    }
}

/// Index of the first largest value.
pub(crate) fn argmax(xs: &[f64]) -> usize {
    let mut best = 0;

    for (i, &x) in xs.iter().enumerate() {
        if x > xs[best] {
            best = i;
        }
    }

    best
}

pub(crate) fn sum_of_squares(units: &[f64], target: &[f64]) -> f64 {
    units.iter().zip(target).map(|(u, t)| 0.5 * (t - u) * (t - u)).sum()
}
