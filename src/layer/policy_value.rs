use rand::Rng;
use rand_distr::NormalError;

use super::activation::{Activated, Activation};
use crate::{matrix::Matrix, optimiser::Update, NetworkError, NetworkResult};

/// Dual-headed output layer: a softmax policy over `n - 1` moves and a tanh
/// value estimate, both fed from the same previous layer.
///
/// The heads share no parameters. The merged view (`weights`, `biases`,
/// `deltas`) stacks them policy-first and is only consistent right after
/// [`PolicyValue::sync`], which `delta_out`, `backprop` and the
/// initialisation/loading paths call.
#[derive(Clone, Debug, PartialEq)]
pub struct PolicyValue {
    policy: Activated,
    value: Activated,
    weights: Matrix,
    biases: Vec<f64>,
    deltas: Vec<f64>,
    units: Vec<f64>,
}

impl PolicyValue {
    pub fn new(n: usize, nprevious: usize) -> NetworkResult<Self> {
        if n == 0 {
            return Err(NetworkError::InvalidWidth(n));
        }

        let policy = Activated::new(Activation::Softmax, n - 1, nprevious)?;
        let value = Activated::new(Activation::Tanh, 1, nprevious)?;

        let mut layer = Self {
            policy,
            value,
            weights: Matrix::zeroed(n, nprevious),
            biases: vec![0.0; n],
            deltas: vec![0.0; n],
            units: vec![0.0; n],
        };
        layer.sync();

        Ok(layer)
    }

    pub fn width(&self) -> usize {
        self.units.len()
    }

    pub fn policy(&self) -> &Activated {
        &self.policy
    }

    pub fn value(&self) -> &Activated {
        &self.value
    }

    pub fn policy_mut(&mut self) -> &mut Activated {
        &mut self.policy
    }

    pub fn value_mut(&mut self) -> &mut Activated {
        &mut self.value
    }

    /// Move probabilities from the last activation.
    pub fn p(&self) -> &[f64] {
        self.policy.units()
    }

    /// Position evaluation from the last activation.
    pub fn v(&self) -> f64 {
        self.value.units()[0]
    }

    /// Policy followed by value.
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

    /// Rebuilds the merged view from the heads.
    pub fn sync(&mut self) {
        let (policy, value) = (self.policy.lin(), self.value.lin());

        self.weights = policy.weights().stack(value.weights());

        self.biases.clear();
        self.biases.extend_from_slice(policy.biases());
        self.biases.extend_from_slice(value.biases());

        self.deltas.clear();
        self.deltas.extend_from_slice(policy.deltas());
        self.deltas.extend_from_slice(value.deltas());
    }

    pub fn xavier_init<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), NormalError> {
        self.policy.lin_mut().xavier_init(rng)?;
        self.value.lin_mut().xavier_init(rng)?;
        self.sync();
        Ok(())
    }

    /// Splits a merged `n x nprevious` matrix between the heads.
    pub fn set_weights(&mut self, weights: Matrix) -> NetworkResult<()> {
        if weights.shape() != self.weights.shape() {
            let (rows, cols) = self.weights.shape();
            return Err(NetworkError::DimensionMismatch { expected: rows * cols, actual: weights.vals().len() });
        }

        let (policy, value) = weights.split_rows(self.width() - 1);
        self.policy.lin_mut().set_weights(policy)?;
        self.value.lin_mut().set_weights(value)?;
        self.weights = weights;

        Ok(())
    }

    pub fn set_biases(&mut self, biases: Vec<f64>) -> NetworkResult<()> {
        if biases.len() != self.width() {
            return Err(NetworkError::DimensionMismatch { expected: self.width(), actual: biases.len() });
        }

        let split = self.width() - 1;
        self.policy.lin_mut().set_biases(biases[..split].to_vec())?;
        self.value.lin_mut().set_biases(biases[split..].to_vec())?;
        self.biases = biases;

        Ok(())
    }

    pub fn activate(&mut self, previous: &[f64]) {
        self.policy.activate(previous);
        self.value.activate(previous);

        self.units.clear();
        self.units.extend_from_slice(self.policy.units());
        self.units.extend_from_slice(self.value.units());
    }

    pub fn delta_out(&mut self, policy: &[f64], value: f64) {
        self.policy.delta_out(policy);
        self.value.delta_out(&[value]);
        self.sync();
    }

    /// Hidden-layer use: `upstream` is the gradient with respect to
    /// [`PolicyValue::units`] and is routed to the matching head.
    pub fn backprop(&mut self, upstream: &[f64]) {
        let (policy, value) = upstream.split_at(self.width() - 1);
        self.policy.backprop(policy);
        self.value.backprop(value);
        self.sync();
    }

    pub fn update_gradients(&mut self, previous: &[f64]) {
        self.policy.lin_mut().update_gradients(previous);
        self.value.lin_mut().update_gradients(previous);
    }

    pub fn apply_update(&mut self, update: &Update) {
        self.policy.lin_mut().apply_update(update);
        self.value.lin_mut().apply_update(update);
    }

    /// The most probable move.
    pub fn pick_class(&self) -> usize {
        self.policy.pick_class()
    }

    /// Cross-entropy of the policy plus sum-of-squares of the value.
    pub fn compute_error(&self, policy: &[f64], value: f64) -> f64 {
        self.policy.compute_error(policy) + self.value.compute_error(&[value])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng;

    #[test]
    fn merged_view_follows_heads() {
        let mut layer = PolicyValue::new(5, 3).unwrap();
        layer.xavier_init(&mut rng::seeded(3)).unwrap();

        layer.policy_mut().lin_mut().set_biases(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        layer.value_mut().lin_mut().set_biases(vec![5.0]).unwrap();
        layer.sync();

        assert_eq!(layer.biases(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(layer.weights(), &layer.policy().lin().weights().stack(layer.value().lin().weights()));
    }

    #[test]
    fn merged_parameters_split_into_heads() {
        let mut layer = PolicyValue::new(3, 2).unwrap();
        let weights = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();

        layer.set_weights(weights.clone()).unwrap();
        layer.set_biases(vec![0.1, 0.2, 0.3]).unwrap();

        assert_eq!(layer.policy().lin().weights().row(1), &[3.0, 4.0]);
        assert_eq!(layer.value().lin().weights().row(0), &[5.0, 6.0]);
        assert_eq!(layer.value().lin().biases(), &[0.3]);
        assert_eq!(layer.weights(), &weights);
    }

    #[test]
    fn outputs_and_error() {
        let mut layer = PolicyValue::new(3, 2).unwrap();
        layer.xavier_init(&mut rng::seeded(9)).unwrap();
        layer.activate(&[0.5, -1.0]);

        let sum: f64 = layer.p().iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(layer.v().abs() < 1.0);
        assert_eq!(layer.units().len(), 3);
        assert_eq!(layer.units()[2], layer.v());

        let expected = -layer.p()[1].ln() + 0.5 * (0.25 - layer.v()).powi(2);
        assert!((layer.compute_error(&[0.0, 1.0], 0.25) - expected).abs() < 1e-12);
    }

    #[test]
    fn needs_a_real_policy() {
        assert!(matches!(PolicyValue::new(2, 3), Err(NetworkError::SoftmaxWidth(1))));
        assert!(matches!(PolicyValue::new(0, 3), Err(NetworkError::InvalidWidth(0))));
    }
}
