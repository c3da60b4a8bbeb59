pub mod activation;
pub mod linear;
pub mod policy_value;

use std::{fmt, str::FromStr};

use rand::Rng;
use rand_distr::NormalError;

pub use activation::{Activated, Activation};
pub use linear::Linear;
pub use policy_value::PolicyValue;

use crate::{dataset::Target, matrix::Matrix, optimiser::Update, NetworkError, NetworkResult};

/// Tag naming every kind of layer a network can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerType {
    Input,
    Linear,
    Tanh,
    Sigmoid,
    ReLU,
    SoftSign,
    Softmax,
    /// Softmax policy head plus tanh value head.
    PolicyValue,
}

impl LayerType {
    pub const ALL: [Self; 8] = [
        Self::Input,
        Self::Linear,
        Self::Tanh,
        Self::Sigmoid,
        Self::ReLU,
        Self::SoftSign,
        Self::Softmax,
        Self::PolicyValue,
    ];

    /// Name used by the structure report and the rich save format.
    pub fn name(self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Linear => "Linear",
            Self::Tanh => "Tanh",
            Self::Sigmoid => "Sigmoid",
            Self::ReLU => "ReLU",
            Self::SoftSign => "SoftSign",
            Self::Softmax => "Softmax",
            Self::PolicyValue => "MCTSL",
        }
    }

    /// Token used by the compact save format.
    pub fn compact_name(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Linear => "linear",
            Self::Tanh => "tanh",
            Self::Sigmoid => "sigmoid",
            Self::ReLU => "relu",
            Self::SoftSign => "softsign",
            Self::Softmax => "softmax",
            Self::PolicyValue => "mcts",
        }
    }

    pub fn from_compact(token: &str) -> NetworkResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.compact_name() == token)
            .ok_or_else(|| NetworkError::UnknownLayerType(token.to_string()))
    }

    pub fn activation(self) -> Option<Activation> {
        match self {
            Self::Tanh => Some(Activation::Tanh),
            Self::Sigmoid => Some(Activation::Sigmoid),
            Self::ReLU => Some(Activation::ReLU),
            Self::SoftSign => Some(Activation::SoftSign),
            Self::Softmax => Some(Activation::Softmax),
            Self::Input | Self::Linear | Self::PolicyValue => None,
        }
    }

    /// Whether the one-shot builder accepts this as the uniform hidden type.
    pub fn is_hidden_capable(self) -> bool {
        !matches!(self, Self::Input | Self::PolicyValue)
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for LayerType {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "Layer" {
            return Ok(Self::Input);
        }

        Self::ALL.into_iter().find(|kind| kind.name() == s).ok_or_else(|| NetworkError::UnknownLayerType(s.to_string()))
    }
}

/// Holds the raw input vector of a network.
#[derive(Clone, Debug, PartialEq)]
pub struct Input {
    units: Vec<f64>,
}

impl Input {
    pub fn new(n: usize) -> Self {
        Self { units: vec![0.0; n] }
    }

    pub fn units(&self) -> &[f64] {
        &self.units
    }

    pub fn activate(&mut self, source: &[f64]) {
        self.units.copy_from_slice(source);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Layer {
    Input(Input),
    Linear(Linear),
    Activated(Activated),
    PolicyValue(PolicyValue),
}

impl Layer {
    /// A zero-initialised layer of `n` units fed by `nprevious` units.
    pub fn new(kind: LayerType, n: usize, nprevious: usize) -> NetworkResult<Self> {
        if n == 0 {
            return Err(NetworkError::InvalidWidth(n));
        }

        Ok(match (kind, kind.activation()) {
            (LayerType::Input, _) => Self::Input(Input::new(n)),
            (LayerType::Linear, _) => Self::Linear(Linear::new(n, nprevious)),
            (LayerType::PolicyValue, _) => Self::PolicyValue(PolicyValue::new(n, nprevious)?),
            (_, Some(activation)) => Self::Activated(Activated::new(activation, n, nprevious)?),
            (_, None) => return Err(NetworkError::UnknownLayerType(kind.to_string())),
        })
    }

    pub fn layer_type(&self) -> LayerType {
        match self {
            Self::Input(_) => LayerType::Input,
            Self::Linear(_) => LayerType::Linear,
            Self::PolicyValue(_) => LayerType::PolicyValue,
            Self::Activated(layer) => match layer.activation() {
                Activation::Tanh => LayerType::Tanh,
                Activation::Sigmoid => LayerType::Sigmoid,
                Activation::ReLU => LayerType::ReLU,
                Activation::SoftSign => LayerType::SoftSign,
                Activation::Softmax => LayerType::Softmax,
            },
        }
    }

    pub fn width(&self) -> usize {
        self.units().len()
    }

    pub fn units(&self) -> &[f64] {
        match self {
            Self::Input(layer) => layer.units(),
            Self::Linear(layer) => layer.units(),
            Self::Activated(layer) => layer.units(),
            Self::PolicyValue(layer) => layer.units(),
        }
    }

    pub fn activate(&mut self, previous: &[f64]) {
        match self {
            Self::Input(layer) => layer.activate(previous),
            Self::Linear(layer) => layer.activate(previous),
            Self::Activated(layer) => layer.activate(previous),
            Self::PolicyValue(layer) => layer.activate(previous),
        }
    }

    /// Checks that `target` fits this layer as an output layer.
    pub fn check_target(&self, target: &Target) -> NetworkResult<()> {
        let (expected, actual) = match (self, target) {
            (Self::Input(_), _) => return Err(NetworkError::TargetMismatch),
            (Self::PolicyValue(layer), Target::PolicyValue { policy, .. }) => (layer.width() - 1, policy.len()),
            (Self::PolicyValue(layer), Target::Vector(t)) => (layer.width(), t.len()),
            (_, Target::PolicyValue { .. }) => return Err(NetworkError::NoPolicyValueHead),
            (layer, Target::Vector(t)) => (layer.width(), t.len()),
        };

        if expected == actual {
            Ok(())
        } else {
            Err(NetworkError::DimensionMismatch { expected, actual })
        }
    }

    /// Output-layer error signal. A dual head also accepts a flat vector
    /// laid out as policy followed by value.
    pub fn delta_out(&mut self, target: &Target) -> NetworkResult<()> {
        self.check_target(target)?;

        match (self, target) {
            (Self::Linear(layer), Target::Vector(t)) => layer.delta_out(t),
            (Self::Activated(layer), Target::Vector(t)) => layer.delta_out(t),
            (Self::PolicyValue(layer), Target::PolicyValue { policy, value }) => layer.delta_out(policy, *value),
            (Self::PolicyValue(layer), Target::Vector(t)) => {
                let (policy, value) = t.split_at(t.len() - 1);
                layer.delta_out(policy, value[0]);
            }
            _ => return Err(NetworkError::TargetMismatch),
        }

        Ok(())
    }

    pub fn compute_error(&self, target: &Target) -> NetworkResult<f64> {
        self.check_target(target)?;

        Ok(match (self, target) {
            (Self::Linear(layer), Target::Vector(t)) => layer.compute_error(t),
            (Self::Activated(layer), Target::Vector(t)) => layer.compute_error(t),
            (Self::PolicyValue(layer), Target::PolicyValue { policy, value }) => layer.compute_error(policy, *value),
            (Self::PolicyValue(layer), Target::Vector(t)) => {
                let (policy, value) = t.split_at(t.len() - 1);
                layer.compute_error(policy, value[0])
            }
            _ => return Err(NetworkError::TargetMismatch),
        })
    }

    /// Weights and error signal of the affine part, as read by the layer
    /// below during back-propagation.
    pub fn linear_view(&self) -> Option<(&Matrix, &[f64])> {
        match self {
            Self::Input(_) => None,
            Self::Linear(layer) => Some((layer.weights(), layer.deltas())),
            Self::Activated(layer) => Some((layer.lin().weights(), layer.lin().deltas())),
            Self::PolicyValue(layer) => Some((layer.weights(), layer.deltas())),
        }
    }

    /// Hidden-layer error signal, back-propagated from `next`.
    pub fn delta(&mut self, next: &Layer) {
        let Some((weights, deltas)) = next.linear_view() else {
            return;
        };

        let mut upstream = vec![0.0; self.width()];
        weights.transpose_mul(deltas, &mut upstream);

        match self {
            Self::Input(_) => {}
            Self::Linear(layer) => layer.deltas_mut().copy_from_slice(&upstream),
            Self::Activated(layer) => layer.backprop(&upstream),
            Self::PolicyValue(layer) => layer.backprop(&upstream),
        }
    }

    pub fn update_gradients(&mut self, previous: &[f64]) {
        match self {
            Self::Input(_) => {}
            Self::Linear(layer) => layer.update_gradients(previous),
            Self::Activated(layer) => layer.lin_mut().update_gradients(previous),
            Self::PolicyValue(layer) => layer.update_gradients(previous),
        }
    }

    pub fn apply_update(&mut self, update: &Update) {
        match self {
            Self::Input(_) => {}
            Self::Linear(layer) => layer.apply_update(update),
            Self::Activated(layer) => layer.lin_mut().apply_update(update),
            Self::PolicyValue(layer) => layer.apply_update(update),
        }
    }

    pub fn pick_class(&self) -> usize {
        match self {
            Self::Input(layer) => linear::argmax(layer.units()),
            Self::Linear(layer) => layer.pick_class(),
            Self::Activated(layer) => layer.pick_class(),
            Self::PolicyValue(layer) => layer.pick_class(),
        }
    }

    pub fn xavier_init<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), NormalError> {
        match self {
            Self::Input(_) => Ok(()),
            Self::Linear(layer) => layer.xavier_init(rng),
            Self::Activated(layer) => layer.lin_mut().xavier_init(rng),
            Self::PolicyValue(layer) => layer.xavier_init(rng),
        }
    }

    /// Weights and biases, merged across heads for a dual head.
    pub fn parameters(&self) -> Option<(&Matrix, &[f64])> {
        match self {
            Self::Input(_) => None,
            Self::Linear(layer) => Some((layer.weights(), layer.biases())),
            Self::Activated(layer) => Some((layer.lin().weights(), layer.lin().biases())),
            Self::PolicyValue(layer) => Some((layer.weights(), layer.biases())),
        }
    }

    pub fn set_parameters(&mut self, weights: Matrix, biases: Vec<f64>) -> NetworkResult<()> {
        match self {
            Self::Input(_) => Err(NetworkError::DimensionMismatch { expected: 0, actual: biases.len() }),
            Self::Linear(layer) => {
                layer.set_weights(weights)?;
                layer.set_biases(biases)
            }
            Self::Activated(layer) => {
                layer.lin_mut().set_weights(weights)?;
                layer.lin_mut().set_biases(biases)
            }
            Self::PolicyValue(layer) => {
                layer.set_weights(weights)?;
                layer.set_biases(biases)
            }
        }
    }

    /// Number of trainable scalars.
    pub fn parameter_count(&self) -> usize {
        self.parameters().map_or(0, |(weights, biases)| weights.vals().len() + biases.len())
    }

    /// Rebuilds the merged view of a dual head; a no-op for other layers.
    pub fn sync(&mut self) {
        if let Self::PolicyValue(layer) = self {
            layer.sync();
        }
    }

    pub fn as_policy_value(&self) -> Option<&PolicyValue> {
        match self {
            Self::PolicyValue(layer) => Some(layer),
            _ => None,
        }
    }
}
