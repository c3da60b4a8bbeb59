use super::linear::{argmax, sum_of_squares, Linear};
use crate::{NetworkError, NetworkResult};

/// The fixed set of non-linearities an activated layer can apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Activation {
    Tanh,
    Sigmoid,
    ReLU,
    SoftSign,
    /// Normalised exponential, paired with the cross-entropy loss.
    Softmax,
}

impl Activation {
    pub fn activate(self, z: &[f64], out: &mut [f64]) {
        assert_eq!(z.len(), out.len());

        match self {
            Self::Tanh => map(z, out, f64::tanh),
            Self::Sigmoid => map(z, out, |x| 1.0 / (1.0 + (-x).exp())),
            Self::ReLU => map(z, out, |x| if x > 0.0 { x } else { 0.0 }),
            Self::SoftSign => map(z, out, |x| x / (1.0 + x.abs())),
            Self::Softmax => {
                // shifting by the max leaves the result unchanged but keeps exp finite
                let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                map(z, out, |x| (x - max).exp());

                let norm: f64 = out.iter().sum();
                for y in out.iter_mut() {
                    *y /= norm;
                }
            }
        }
    }

    /// Derivative of the activation at pre-activation `z`, where `y` is the
    /// activated value. For softmax this is only the diagonal of the Jacobian.
    pub fn prime(self, z: f64, y: f64) -> f64 {
        match self {
            Self::Tanh => 1.0 / z.cosh().powi(2),
            Self::Sigmoid | Self::Softmax => y * (1.0 - y),
            Self::ReLU => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::SoftSign => 1.0 / (1.0 + z.abs()).powi(2),
        }
    }

    /// `out = J(z)ᵀ · upstream`, the error signal at the pre-activations.
    pub fn backprop(self, z: &[f64], y: &[f64], upstream: &[f64], out: &mut [f64]) {
        match self {
            Self::Softmax => {
                let dot: f64 = y.iter().zip(upstream).map(|(y, g)| y * g).sum();
                for ((o, y), g) in out.iter_mut().zip(y).zip(upstream) {
                    *o = y * (g - dot);
                }
            }
            _ => {
                for (((o, &z), &y), g) in out.iter_mut().zip(z).zip(y).zip(upstream) {
                    *o = self.prime(z, y) * g;
                }
            }
        }
    }

    /// Output-layer error signal. Softmax assumes the cross-entropy loss, for
    /// which the Jacobian cancels, everything else the sum-of-squares loss.
    pub fn delta_out(self, z: &[f64], y: &[f64], target: &[f64], out: &mut [f64]) {
        match self {
            Self::Softmax => {
                for ((o, y), t) in out.iter_mut().zip(y).zip(target) {
                    *o = y - t;
                }
            }
            _ => {
                for (((o, &z), &y), t) in out.iter_mut().zip(z).zip(y).zip(target) {
                    *o = self.prime(z, y) * (y - t);
                }
            }
        }
    }

    pub fn compute_error(self, y: &[f64], target: &[f64]) -> f64 {
        match self {
            // zero-probability targets contribute nothing, even where y underflowed to 0
            Self::Softmax => y.iter().zip(target).filter(|&(_, &t)| t != 0.0).map(|(y, t)| -t * y.ln()).sum(),
            _ => sum_of_squares(y, target),
        }
    }

    pub fn pick_class(self, y: &[f64]) -> usize {
        if y.len() > 1 {
            return argmax(y);
        }

        match self {
            Self::Sigmoid => y[0].round_ties_even() as usize,
            _ => usize::from(y[0] > 0.0),
        }
    }
}

fn map(z: &[f64], out: &mut [f64], f: impl Fn(f64) -> f64) {
    for (o, &x) in out.iter_mut().zip(z) {
        *o = f(x);
    }
}

/// A linear layer followed by an [`Activation`].
#[derive(Clone, Debug, PartialEq)]
pub struct Activated {
    activation: Activation,
    lin: Linear,
    units: Vec<f64>,
}

impl Activated {
    pub fn new(activation: Activation, n: usize, nprevious: usize) -> NetworkResult<Self> {
        if activation == Activation::Softmax && n <= 1 {
            return Err(NetworkError::SoftmaxWidth(n));
        }

        Ok(Self { activation, lin: Linear::new(n, nprevious), units: vec![0.0; n] })
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn lin(&self) -> &Linear {
        &self.lin
    }

    pub fn lin_mut(&mut self) -> &mut Linear {
        &mut self.lin
    }

    pub fn width(&self) -> usize {
        self.units.len()
    }

    pub fn units(&self) -> &[f64] {
        &self.units
    }

    pub fn activate(&mut self, previous: &[f64]) {
        self.lin.activate(previous);
        self.activation.activate(self.lin.units(), &mut self.units);
    }

    pub fn delta_out(&mut self, target: &[f64]) {
        let mut deltas = vec![0.0; self.width()];
        self.activation.delta_out(self.lin.units(), &self.units, target, &mut deltas);
        self.lin.deltas_mut().copy_from_slice(&deltas);
    }

    /// Sets the error signal from the gradient of the loss with respect to
    /// this layer's activated units.
    pub fn backprop(&mut self, upstream: &[f64]) {
        let mut deltas = vec![0.0; self.width()];
        self.activation.backprop(self.lin.units(), &self.units, upstream, &mut deltas);
        self.lin.deltas_mut().copy_from_slice(&deltas);
    }

    pub fn pick_class(&self) -> usize {
        self.activation.pick_class(&self.units)
    }

    pub fn compute_error(&self, target: &[f64]) -> f64 {
        self.activation.compute_error(&self.units, target)
    }
}
