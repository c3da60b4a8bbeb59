//! Feed-forward networks with a dual policy/value output, trained with
//! momentum SGD or Adam.

pub mod dataset;
mod error;
pub mod layer;
pub mod matrix;
pub mod network;
pub mod optimiser;
pub mod rng;
pub mod trainer;

pub use dataset::{Dataset, Target};
pub use error::{NetworkError, NetworkResult};
pub use layer::{Activated, Activation, Layer, LayerType, Linear, PolicyValue};
pub use matrix::Matrix;
pub use network::{BuildOptions, NeuralNet, Scope};
pub use trainer::{Solver, TrainingParams, ValidationReport};
