use std::{fmt, str::FromStr};

use super::logger::ansi;
use crate::{NetworkError, NetworkResult};

/// Parameter update rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Solver {
    /// Gradient descent with momentum.
    #[default]
    Sgd,
    Adam,
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sgd => write!(f, "sgd"),
            Self::Adam => write!(f, "adam"),
        }
    }
}

impl FromStr for Solver {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sgd" => Ok(Self::Sgd),
            "adam" => Ok(Self::Adam),
            _ => Err(NetworkError::UnknownSolver(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainingParams {
    pub solver: Solver,
    pub learning_rate: f64,
    /// Fraction of the previous SGD step carried into the next one.
    pub momentum: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    /// L2 penalty on the weights. Biases are never decayed.
    pub weight_decay: f64,
    /// Examples per update; 1 trains online.
    pub batch_size: usize,
    /// Passes over the (reshuffled) dataset per training call.
    pub training_rounds: usize,
    /// Whether training calls hand back their per-update losses.
    pub return_error: bool,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            solver: Solver::Sgd,
            learning_rate: 0.01,
            momentum: 0.0,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            weight_decay: 0.0,
            batch_size: 1,
            training_rounds: 1,
            return_error: false,
        }
    }
}

impl TrainingParams {
    pub const OPTIONS: [&'static str; 10] = [
        "solver",
        "learning_rate",
        "momentum",
        "beta1",
        "beta2",
        "epsilon",
        "weight_decay",
        "batchsize",
        "training_rounds",
        "return_error",
    ];

    /// Defaults overridden by the options in a TOML table.
    pub fn from_toml(text: &str) -> NetworkResult<Self> {
        let mut params = Self::default();
        params.update_from_toml(text)?;
        Ok(params)
    }

    /// Applies every key of a TOML table through [`TrainingParams::set_option`];
    /// absent options keep their current values.
    pub fn update_from_toml(&mut self, text: &str) -> NetworkResult<()> {
        let table: toml::Table = text.parse()?;

        for (key, value) in &table {
            let value = match value {
                toml::Value::String(s) => s.clone(),
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => return Err(NetworkError::InvalidOption { name: key.clone(), value: other.to_string() }),
            };

            self.set_option(key, &value)?;
        }

        Ok(())
    }

    pub fn set_option(&mut self, key: &str, value: &str) -> NetworkResult<()> {
        match key {
            "solver" => self.solver = value.parse()?,
            "learning_rate" => self.learning_rate = parse_float(key, value)?,
            "momentum" => self.momentum = parse_float(key, value)?,
            "beta1" => self.beta1 = parse_float(key, value)?,
            "beta2" => self.beta2 = parse_float(key, value)?,
            "epsilon" => self.epsilon = parse_float(key, value)?,
            "weight_decay" => self.weight_decay = parse_float(key, value)?,
            "batchsize" => self.batch_size = parse_count(key, value)?,
            "training_rounds" => self.training_rounds = parse_count(key, value)?,
            "return_error" => {
                self.return_error = value.parse().map_err(|_| invalid(key, value))?;
            }
            _ => return Err(NetworkError::UnknownOption(key.to_string())),
        }

        Ok(())
    }

    pub fn validate(&self) -> NetworkResult<()> {
        if self.batch_size == 0 {
            return Err(invalid("batchsize", "0"));
        }

        if self.training_rounds == 0 {
            return Err(invalid("training_rounds", "0"));
        }

        Ok(())
    }

    pub fn display(&self) {
        println!("Solver                 : {}", ansi(self.solver, "32;1"));
        println!("Learning Rate          : {}", ansi(self.learning_rate, 31));

        match self.solver {
            Solver::Sgd => println!("Momentum               : {}", ansi(self.momentum, 31)),
            Solver::Adam => {
                println!("Beta1                  : {}", ansi(self.beta1, 31));
                println!("Beta2                  : {}", ansi(self.beta2, 31));
                println!("Epsilon                : {}", ansi(self.epsilon, 31));
            }
        }

        println!("Weight Decay           : {}", ansi(self.weight_decay, 31));
        println!("Batch Size             : {}", ansi(self.batch_size, 31));
        println!("Training Rounds        : {}", ansi(self.training_rounds, 31));
        println!("Return Error           : {}", ansi(self.return_error, 31));
    }
}

fn invalid(name: &str, value: &str) -> NetworkError {
    NetworkError::InvalidOption { name: name.to_string(), value: value.to_string() }
}

fn parse_float(name: &str, value: &str) -> NetworkResult<f64> {
    value.trim().parse().map_err(|_| invalid(name, value))
}

fn parse_count(name: &str, value: &str) -> NetworkResult<usize> {
    match value.trim().parse::<i64>() {
        Ok(count) if count > 0 => Ok(count as usize),
        _ => Err(invalid(name, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = TrainingParams::default();
        assert_eq!(params.solver, Solver::Sgd);
        assert_eq!(params.learning_rate, 0.01);
        assert_eq!(params.batch_size, 1);
        assert_eq!(params.training_rounds, 1);
        assert!(!params.return_error);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn options_by_name() {
        let mut params = TrainingParams::default();
        params.set_option("solver", "adam").unwrap();
        params.set_option("batchsize", "32").unwrap();
        params.set_option("return_error", "true").unwrap();
        params.set_option("beta2", "0.99").unwrap();

        assert_eq!(params.solver, Solver::Adam);
        assert_eq!(params.batch_size, 32);
        assert!(params.return_error);
        assert_eq!(params.beta2, 0.99);

        assert!(matches!(params.set_option("solver", "rmsprop"), Err(NetworkError::UnknownSolver(_))));
        assert!(matches!(params.set_option("batchsize", "0"), Err(NetworkError::InvalidOption { .. })));
        assert!(matches!(params.set_option("training_rounds", "-3"), Err(NetworkError::InvalidOption { .. })));
        assert!(matches!(params.set_option("momentum", "lots"), Err(NetworkError::InvalidOption { .. })));
        assert!(matches!(params.set_option("dropout", "0.5"), Err(NetworkError::UnknownOption(_))));
    }

    #[test]
    fn toml_keeps_unset_options() {
        let mut params = TrainingParams { momentum: 0.9, ..Default::default() };
        params.update_from_toml("solver = \"adam\"\nlearning_rate = 0.001\nbatchsize = 16\n").unwrap();

        assert_eq!(params.solver, Solver::Adam);
        assert_eq!(params.learning_rate, 0.001);
        assert_eq!(params.batch_size, 16);
        assert_eq!(params.momentum, 0.9);
    }

    #[test]
    fn toml_errors() {
        assert!(matches!(TrainingParams::from_toml("solver = "), Err(NetworkError::Config(_))));
        assert!(matches!(TrainingParams::from_toml("training_rounds = 0"), Err(NetworkError::InvalidOption { .. })));
        assert!(matches!(TrainingParams::from_toml("momentum = [0.9]"), Err(NetworkError::InvalidOption { .. })));
        assert_eq!(TrainingParams::from_toml("").unwrap(), TrainingParams::default());
    }
}
