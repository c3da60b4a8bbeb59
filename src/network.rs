mod save;

use std::{fmt, str::FromStr};

use rand::Rng;

use crate::{
    dataset::{Dataset, Target},
    layer::{Layer, LayerType},
    trainer::{ansi, TrainingParams},
    NetworkError, NetworkResult,
};

/// What the outputs of a single-head network mean.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scope {
    #[default]
    Classification,
    Regression,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classification => write!(f, "Classification"),
            Self::Regression => write!(f, "Regression"),
        }
    }
}

impl FromStr for Scope {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Classification" => Ok(Self::Classification),
            "Regression" => Ok(Self::Regression),
            _ => Err(NetworkError::UnknownScope(s.to_string())),
        }
    }
}

/// Options for [`NeuralNet::build_network`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildOptions {
    /// Type shared by every hidden layer.
    pub hidden_type: LayerType,
    pub out_type: LayerType,
    pub scope: Scope,
    /// Print structure and parameter reports.
    pub verbose: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { hidden_type: LayerType::Tanh, out_type: LayerType::PolicyValue, scope: Scope::default(), verbose: true }
    }
}

/// A strictly sequential stack of layers, input first.
///
/// Layers can only be appended until the first forward pass, after which
/// the shape of the network is fixed.
#[derive(Clone, Debug, Default)]
pub struct NeuralNet {
    pub(crate) layers: Vec<Layer>,
    pub(crate) scope: Scope,
    pub(crate) params: TrainingParams,
    pub(crate) verbose: bool,
    pub(crate) loss_history: Vec<f64>,
    frozen: bool,
}

impl NeuralNet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an input layer, `widths.len() - 2` hidden layers of a single
    /// type and an output layer in one go, Xavier-initialising every
    /// non-input layer from `rng`.
    pub fn build_network<R: Rng + ?Sized>(
        &mut self,
        widths: &[usize],
        options: &BuildOptions,
        rng: &mut R,
    ) -> NetworkResult<()> {
        if !self.layers.is_empty() {
            return Err(NetworkError::NotEmpty);
        }

        if widths.len() < 2 {
            return Err(NetworkError::TooFewLayers(widths.len()));
        }

        if !options.hidden_type.is_hidden_capable() {
            return Err(NetworkError::InvalidHiddenType(options.hidden_type));
        }

        if options.out_type == LayerType::Input {
            return Err(NetworkError::DuplicateInput);
        }

        let last = widths.len() - 1;
        let kinds = std::iter::once(LayerType::Input)
            .chain(std::iter::repeat(options.hidden_type).take(last - 1))
            .chain(std::iter::once(options.out_type));

        for (kind, &width) in kinds.zip(widths) {
            if let Err(err) = self.add_layer(kind, width, rng) {
                self.layers.clear();
                return Err(err);
            }
        }

        self.scope = options.scope;
        self.verbose = options.verbose;

        if self.verbose {
            self.print_structure();
        }

        Ok(())
    }

    /// Appends one layer. A non-input layer is fed by the current last layer
    /// and Xavier-initialised immediately.
    pub fn add_layer<R: Rng + ?Sized>(&mut self, kind: LayerType, width: usize, rng: &mut R) -> NetworkResult<()> {
        if self.frozen {
            return Err(NetworkError::Frozen);
        }

        let layer = match (kind, self.layers.last()) {
            (LayerType::Input, None) => Layer::new(kind, width, 0)?,
            (LayerType::Input, Some(_)) => return Err(NetworkError::DuplicateInput),
            (_, None) => return Err(NetworkError::MissingInput),
            (_, Some(previous)) => {
                let mut layer = Layer::new(kind, width, previous.width())?;
                layer.xavier_init(rng)?;
                layer
            }
        };

        log::debug!("added {} layer of width {}", kind, width);
        self.layers.push(layer);

        Ok(())
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    pub fn input_width(&self) -> Option<usize> {
        self.layers.first().map(Layer::width)
    }

    pub fn output_layer(&self) -> Option<&Layer> {
        self.layers.last()
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn set_scope(&mut self, scope: Scope) {
        self.scope = scope;
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn training_params(&self) -> &TrainingParams {
        &self.params
    }

    pub fn set_training_params(&mut self, params: TrainingParams) -> NetworkResult<()> {
        params.validate()?;
        self.params = params;

        if self.verbose {
            self.params.display();
        }

        Ok(())
    }

    /// Loss of every update made so far, oldest first.
    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    pub(crate) fn check_built(&self) -> NetworkResult<()> {
        if self.layers.len() < 2 {
            return Err(NetworkError::NotBuilt);
        }

        Ok(())
    }

    pub(crate) fn check_example(&self, input: &[f64], target: &Target) -> NetworkResult<()> {
        self.check_input(input)?;
        self.output()?.check_target(target)
    }

    fn check_input(&self, input: &[f64]) -> NetworkResult<()> {
        self.check_built()?;

        let expected = self.layers[0].width();
        if input.len() != expected {
            return Err(NetworkError::DimensionMismatch { expected, actual: input.len() });
        }

        Ok(())
    }

    fn output(&self) -> NetworkResult<&Layer> {
        self.check_built()?;
        self.layers.last().ok_or(NetworkError::NotBuilt)
    }

    pub fn forward_propagation(&mut self, input: &[f64]) -> NetworkResult<()> {
        self.check_input(input)?;
        self.frozen = true;

        self.layers[0].activate(input);

        for i in 1..self.layers.len() {
            let (previous, rest) = self.layers.split_at_mut(i);
            rest[0].activate(previous[i - 1].units());
        }

        Ok(())
    }

    /// Accumulates the gradients of the loss against `target` for the
    /// example last passed to [`NeuralNet::forward_propagation`].
    pub fn back_propagation(&mut self, target: &Target) -> NetworkResult<()> {
        self.check_built()?;

        let last = self.layers.len() - 1;
        self.layers[last].delta_out(target)?;

        {
            let (previous, output) = self.layers.split_at_mut(last);
            output[0].update_gradients(previous[last - 1].units());
        }

        for i in (1..last).rev() {
            let (upto, next) = self.layers.split_at_mut(i + 1);
            upto[i].delta(&next[0]);

            let (previous, current) = upto.split_at_mut(i);
            current[0].update_gradients(previous[i - 1].units());
        }

        Ok(())
    }

    /// Loss of the current output against `target`.
    pub fn example_loss(&self, target: &Target) -> NetworkResult<f64> {
        self.output()?.compute_error(target)
    }

    /// Mean loss over `dataset`, without touching the parameters.
    pub fn loss(&mut self, dataset: &Dataset) -> NetworkResult<f64> {
        if dataset.is_empty() {
            return Err(NetworkError::EmptyDataset);
        }

        let mut total = 0.0;
        for (input, target) in dataset.inputs().iter().zip(dataset.targets()) {
            self.forward_propagation(input)?;
            total += self.example_loss(target)?;
        }

        Ok(total / dataset.len() as f64)
    }

    pub fn rmse(&mut self, dataset: &Dataset) -> NetworkResult<f64> {
        Ok(self.loss(dataset)?.sqrt())
    }

    /// Fraction of examples classified as their label.
    pub fn validate(&mut self, dataset: &Dataset) -> NetworkResult<f64> {
        let labels = dataset.labels().ok_or(NetworkError::MissingLabels)?;

        if dataset.is_empty() {
            return Err(NetworkError::EmptyDataset);
        }

        let mut correct = 0;
        for (input, &label) in dataset.inputs().iter().zip(labels) {
            if self.classify(input)? == label {
                correct += 1;
            }
        }

        Ok(f64::from(correct) / dataset.len() as f64)
    }

    /// Output units for `input`.
    pub fn predict(&mut self, input: &[f64]) -> NetworkResult<Vec<f64>> {
        self.forward_propagation(input)?;
        Ok(self.output()?.units().to_vec())
    }

    /// Move probabilities and evaluation for `input`.
    pub fn activate(&mut self, input: &[f64]) -> NetworkResult<(Vec<f64>, f64)> {
        self.output()?.as_policy_value().ok_or(NetworkError::NoPolicyValueHead)?;
        self.forward_propagation(input)?;

        let head = self.output()?.as_policy_value().ok_or(NetworkError::NoPolicyValueHead)?;
        Ok((head.p().to_vec(), head.v()))
    }

    pub fn classify(&mut self, input: &[f64]) -> NetworkResult<usize> {
        self.forward_propagation(input)?;
        Ok(self.output()?.pick_class())
    }

    pub fn predict_dataset(&mut self, inputs: &[Vec<f64>]) -> NetworkResult<Vec<Vec<f64>>> {
        inputs.iter().map(|input| self.predict(input)).collect()
    }

    pub fn activate_dataset(&mut self, inputs: &[Vec<f64>]) -> NetworkResult<(Vec<Vec<f64>>, Vec<f64>)> {
        let mut policies = Vec::with_capacity(inputs.len());
        let mut values = Vec::with_capacity(inputs.len());

        for input in inputs {
            let (policy, value) = self.activate(input)?;
            policies.push(policy);
            values.push(value);
        }

        Ok((policies, values))
    }

    pub fn classify_dataset(&mut self, inputs: &[Vec<f64>]) -> NetworkResult<Vec<usize>> {
        inputs.iter().map(|input| self.classify(input)).collect()
    }

    /// Rebuilds the merged view of every dual-head layer.
    pub fn sync_heads(&mut self) {
        for layer in &mut self.layers {
            layer.sync();
        }
    }

    pub fn print_structure(&self) {
        let Some((input, rest)) = self.layers.split_first() else {
            println!("Empty network");
            return;
        };

        println!("Scope                  : {}", ansi(self.scope, "32;1"));
        println!("Input                  : {}", ansi(input.width(), 31));

        if let Some((output, hidden)) = rest.split_last() {
            for (i, layer) in hidden.iter().enumerate() {
                let desc = format!("{} ({})", layer.width(), layer.layer_type());
                println!("Hidden {:<16}: {}", i + 1, ansi(desc, 31));
            }

            let desc = format!("{} ({})", output.width(), output.layer_type());
            println!("Output                 : {}", ansi(desc, 31));
        }

        println!("Parameters             : {}", ansi(self.parameter_count(), 35));
    }
}

impl fmt::Display for NeuralNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, layer) in self.layers.iter().enumerate() {
            if i > 0 {
                write!(f, " -> {} ({})", layer.width(), layer.layer_type())?;
            } else {
                write!(f, "{}", layer.width())?;
            }
        }

        Ok(())
    }
}
