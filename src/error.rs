use crate::layer::LayerType;

/// Everything that can go wrong while building, training or persisting a network.
#[derive(thiserror::Error, Debug)]
pub enum NetworkError {
    #[error("no layer of type \"{0}\" exists")]
    UnknownLayerType(String),

    #[error("solver \"{0}\" not available")]
    UnknownSolver(String),

    #[error("unrecognised training option \"{0}\"")]
    UnknownOption(String),

    #[error("invalid value \"{value}\" for option {name}")]
    InvalidOption { name: String, value: String },

    #[error("scope must be Classification or Regression, got \"{0}\"")]
    UnknownScope(String),

    #[error(transparent)]
    Config(#[from] toml::de::Error),

    #[error("a softmax layer needs more than one unit, got {0}")]
    SoftmaxWidth(usize),

    #[error("layer width must be positive, got {0}")]
    InvalidWidth(usize),

    #[error("a network needs at least an input and an output layer, got {0} widths")]
    TooFewLayers(usize),

    #[error("{0} cannot be used as a hidden layer type")]
    InvalidHiddenType(LayerType),

    #[error("the network needs an input layer first")]
    MissingInput,

    #[error("the network already has an input layer")]
    DuplicateInput,

    #[error("the network already has layers")]
    NotEmpty,

    #[error("layers cannot be added once the network has been run")]
    Frozen,

    #[error("the network needs at least an input and an output layer")]
    NotBuilt,

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("target kind does not match the output layer")]
    TargetMismatch,

    #[error("the output layer has no policy/value heads")]
    NoPolicyValueHead,

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("dataset carries no class labels")]
    MissingLabels,

    #[error("fraction must be between 0 and 1, got {0}")]
    InvalidFraction(f64),

    #[error("cross validation needs at least one fold")]
    InvalidFolds,

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Init(#[from] rand_distr::NormalError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
