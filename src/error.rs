use std::{error::Error, fmt, io};

use machine_learning::{MlErr, initialization::RandErr};
use ndarray::ShapeError;
use rand_distr::NormalError;

/// The harness' result type.
pub type Result<T> = std::result::Result<T, IndexErr>;

/// Failures that abort a training run.
#[derive(Debug)]
pub enum IndexErr {
    /// The configuration can't describe a valid run: empty dataset, a batch larger than the
    /// dataset, or tensors whose shapes don't match the model's.
    InvalidConfiguration(String),
    /// The loss stopped being a finite number.
    NumericInstability { epoch: usize, loss: f32 },
    Io(io::Error),
}

impl IndexErr {
    pub(crate) fn invalid<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

impl fmt::Display for IndexErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexErr::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            IndexErr::NumericInstability { epoch, loss } => {
                write!(f, "numeric instability at epoch {epoch}: loss is {loss}")
            }
            IndexErr::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for IndexErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            IndexErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for IndexErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<MlErr> for IndexErr {
    fn from(value: MlErr) -> Self {
        Self::InvalidConfiguration(value.to_string())
    }
}

impl From<RandErr> for IndexErr {
    fn from(value: RandErr) -> Self {
        Self::InvalidConfiguration(format!("invalid initialization: {value}"))
    }
}

impl From<NormalError> for IndexErr {
    fn from(value: NormalError) -> Self {
        Self::InvalidConfiguration(format!("invalid key distribution: {value}"))
    }
}

impl From<ShapeError> for IndexErr {
    fn from(value: ShapeError) -> Self {
        Self::InvalidConfiguration(value.to_string())
    }
}

impl From<serde_json::Error> for IndexErr {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidConfiguration(format!("invalid JSON: {value}"))
    }
}
