use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum NNError {
    // Model configuration errors, raised by build() and config validation
    ConfigError(String),

    // Input, label or capability output disagrees with the declared widths.
    // Shapes are (rows, cols); every vector is a column.
    ShapeMismatch {
        what: &'static str,
        got: (usize, usize),
        expected: (usize, usize),
    },

    // Operation called out of the per-example order
    InvalidState {
        op: &'static str,
        stage: &'static str,
    },

    // Malformed dataset field (bad number, label out of range)
    ParseError(String),

    // File operations
    IoError(std::io::Error),
    CsvError(csv::Error),
    SerializationError(serde_json::Error),
}

impl fmt::Display for NNError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NNError::ConfigError(msg) => write!(f, "Invalid model configuration: {}", msg),
            NNError::ShapeMismatch { what, got, expected } => write!(
                f,
                "Shape mismatch for {}: got {:?}, expected {:?}",
                what, got, expected
            ),
            NNError::InvalidState { op, stage } => {
                write!(f, "Cannot call {}() while the model is {}", op, stage)
            }
            NNError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            NNError::IoError(err) => write!(f, "I/O error: {}", err),
            NNError::CsvError(err) => write!(f, "CSV error: {}", err),
            NNError::SerializationError(err) => write!(f, "Serialization error: {}", err),
        }
    }
}

impl From<std::io::Error> for NNError {
    fn from(err: std::io::Error) -> NNError {
        NNError::IoError(err)
    }
}

impl From<csv::Error> for NNError {
    fn from(err: csv::Error) -> NNError {
        NNError::CsvError(err)
    }
}

impl From<serde_json::Error> for NNError {
    fn from(err: serde_json::Error) -> NNError {
        NNError::SerializationError(err)
    }
}

impl Error for NNError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NNError::IoError(err) => Some(err),
            NNError::CsvError(err) => Some(err),
            NNError::SerializationError(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, NNError>;
