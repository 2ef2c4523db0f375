use std::fmt::{self, Display};
use std::io;

/// Errors surfaced while building or reporting on a model run.
///
/// Failures inside a step are invariant violations, not `ModelError`s: the
/// engine panics and the caller aborts the run.
#[derive(Debug)]
pub enum ModelError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    UnknownDistrict(String),
    ShapeMismatch {
        table: &'static str,
        expected: String,
        found: String,
    },
    InvalidPolygon(String),
    ModelError(String),
}

impl From<io::Error> for ModelError {
    fn from(error: io::Error) -> Self {
        ModelError::IoError(error)
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(error: serde_json::Error) -> Self {
        ModelError::JsonError(error)
    }
}

impl From<csv::Error> for ModelError {
    fn from(error: csv::Error) -> Self {
        ModelError::CsvError(error)
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::IoError(error) => Some(error),
            ModelError::JsonError(error) => Some(error),
            ModelError::CsvError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelError::IoError(error) => write!(f, "I/O error: {error}"),
            ModelError::JsonError(error) => write!(f, "JSON error: {error}"),
            ModelError::CsvError(error) => write!(f, "CSV error: {error}"),
            ModelError::UnknownDistrict(name) => write!(f, "unknown district: {name}"),
            ModelError::ShapeMismatch {
                table,
                expected,
                found,
            } => write!(f, "{table} has shape {found}, expected {expected}"),
            ModelError::InvalidPolygon(name) => {
                write!(f, "district {name} needs at least three vertices")
            }
            ModelError::ModelError(message) => write!(f, "{message}"),
        }
    }
}
