//! Error types for data construction, sub-setting and loading.

use std::fmt;

/// Result type alias for data operations
pub type DataResult<T> = Result<T, DataError>;

#[derive(Debug)]
pub enum DataError {
    /// Parallel arrays disagree in length
    DimensionMismatch {
        expected: usize,
        got: usize,
        context: String,
    },

    /// Resident or example index outside the data set
    IndexOutOfRange {
        index: usize,
        len: usize,
        context: String,
    },

    /// Invalid parameter value
    InvalidParameter {
        parameter: String,
        value: String,
        constraint: String,
    },

    /// Failure reading a data file
    Io(std::io::Error),

    /// Malformed data file
    Parse(String),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::DimensionMismatch {
                expected,
                got,
                context,
            } => write!(
                f,
                "Dimension mismatch in {}: expected {}, got {}",
                context, expected, got
            ),
            DataError::IndexOutOfRange {
                index,
                len,
                context,
            } => write!(
                f,
                "Index {} out of range in {} (length {})",
                index, context, len
            ),
            DataError::InvalidParameter {
                parameter,
                value,
                constraint,
            } => write!(
                f,
                "Invalid parameter '{}' = '{}': must satisfy {}",
                parameter, value, constraint
            ),
            DataError::Io(err) => write!(f, "I/O error while reading data: {}", err),
            DataError::Parse(msg) => write!(f, "Failed to parse data: {}", msg),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        DataError::Io(err)
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Parse(err.to_string())
    }
}

impl DataError {
    pub fn dimension_mismatch(expected: usize, got: usize, context: impl Into<String>) -> Self {
        DataError::DimensionMismatch {
            expected,
            got,
            context: context.into(),
        }
    }

    pub fn index_out_of_range(index: usize, len: usize, context: impl Into<String>) -> Self {
        DataError::IndexOutOfRange {
            index,
            len,
            context: context.into(),
        }
    }

    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl fmt::Display,
        constraint: impl Into<String>,
    ) -> Self {
        DataError::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
            constraint: constraint.into(),
        }
    }
}
