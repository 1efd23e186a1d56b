//! Error types for classifier inference

use std::fmt;

/// Result type alias for classifier operations
pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Inference produced a distribution that cannot be normalised
    ImproperBelief { context: String },

    /// Feature vectors and belief state disagree on dimensionality
    DimensionMismatch {
        expected: usize,
        got: usize,
        context: String,
    },

    /// Operation needs at least one resident
    EmptyDataSet { context: String },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::ImproperBelief { context } => {
                write!(f, "Improper belief during {}", context)
            }
            ModelError::DimensionMismatch {
                expected,
                got,
                context,
            } => write!(
                f,
                "Dimension mismatch in {}: expected {} features, got {}",
                context, expected, got
            ),
            ModelError::EmptyDataSet { context } => {
                write!(f, "Empty data set: {} requires at least one resident", context)
            }
        }
    }
}

impl std::error::Error for ModelError {}

impl ModelError {
    pub fn improper(context: impl Into<String>) -> Self {
        ModelError::ImproperBelief {
            context: context.into(),
        }
    }

    pub fn dimension_mismatch(expected: usize, got: usize, context: impl Into<String>) -> Self {
        ModelError::DimensionMismatch {
            expected,
            got,
            context: context.into(),
        }
    }

    pub fn empty(context: impl Into<String>) -> Self {
        ModelError::EmptyDataSet {
            context: context.into(),
        }
    }

    /// Whether the error is the recoverable improper-belief condition.
    pub fn is_improper(&self) -> bool {
        matches!(self, ModelError::ImproperBelief { .. })
    }
}
