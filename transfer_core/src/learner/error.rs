//! Error types for active-learning selection
//!
//! Only the improper-belief condition is recovered locally (hypothetical
//! retraining falls back to the unmodified priors). Everything else reaching
//! the caller is fatal for the run.

use std::fmt;

use crate::data::DataError;
use crate::model::ModelError;

/// Result type alias for selection operations
pub type ActiveResult<T> = Result<T, ActiveError>;

#[derive(Debug)]
pub enum ActiveError {
    /// Index was already moved to the labelled set
    AlreadyLabeled { index: usize },

    /// No unlabelled examples remain to select from
    EmptyUnlabeledPool,

    /// Index outside the resident's example range
    IndexOutOfRange { index: usize, len: usize },

    /// Probability or label vector does not match the pool size
    DimensionMismatch {
        expected: usize,
        got: usize,
        context: String,
    },

    /// `select` called before a belief state was set
    MissingBeliefState,

    /// Invalid parameter value
    InvalidParameter {
        parameter: String,
        value: String,
        constraint: String,
    },

    /// Classifier failure that could not be recovered
    Model(ModelError),

    /// Data sub-setting failure
    Data(DataError),
}

impl fmt::Display for ActiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveError::AlreadyLabeled { index } => {
                write!(f, "The selected index {} is already in the labelled set", index)
            }
            ActiveError::EmptyUnlabeledPool => write!(f, "Empty unlabelled set"),
            ActiveError::IndexOutOfRange { index, len } => {
                write!(f, "Index {} out of range for pool of {} examples", index, len)
            }
            ActiveError::DimensionMismatch {
                expected,
                got,
                context,
            } => write!(
                f,
                "Dimension mismatch in {}: expected {}, got {}",
                context, expected, got
            ),
            ActiveError::MissingBeliefState => {
                write!(f, "No belief state set; call set_belief_state() before select()")
            }
            ActiveError::InvalidParameter {
                parameter,
                value,
                constraint,
            } => write!(
                f,
                "Invalid parameter '{}' = '{}': must satisfy {}",
                parameter, value, constraint
            ),
            ActiveError::Model(err) => write!(f, "Classifier error: {}", err),
            ActiveError::Data(err) => write!(f, "Data error: {}", err),
        }
    }
}

impl std::error::Error for ActiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ActiveError::Model(err) => Some(err),
            ActiveError::Data(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelError> for ActiveError {
    fn from(err: ModelError) -> Self {
        ActiveError::Model(err)
    }
}

impl From<DataError> for ActiveError {
    fn from(err: DataError) -> Self {
        ActiveError::Data(err)
    }
}

impl ActiveError {
    pub fn dimension_mismatch(expected: usize, got: usize, context: impl Into<String>) -> Self {
        ActiveError::DimensionMismatch {
            expected,
            got,
            context: context.into(),
        }
    }

    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl fmt::Display,
        constraint: impl Into<String>,
    ) -> Self {
        ActiveError::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
            constraint: constraint.into(),
        }
    }

    /// Whether this is the terminal empty-pool condition.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, ActiveError::EmptyUnlabeledPool)
    }
}
