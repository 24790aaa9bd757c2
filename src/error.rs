use std::fmt;

/// Result type for bound computations.
pub type BoundResult<T> = Result<T, BoundError>;

/// Errors raised while setting up a bound computation.
///
/// All of them are detected before the first iteration runs. Numeric trouble
/// during a run is not an error, it ends the run with
/// [`Termination::NumericInstability`](crate::datastructures::Termination).
#[derive(Debug, Clone, PartialEq)]
pub enum BoundError {
    /// Malformed dimensions, negative quantities, non-finite numbers or
    /// unusable solver parameters.
    InvalidInput {
        /// What was wrong with the input.
        context: String,
    },
}

impl BoundError {
    pub(crate) fn invalid_input(context: impl Into<String>) -> Self {
        Self::InvalidInput {
            context: context.into(),
        }
    }
}

impl fmt::Display for BoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { context } => {
                write!(f, "Invalid input: {}", context)
            }
        }
    }
}

impl std::error::Error for BoundError {}
