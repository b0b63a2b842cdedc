use thiserror::Error;

/// Convenience alias used throughout the regression crates
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while learning or applying a regressor.
/// A system that is not invertible is not an error, see [`crate::Regressor::learn`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The operands of a matrix operation have incompatible shapes
    #[error("dimension mismatch in {operation}: expected shape {expected:?}, got {found:?}")]
    DimensionMismatch {
        /// The operation that was attempted
        operation: &'static str,
        /// The (rows, columns) the operand needed to have
        expected: (usize, usize),
        /// The (rows, columns) the operand actually had
        found: (usize, usize),
    },

    /// A scalar prediction was requested from a regressor that is not 1x1
    #[error(
        "trying to predict a scalar, but the regressor has {rows} rows and {cols} columns instead of exactly one"
    )]
    PredictShapeViolation {
        /// Rows of the learned coefficients
        rows: usize,
        /// Columns of the learned coefficients
        cols: usize,
    },

    /// `predict` was called before `learn`
    #[error("the regressor has not learned anything yet")]
    NotTrained,

    /// The given data contains no examples or no dimensions
    #[error("no examples given to {0}")]
    NoExamples(&'static str),

    /// The best-effort pseudo-inverse of a singular system could not be computed
    #[error("unable to compute the pseudo-inverse: {0}")]
    PseudoInverse(&'static str),
}
