//! Error type for recurrent cell operations
//!
//! Shape problems are detected before any state of the cell is touched, so a
//! failed call leaves weights, accumulators and the carried hidden state as
//! they were.

use thiserror::Error;

/// Errors raised by [`RecurrentCell`](crate::cells::RecurrentCell) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CellError {
    /// A cell dimension was zero.
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    /// Input rows passed to forward propagation have the wrong width.
    #[error("expected input samples of width {expected}, got {actual}")]
    InputWidth { expected: usize, actual: usize },

    /// Backward propagation received a different number of gradients than the trace holds.
    #[error("trace holds {expected} steps but {actual} output gradients were supplied")]
    SequenceLength { expected: usize, actual: usize },

    /// An output gradient is not a `hidden_size × 1` column.
    #[error("output gradient at step {step} has shape {actual:?}, expected {expected:?}")]
    GradientShape {
        step: usize,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// A replacement parameter tensor does not match the parameter's shape.
    #[error("{name} must have shape {expected:?}, got {actual:?}")]
    ParameterShape {
        name: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// The initialization distribution could not be built.
    #[error("weight initialization failed: {0}")]
    Initialization(String),
}
