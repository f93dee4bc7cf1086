//! Update rules for the recurrent cell's parameters
//!
//! This module provides the Optimizer trait and implementations for different
//! update strategies used by
//! [`RecurrentCell::update_weights_with`](crate::cells::RecurrentCell::update_weights_with).
//!
//! # Overview
//!
//! An optimizer maps a `(weight, gradient)` pair to a delta which the cell
//! adds to the weight. The basic gradient descent rule is
//! `delta = -learning_rate * gradient`, but stateful optimizers like Adam use
//! momentum and adaptive learning rates to improve convergence.
//!
//! # Available Optimizers
//!
//! - [`Sgd`]: Vanilla gradient descent (the cell's default rule)
//! - [`Adam`]: Adaptive moment estimation with per-parameter state
//! - Any closure `FnMut(&Array2<f64>, &Array2<f64>) -> Array2<f64>`
//!
//! # Example
//!
//! ```
//! use ndarray::Array2;
//! use rust_rnn_cell::cells::RecurrentCell;
//! use rust_rnn_cell::optimizers::Adam;
//!
//! let mut cell = RecurrentCell::seeded(3, 4, 0).unwrap();
//!
//! // Built-in strategy
//! let mut adam = Adam::new(0.001, 0.9, 0.999, 1e-8);
//! cell.update_weights_with(&mut adam).unwrap();
//!
//! // Closure strategy: gradient descent with a fixed step
//! let mut rule = |_w: &Array2<f64>, g: &Array2<f64>| g * -0.05;
//! cell.update_weights_with(&mut rule).unwrap();
//! ```

pub mod adam;
pub mod sgd;

pub use adam::Adam;
pub use sgd::Sgd;

use crate::cells::ParamKind;
use ndarray::Array2;

/// Core trait for parameter update strategies.
///
/// The cell calls [`delta`](Optimizer::delta) once per parameter and adds the
/// result to the weight, so implementations never mutate weights themselves.
///
/// # State Management
///
/// Stateful optimizers (like Adam) keep their statistics per [`ParamKind`],
/// so one optimizer instance should be used with one cell.
pub trait Optimizer {
    /// Compute the amount to add to `weight` given its accumulated `gradient`.
    ///
    /// The returned array must have the same shape as `weight`.
    fn delta(&mut self, kind: ParamKind, weight: &Array2<f64>, gradient: &Array2<f64>)
        -> Array2<f64>;

    /// Reset optimizer state.
    ///
    /// For stateless optimizers this is a no-op.
    fn reset(&mut self) {}
}

impl<F> Optimizer for F
where
    F: FnMut(&Array2<f64>, &Array2<f64>) -> Array2<f64>,
{
    fn delta(
        &mut self,
        _kind: ParamKind,
        weight: &Array2<f64>,
        gradient: &Array2<f64>,
    ) -> Array2<f64> {
        self(weight, gradient)
    }
}
