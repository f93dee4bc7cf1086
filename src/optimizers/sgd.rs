//! Stochastic Gradient Descent (SGD) optimizer implementation
//!
//! This module provides the vanilla gradient descent rule the cell uses by
//! default: `delta = -learning_rate * gradient`

use crate::cells::ParamKind;
use crate::optimizers::Optimizer;
use ndarray::Array2;

/// Vanilla gradient descent.
///
/// Implements the basic gradient descent update rule without momentum or
/// adaptive learning rates:
///
/// `w = w - η * ∇L/∂w`
///
/// where w is the parameter, η (eta) is the learning rate, and ∇L/∂w is the gradient.
///
/// # Example
///
/// ```
/// use ndarray::arr2;
/// use rust_rnn_cell::cells::ParamKind;
/// use rust_rnn_cell::optimizers::{Optimizer, Sgd};
///
/// let mut optimizer = Sgd::new(0.1);
/// let weight = arr2(&[[1.0, 2.0]]);
/// let gradient = arr2(&[[0.1, -0.2]]);
///
/// let delta = optimizer.delta(ParamKind::InputToHiddenWeight, &weight, &gradient);
/// assert!((delta[[0, 0]] + 0.01).abs() < 1e-12);
/// assert!((delta[[0, 1]] - 0.02).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Sgd {
    learning_rate: f64,
}

impl Sgd {
    /// Creates a new gradient descent rule with the specified learning rate.
    ///
    /// # Typical Values
    ///
    /// The cell's default is 0.001. Larger values (0.01 - 0.1) train faster
    /// on small problems but may cause the ReLU recurrence to blow up.
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Set a new learning rate, e.g. for a decay schedule driven by the caller.
    pub fn set_learning_rate(&mut self, lr: f64) {
        self.learning_rate = lr;
    }
}

impl Default for Sgd {
    fn default() -> Self {
        Self::new(crate::cells::DEFAULT_LEARNING_RATE)
    }
}

impl Optimizer for Sgd {
    fn delta(
        &mut self,
        _kind: ParamKind,
        _weight: &Array2<f64>,
        gradient: &Array2<f64>,
    ) -> Array2<f64> {
        gradient * -self.learning_rate
    }
}
