//! Adam (Adaptive Moment Estimation) optimizer implementation
//!
//! This module provides the Adam optimizer, which combines momentum and
//! adaptive learning rates with bias correction for improved convergence.

use std::collections::HashMap;

use crate::cells::ParamKind;
use crate::optimizers::Optimizer;
use ndarray::Array2;

/// Adam (Adaptive Moment Estimation) optimizer.
///
/// Adam maintains two moving averages for each parameter:
///
/// 1. First moment (mean) of gradients (momentum)
/// 2. Second moment (uncentered variance) of gradients (adaptive learning rate)
///
/// The update rule is:
///
/// ```text
/// m_t = β1 * m_{t-1} + (1 - β1) * gradient
/// v_t = β2 * v_{t-1} + (1 - β2) * gradient²
/// m_hat = m_t / (1 - β1^t)
/// v_hat = v_t / (1 - β2^t)
/// delta = -α * m_hat / (√v_hat + ε)
/// ```
///
/// Moments and the time step are tracked separately for each [`ParamKind`].
///
/// # Reference
///
/// Kingma, D. P., & Ba, J. (2014). Adam: A method for stochastic optimization.
/// arXiv preprint arXiv:1412.6980.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    moments: HashMap<ParamKind, Moments>,
}

#[derive(Debug, Clone)]
struct Moments {
    m: Array2<f64>,
    v: Array2<f64>,
    t: i32,
}

impl Moments {
    fn zeros_like(shape: (usize, usize)) -> Self {
        Self {
            m: Array2::zeros(shape),
            v: Array2::zeros(shape),
            t: 0,
        }
    }
}

impl Adam {
    /// Creates a new Adam optimizer with the specified hyperparameters.
    ///
    /// # Typical Values
    ///
    /// The original Adam paper recommends learning_rate 0.001, beta1 0.9,
    /// beta2 0.999 and epsilon 1e-8.
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            moments: HashMap::new(),
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, lr: f64) {
        self.learning_rate = lr;
    }

    /// Number of updates applied so far to `kind`.
    pub fn steps(&self, kind: ParamKind) -> i32 {
        self.moments.get(&kind).map_or(0, |moments| moments.t)
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(0.001, 0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn delta(
        &mut self,
        kind: ParamKind,
        _weight: &Array2<f64>,
        gradient: &Array2<f64>,
    ) -> Array2<f64> {
        let moments = self
            .moments
            .entry(kind)
            .or_insert_with(|| Moments::zeros_like(gradient.dim()));
        // A reshaped parameter starts its statistics over
        if moments.m.dim() != gradient.dim() {
            *moments = Moments::zeros_like(gradient.dim());
        }

        moments.t += 1;
        let bias_correction1 = 1.0 - self.beta1.powi(moments.t);
        let bias_correction2 = 1.0 - self.beta2.powi(moments.t);

        moments.m = &moments.m * self.beta1 + gradient * (1.0 - self.beta1);
        moments.v = &moments.v * self.beta2 + &gradient.mapv(|g| g * g) * (1.0 - self.beta2);

        let m_hat = &moments.m / bias_correction1;
        let v_hat = &moments.v / bias_correction2;
        let denom = v_hat.mapv(|v| v.sqrt() + self.epsilon);

        (m_hat / &denom) * -self.learning_rate
    }

    fn reset(&mut self) {
        self.moments.clear();
    }
}
