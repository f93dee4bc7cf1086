//! ReLU recurrent cell with manual backpropagation through time
//!
//! The cell computes, for every sample `x_t` of a sequence:
//!
//! ```text
//! h_t = relu(W_hx · x_t + W_hh · h_{t-1} + b_h)
//! ```
//!
//! Forward propagation records each step in a [`ForwardTrace`]. Backward
//! propagation consumes that trace, walks it from the last step to the first,
//! and adds the weight and bias gradients into accumulators that persist until
//! [`RecurrentCell::update_weights`] or
//! [`RecurrentCell::clear_stored_derivatives`] resets them. Several
//! forward/backward pairs can therefore be accumulated before a single update.

use log::{debug, trace};
use ndarray::{Array2, ArrayView2, Axis, Zip};
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::params::{ParamKind, Parameter, ParameterMut};
use super::trace::ForwardTrace;
use crate::error::CellError;
use crate::optimizers::Optimizer;
use crate::utils::{clip_gradient_norm, relu_with_mask};

/// Hidden size used by [`RecurrentCell::with_input_size`].
pub const DEFAULT_HIDDEN_SIZE: usize = 100;

/// Norm that [`RecurrentCell::clip_gradients`] clips each accumulator to.
pub const GRADIENT_CLIP_THRESHOLD: f64 = 5.0;

/// Learning rate of the default gradient-descent update.
pub const DEFAULT_LEARNING_RATE: f64 = 0.001;

/// Single recurrent layer with a ReLU nonlinearity.
///
/// # Fields
///
/// * `w_hh` - Recurrent weight (hidden_size × hidden_size), initialized to the identity
/// * `w_hx` - Input projection (hidden_size × input_size), Glorot/He normal initialization
/// * `b_h` - Hidden bias column (hidden_size × 1), initialized to zero
/// * `d_w_hh`, `d_w_hx`, `d_b_h` - Gradient accumulators with the same shapes
/// * `state` - Hidden state the next forward pass starts from
/// * `input_gradients` - Input gradients collected since the last update or state reset
///
/// # Example
///
/// ```
/// use ndarray::{Array2, arr2};
/// use rust_rnn_cell::cells::RecurrentCell;
///
/// let mut cell = RecurrentCell::seeded(2, 4, 7).unwrap();
/// let data = arr2(&[[0.5, -0.25], [1.0, 0.75], [0.0, 0.5]]);
///
/// let trace = cell.forward_propagate(data.view()).unwrap();
/// assert_eq!(trace.outputs().dim(), (3, 4));
///
/// let grads = vec![Array2::<f64>::ones((4, 1)); 3];
/// let input_grads = cell.backward_propagate(trace, &grads).unwrap();
/// assert_eq!(input_grads.len(), 3);
/// assert_eq!(input_grads[0].dim(), (2, 1));
///
/// cell.clip_gradients();
/// cell.update_weights(0.01);
/// assert!(cell.input_to_hidden_gradient().iter().all(|&g| g == 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct RecurrentCell {
    input_size: usize,
    hidden_size: usize,
    w_hh: Array2<f64>,
    w_hx: Array2<f64>,
    b_h: Array2<f64>,
    d_w_hh: Array2<f64>,
    d_w_hx: Array2<f64>,
    d_b_h: Array2<f64>,
    state: Array2<f64>,
    input_gradients: Vec<Array2<f64>>,
}

impl RecurrentCell {
    /// Create a cell whose input projection is drawn from the thread-local RNG.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::InvalidDimension`] if either size is zero.
    pub fn new(input_size: usize, hidden_size: usize) -> Result<Self, CellError> {
        Self::with_rng(input_size, hidden_size, &mut rand::thread_rng())
    }

    /// Create a cell with [`DEFAULT_HIDDEN_SIZE`] hidden units.
    pub fn with_input_size(input_size: usize) -> Result<Self, CellError> {
        Self::new(input_size, DEFAULT_HIDDEN_SIZE)
    }

    /// Create a cell with a reproducible initialization.
    pub fn seeded(input_size: usize, hidden_size: usize, seed: u64) -> Result<Self, CellError> {
        Self::with_rng(input_size, hidden_size, &mut StdRng::seed_from_u64(seed))
    }

    /// Create a cell drawing its input projection from `rng`.
    ///
    /// `W_hx` is sampled from `N(0, sqrt(2 / (input_size + hidden_size)))`.
    /// `W_hh` starts as the identity so the recurrent path initially carries
    /// the hidden state forward unchanged. Biases and all gradient
    /// accumulators start at zero.
    pub fn with_rng<R: Rng + ?Sized>(
        input_size: usize,
        hidden_size: usize,
        rng: &mut R,
    ) -> Result<Self, CellError> {
        if input_size == 0 || hidden_size == 0 {
            return Err(CellError::InvalidDimension(format!(
                "input_size ({}) and hidden_size ({}) must be positive",
                input_size, hidden_size
            )));
        }

        let std_dev = (2.0 / (input_size + hidden_size) as f64).sqrt();
        let normal =
            Normal::new(0.0, std_dev).map_err(|e| CellError::Initialization(e.to_string()))?;

        debug!(
            "initializing recurrent cell: input_size={}, hidden_size={}, std_dev={:.4}",
            input_size, hidden_size, std_dev
        );

        Ok(Self {
            input_size,
            hidden_size,
            w_hh: Array2::eye(hidden_size),
            w_hx: Array2::random_using((hidden_size, input_size), normal, rng),
            b_h: Array2::zeros((hidden_size, 1)),
            d_w_hh: Array2::zeros((hidden_size, hidden_size)),
            d_w_hx: Array2::zeros((hidden_size, input_size)),
            d_b_h: Array2::zeros((hidden_size, 1)),
            state: Array2::zeros((hidden_size, 1)),
            input_gradients: Vec::new(),
        })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Total number of trainable scalars (both weight matrices plus the bias).
    pub fn parameter_count(&self) -> usize {
        self.w_hh.len() + self.w_hx.len() + self.b_h.len()
    }

    /// Hidden state the next forward pass starts from.
    pub fn hidden_state(&self) -> &Array2<f64> {
        &self.state
    }

    pub fn hidden_to_hidden_weight(&self) -> &Array2<f64> {
        &self.w_hh
    }

    pub fn input_to_hidden_weight(&self) -> &Array2<f64> {
        &self.w_hx
    }

    pub fn hidden_bias(&self) -> &Array2<f64> {
        &self.b_h
    }

    pub fn hidden_to_hidden_gradient(&self) -> &Array2<f64> {
        &self.d_w_hh
    }

    pub fn input_to_hidden_gradient(&self) -> &Array2<f64> {
        &self.d_w_hx
    }

    pub fn hidden_bias_gradient(&self) -> &Array2<f64> {
        &self.d_b_h
    }

    /// Input gradients collected by backward passes since the last update or
    /// state reset. Each backward call prepends its own gradients, so the
    /// most recent pass comes first and each pass is in forward-time order.
    pub fn input_gradients(&self) -> &[Array2<f64>] {
        &self.input_gradients
    }

    /// Replace one weight tensor.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::ParameterShape`] if `value` does not have the
    /// parameter's shape; the cell is left unchanged.
    pub fn set_parameter(&mut self, kind: ParamKind, value: Array2<f64>) -> Result<(), CellError> {
        let target = match kind {
            ParamKind::HiddenToHiddenWeight => &mut self.w_hh,
            ParamKind::InputToHiddenWeight => &mut self.w_hx,
            ParamKind::HiddenBias => &mut self.b_h,
        };
        if target.dim() != value.dim() {
            return Err(CellError::ParameterShape {
                name: kind.as_str(),
                expected: target.dim(),
                actual: value.dim(),
            });
        }
        *target = value;
        Ok(())
    }

    /// Run the cell over `data` (`samples × input_size`), one row per time step.
    ///
    /// The sequence starts from the carried hidden state, which afterwards
    /// holds the last produced state. The returned trace must be passed to
    /// [`backward_propagate`](Self::backward_propagate) to obtain gradients;
    /// its [`outputs`](ForwardTrace::outputs) are the produced hidden states,
    /// always `samples × hidden_size`. A single sample gives a `1 × hidden_size`
    /// matrix; no axis is squeezed.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::InputWidth`] if `data` does not have `input_size` columns.
    pub fn forward_propagate(&mut self, data: ArrayView2<'_, f64>) -> Result<ForwardTrace, CellError> {
        let mut trace = ForwardTrace::new(self.state.clone());
        self.extend_trace(&mut trace, data)?;
        Ok(trace)
    }

    /// Continue `trace` with more samples, starting from its last hidden state.
    ///
    /// A single backward pass over the extended trace propagates gradients
    /// across the chunk boundary. Returns the hidden states produced for
    /// `data` only, stacked as `samples × hidden_size`.
    pub fn extend_trace(
        &mut self,
        trace: &mut ForwardTrace,
        data: ArrayView2<'_, f64>,
    ) -> Result<Array2<f64>, CellError> {
        if data.ncols() != self.input_size {
            return Err(CellError::InputWidth {
                expected: self.input_size,
                actual: data.ncols(),
            });
        }

        let start = trace.len();
        for sample in data.axis_iter(Axis(0)) {
            let input = sample.insert_axis(Axis(1)).to_owned();
            let mut hidden = self.w_hx.dot(&input) + self.w_hh.dot(trace.last_state()) + &self.b_h;
            let mask = relu_with_mask(&mut hidden);
            trace.push(input, hidden, mask);
        }
        self.state = trace.last_state().clone();

        debug!(
            "forward: {} steps (trace length {})",
            trace.len() - start,
            trace.len()
        );
        Ok(trace.outputs_from(start))
    }

    /// Backpropagate `output_gradients` through the recorded steps of `trace`.
    ///
    /// `output_gradients[t]` is the gradient of the loss with respect to the
    /// hidden state of step `t` (`hidden_size × 1`). Weight and bias gradients
    /// are added to the accumulators. The carried hidden state is restored to
    /// the state the trace started from.
    ///
    /// Returns the gradient with respect to each input column, in forward-time
    /// order. The same gradients are prepended to
    /// [`input_gradients`](Self::input_gradients).
    ///
    /// The state is only rewound correctly when traces are consumed newest
    /// first. Consuming an older trace before a newer one leaves the carried
    /// state at the newer trace's starting point.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::SequenceLength`] or [`CellError::GradientShape`]
    /// before anything is accumulated if the gradients do not match the trace.
    pub fn backward_propagate(
        &mut self,
        trace: ForwardTrace,
        output_gradients: &[Array2<f64>],
    ) -> Result<Vec<Array2<f64>>, CellError> {
        if output_gradients.len() != trace.len() {
            return Err(CellError::SequenceLength {
                expected: trace.len(),
                actual: output_gradients.len(),
            });
        }
        let expected = (self.hidden_size, 1);
        if let Some((step, grad)) = output_gradients
            .iter()
            .enumerate()
            .find(|(_, grad)| grad.dim() != expected)
        {
            return Err(CellError::GradientShape {
                step,
                expected,
                actual: grad.dim(),
            });
        }

        let mut input_grads = Vec::with_capacity(trace.len());
        let mut dh: Option<Array2<f64>> = None;
        for (step, dy) in output_gradients.iter().enumerate().rev() {
            // dL/dh_t = dy_t + W_hh^T · dL/dz_{t+1}
            let mut grad = match dh.take() {
                None => dy.clone(),
                Some(next) => self.w_hh.t().dot(&next) + dy,
            };
            Zip::from(&mut grad)
                .and(&trace.relu_masks[step])
                .for_each(|g, &clamped| {
                    if clamped {
                        *g = 0.0;
                    }
                });

            self.d_w_hh += &grad.dot(&trace.previous_state(step).t());
            self.d_w_hx += &grad.dot(&trace.inputs[step].t());
            self.d_b_h += &grad;
            input_grads.push(self.w_hx.t().dot(&grad));

            dh = Some(grad);
        }
        input_grads.reverse();

        self.state = trace.initial_state;
        let mut collected = input_grads.clone();
        collected.append(&mut self.input_gradients);
        self.input_gradients = collected;

        debug!("backward: {} steps", input_grads.len());
        Ok(input_grads)
    }

    /// Clip each gradient accumulator to norm [`GRADIENT_CLIP_THRESHOLD`].
    pub fn clip_gradients(&mut self) {
        self.clip_gradients_to(GRADIENT_CLIP_THRESHOLD);
    }

    /// Clip each gradient accumulator independently to norm `threshold`.
    pub fn clip_gradients_to(&mut self, threshold: f64) {
        for param in self.parameters_mut() {
            let norm = clip_gradient_norm(&mut *param.gradient, threshold);
            if norm > threshold {
                trace!("clipped {} gradient from norm {:.4}", param.name(), norm);
            }
        }
    }

    /// Plain gradient descent: `weight -= learning_rate * gradient`.
    ///
    /// Zeroes the accumulators and clears the collected input gradients afterwards.
    pub fn update_weights(&mut self, learning_rate: f64) {
        for param in self.parameters_mut() {
            param.weight.scaled_add(-learning_rate, &*param.gradient);
            param.gradient.fill(0.0);
        }
        self.input_gradients.clear();
        debug!("weights updated (learning rate {})", learning_rate);
    }

    /// Apply `weight += optimizer.delta(kind, weight, gradient)` to every parameter.
    ///
    /// All three deltas are computed before any weight changes. Zeroes the
    /// accumulators and clears the collected input gradients afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::ParameterShape`] if a delta does not have exactly
    /// its weight's shape. Weights, accumulators and collected input gradients
    /// are then left unchanged, although a stateful optimizer may already
    /// have advanced its own statistics.
    pub fn update_weights_with<O: Optimizer + ?Sized>(
        &mut self,
        optimizer: &mut O,
    ) -> Result<(), CellError> {
        let deltas = self
            .parameters()
            .map(|param| {
                let delta = optimizer.delta(param.kind, param.weight, param.gradient);
                if delta.dim() != param.weight.dim() {
                    return Err(CellError::ParameterShape {
                        name: param.name(),
                        expected: param.weight.dim(),
                        actual: delta.dim(),
                    });
                }
                Ok(delta)
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (param, delta) in self.parameters_mut().zip(deltas) {
            *param.weight += &delta;
            param.gradient.fill(0.0);
        }
        self.input_gradients.clear();
        debug!("weights updated");
        Ok(())
    }

    /// Iterate over `(weight, gradient, name)` of every parameter.
    pub fn parameters(&self) -> impl Iterator<Item = Parameter<'_>> {
        [
            Parameter {
                kind: ParamKind::HiddenToHiddenWeight,
                weight: &self.w_hh,
                gradient: &self.d_w_hh,
            },
            Parameter {
                kind: ParamKind::InputToHiddenWeight,
                weight: &self.w_hx,
                gradient: &self.d_w_hx,
            },
            Parameter {
                kind: ParamKind::HiddenBias,
                weight: &self.b_h,
                gradient: &self.d_b_h,
            },
        ]
        .into_iter()
    }

    /// Iterate over mutable handles to every weight and its accumulator.
    pub fn parameters_mut(&mut self) -> impl Iterator<Item = ParameterMut<'_>> {
        [
            ParameterMut {
                kind: ParamKind::HiddenToHiddenWeight,
                weight: &mut self.w_hh,
                gradient: &mut self.d_w_hh,
            },
            ParameterMut {
                kind: ParamKind::InputToHiddenWeight,
                weight: &mut self.w_hx,
                gradient: &mut self.d_w_hx,
            },
            ParameterMut {
                kind: ParamKind::HiddenBias,
                weight: &mut self.b_h,
                gradient: &mut self.d_b_h,
            },
        ]
        .into_iter()
    }

    /// Reset the carried hidden state to zeros and drop collected input gradients.
    ///
    /// Weights and gradient accumulators are kept. Traces already returned by
    /// forward propagation stay valid.
    pub fn clear_stored_states(&mut self) {
        self.state.fill(0.0);
        self.input_gradients.clear();
    }

    /// Zero the gradient accumulators without touching weights or states.
    pub fn clear_stored_derivatives(&mut self) {
        for param in self.parameters_mut() {
            param.gradient.fill(0.0);
        }
    }
}

impl std::fmt::Display for RecurrentCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RecurrentCell(input_size={}, hidden_size={})",
            self.input_size, self.hidden_size
        )
    }
}
