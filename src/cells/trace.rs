//! Forward-pass record consumed by backward propagation.

use ndarray::{Array2, Axis};

/// Everything backward propagation needs from one or more forward chunks.
///
/// A trace is produced by
/// [`RecurrentCell::forward_propagate`](super::RecurrentCell::forward_propagate)
/// and handed back by value to
/// [`RecurrentCell::backward_propagate`](super::RecurrentCell::backward_propagate),
/// so each forward pass can be differentiated at most once.
///
/// Step `t` stores the input column `x_t` (`input_size × 1`), the activated
/// hidden state `h_t` (`hidden_size × 1`) and the mask of entries of `h_t`
/// that are zero after the ReLU.
///
/// A trace cannot be cloned, so it cannot be fed to backward propagation twice:
///
/// ```compile_fail
/// use ndarray::{arr2, Array2};
/// use rust_rnn_cell::RecurrentCell;
///
/// let mut cell = RecurrentCell::seeded(1, 1, 0).unwrap();
/// let trace = cell.forward_propagate(arr2(&[[1.0]]).view()).unwrap();
/// let copy = trace.clone();
/// cell.backward_propagate(trace, &[Array2::ones((1, 1))]).unwrap();
/// cell.backward_propagate(copy, &[Array2::ones((1, 1))]).unwrap();
/// ```
#[derive(Debug)]
pub struct ForwardTrace {
    pub(crate) initial_state: Array2<f64>,
    pub(crate) inputs: Vec<Array2<f64>>,
    pub(crate) hidden_states: Vec<Array2<f64>>,
    pub(crate) relu_masks: Vec<Array2<bool>>,
}

impl ForwardTrace {
    pub(crate) fn new(initial_state: Array2<f64>) -> Self {
        Self {
            initial_state,
            inputs: Vec::new(),
            hidden_states: Vec::new(),
            relu_masks: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, input: Array2<f64>, hidden: Array2<f64>, mask: Array2<bool>) {
        self.inputs.push(input);
        self.hidden_states.push(hidden);
        self.relu_masks.push(mask);
    }

    /// Number of recorded time steps.
    pub fn len(&self) -> usize {
        self.hidden_states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hidden_states.is_empty()
    }

    pub fn hidden_size(&self) -> usize {
        self.initial_state.nrows()
    }

    /// Hidden state the first recorded step started from.
    pub fn initial_state(&self) -> &Array2<f64> {
        &self.initial_state
    }

    /// Hidden state after the last recorded step (the initial state if empty).
    pub fn last_state(&self) -> &Array2<f64> {
        self.hidden_states.last().unwrap_or(&self.initial_state)
    }

    /// Hidden state that step `step` was computed from.
    pub(crate) fn previous_state(&self, step: usize) -> &Array2<f64> {
        if step == 0 {
            &self.initial_state
        } else {
            &self.hidden_states[step - 1]
        }
    }

    pub fn inputs(&self) -> &[Array2<f64>] {
        &self.inputs
    }

    pub fn hidden_states(&self) -> &[Array2<f64>] {
        &self.hidden_states
    }

    pub fn relu_masks(&self) -> &[Array2<bool>] {
        &self.relu_masks
    }

    /// Recorded hidden states stacked as a `len × hidden_size` matrix.
    pub fn outputs(&self) -> Array2<f64> {
        self.outputs_from(0)
    }

    /// Hidden states from step `start` onwards, stacked row-wise.
    pub(crate) fn outputs_from(&self, start: usize) -> Array2<f64> {
        let steps = &self.hidden_states[start..];
        let mut outputs = Array2::zeros((steps.len(), self.hidden_size()));
        for (mut row, hidden) in outputs.axis_iter_mut(Axis(0)).zip(steps) {
            row.assign(&hidden.column(0));
        }
        outputs
    }
}
