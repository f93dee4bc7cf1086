//! Activation functions for the recurrent cell
//!
//! The cell uses a rectified linear unit. Backward propagation needs to know
//! which entries the ReLU zeroed, so the in-place variant also reports a mask.

use ndarray::{Array, Dimension};

/// ReLU activation applied in-place.
///
/// Sets all negative values to 0.0, keeps positive values unchanged.
pub fn relu_inplace<D: Dimension>(data: &mut Array<f64, D>) {
    data.mapv_inplace(|value| if value < 0.0 { 0.0 } else { value });
}

/// ReLU applied in-place, returning a mask of entries that are exactly zero afterwards.
///
/// The mask is taken on the activated values, so a pre-activation of exactly
/// 0.0 is flagged the same way as a clamped negative one. Backward propagation
/// treats both as having zero derivative.
///
/// # Example
///
/// ```
/// use ndarray::arr2;
/// use rust_rnn_cell::utils::relu_with_mask;
///
/// let mut z = arr2(&[[-1.0], [0.0], [2.0]]);
/// let mask = relu_with_mask(&mut z);
/// assert_eq!(z, arr2(&[[0.0], [0.0], [2.0]]));
/// assert_eq!(mask, arr2(&[[true], [true], [false]]));
/// ```
pub fn relu_with_mask<D: Dimension>(data: &mut Array<f64, D>) -> Array<bool, D> {
    relu_inplace(data);
    data.mapv(|value| value == 0.0)
}
