//! Gradient norm clipping.

use ndarray::{Array, Dimension};

/// Euclidean (Frobenius) norm of all entries of `tensor`.
pub fn l2_norm<D: Dimension>(tensor: &Array<f64, D>) -> f64 {
    tensor.iter().map(|value| value * value).sum::<f64>().sqrt()
}

/// Scale `gradient` in place so that its norm does not exceed `threshold`.
///
/// Tensors whose norm is already within the threshold are left untouched.
/// Returns the norm measured before clipping.
///
/// # Example
///
/// ```
/// use ndarray::arr2;
/// use rust_rnn_cell::utils::clip_gradient_norm;
///
/// let mut grad = arr2(&[[3.0, 4.0]]);
/// let norm = clip_gradient_norm(&mut grad, 1.0);
/// assert_eq!(norm, 5.0);
/// assert!((grad[[0, 0]] - 0.6).abs() < 1e-12);
/// assert!((grad[[0, 1]] - 0.8).abs() < 1e-12);
/// ```
pub fn clip_gradient_norm<D: Dimension>(gradient: &mut Array<f64, D>, threshold: f64) -> f64 {
    let norm = l2_norm(gradient);
    if norm > threshold {
        let scale = threshold / norm;
        gradient.mapv_inplace(|value| value * scale);
    }
    norm
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Array2};

    #[test]
    fn test_norm_of_zeros() {
        let zeros = Array2::<f64>::zeros((3, 3));
        assert_eq!(l2_norm(&zeros), 0.0);
    }

    #[test]
    fn test_clip_under_threshold_is_noop() {
        let mut grad = arr1(&[0.5, -0.5, 1.0]);
        let original = grad.clone();
        clip_gradient_norm(&mut grad, 5.0);
        assert_eq!(grad, original);
    }

    #[test]
    fn test_clip_at_threshold_is_noop() {
        let mut grad = arr2(&[[3.0], [4.0]]);
        let original = grad.clone();
        let norm = clip_gradient_norm(&mut grad, 5.0);
        assert_eq!(norm, 5.0);
        assert_eq!(grad, original);
    }

    #[test]
    fn test_clip_over_threshold_preserves_direction() {
        let mut grad = arr2(&[[30.0, 0.0], [0.0, -40.0]]);
        let norm = clip_gradient_norm(&mut grad, 5.0);

        assert_eq!(norm, 50.0);
        assert!((l2_norm(&grad) - 5.0).abs() < 1e-12);
        assert!((grad[[0, 0]] - 3.0).abs() < 1e-12);
        assert!((grad[[1, 1]] + 4.0).abs() < 1e-12);
        assert_eq!(grad[[0, 1]], 0.0);
    }
}
