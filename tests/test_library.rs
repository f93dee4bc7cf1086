//! Tests for the public API of the rust_rnn_cell library
//!
//! This file covers:
//! - Weight updates: plain gradient descent, closures and Adam
//! - Gradient clipping
//! - Parameter iteration and mutation through handles
//! - Clearing stored states and derivatives

use approx::assert_relative_eq;
use ndarray::{arr2, Array2};
use rust_rnn_cell::cells::{ParamKind, RecurrentCell, GRADIENT_CLIP_THRESHOLD};
use rust_rnn_cell::optimizers::{Adam, Optimizer, Sgd};
use rust_rnn_cell::utils::l2_norm;
use rust_rnn_cell::CellError;

fn trained_once(cell: &mut RecurrentCell, scale: f64) {
    let data = Array2::from_shape_fn((4, cell.input_size()), |(t, j)| 0.25 * (t + j) as f64);
    let trace = cell.forward_propagate(data.view()).unwrap();
    let grads = vec![Array2::from_elem((cell.hidden_size(), 1), scale); 4];
    cell.backward_propagate(trace, &grads).unwrap();
}

fn fill_gradients(cell: &mut RecurrentCell, value: f64) {
    for param in cell.parameters_mut() {
        param.gradient.fill(value);
    }
}

// ============================================================================
// Update Tests
// ============================================================================

mod update_tests {
    use super::*;

    #[test]
    fn test_update_weights_applies_gradient_descent() {
        let mut cell = RecurrentCell::seeded(2, 3, 42).unwrap();
        trained_once(&mut cell, 1.0);

        let before: Vec<(Array2<f64>, Array2<f64>)> = cell
            .parameters()
            .map(|p| (p.weight.clone(), p.gradient.clone()))
            .collect();
        cell.update_weights(0.1);

        for (param, (weight, gradient)) in cell.parameters().zip(&before) {
            let expected = weight - &(gradient * 0.1);
            for (a, e) in param.weight.iter().zip(expected.iter()) {
                assert_relative_eq!(*a, *e, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_update_resets_accumulators_and_input_gradients() {
        let mut cell = RecurrentCell::seeded(2, 3, 42).unwrap();
        trained_once(&mut cell, 1.0);
        assert!(!cell.input_gradients().is_empty());

        cell.update_weights(0.01);

        for param in cell.parameters() {
            assert!(param.gradient.iter().all(|&g| g == 0.0), "{}", param.name());
        }
        assert!(cell.input_gradients().is_empty());
    }

    #[test]
    fn test_update_with_zero_gradients_keeps_weights() {
        let mut cell = RecurrentCell::seeded(3, 2, 1).unwrap();
        let before = cell.clone();
        cell.update_weights(0.5);

        assert_eq!(cell.input_to_hidden_weight(), before.input_to_hidden_weight());
        assert_eq!(cell.hidden_to_hidden_weight(), before.hidden_to_hidden_weight());
        assert_eq!(cell.hidden_bias(), before.hidden_bias());
    }

    #[test]
    fn test_closure_strategy_sees_weight_and_gradient() {
        let mut cell = RecurrentCell::seeded(1, 2, 3).unwrap();
        fill_gradients(&mut cell, 2.0);

        let mut seen = Vec::new();
        let mut rule = |w: &Array2<f64>, g: &Array2<f64>| {
            seen.push(w.dim());
            g * 0.5
        };
        cell.update_weights_with(&mut rule).unwrap();

        assert_eq!(seen, vec![(2, 2), (2, 1), (2, 1)]);
        // Bias started at zero and moved by +0.5 * 2
        assert_eq!(cell.hidden_bias(), &arr2(&[[1.0], [1.0]]));
        assert_eq!(cell.hidden_to_hidden_weight(), &arr2(&[[2.0, 1.0], [1.0, 2.0]]));
    }

    #[test]
    fn test_sgd_strategy_matches_update_weights() {
        let mut a = RecurrentCell::seeded(3, 4, 9).unwrap();
        trained_once(&mut a, 0.3);
        let mut b = a.clone();

        a.update_weights(0.05);
        b.update_weights_with(&mut Sgd::new(0.05)).unwrap();

        for (pa, pb) in a.parameters().zip(b.parameters()) {
            assert_eq!(pa.weight, pb.weight);
        }
    }

    #[test]
    fn test_adam_strategy_keeps_per_parameter_state() {
        let mut cell = RecurrentCell::seeded(2, 3, 5).unwrap();
        let mut adam = Adam::new(0.01, 0.9, 0.999, 1e-8);

        for _ in 0..3 {
            cell.clear_stored_states();
            trained_once(&mut cell, 1.0);
            cell.update_weights_with(&mut adam).unwrap();
        }

        for kind in ParamKind::ALL {
            assert_eq!(adam.steps(kind), 3);
        }
        for param in cell.parameters() {
            assert!(param.weight.iter().all(|w| w.is_finite()));
            assert!(param.gradient.iter().all(|&g| g == 0.0));
        }
    }

    #[test]
    fn test_broadcastable_delta_rejected() {
        let mut cell = RecurrentCell::seeded(2, 3, 5).unwrap();
        fill_gradients(&mut cell, 1.0);
        let before = cell.clone();

        let mut rule = |_w: &Array2<f64>, _g: &Array2<f64>| arr2(&[[1.0]]);
        let err = cell.update_weights_with(&mut rule).unwrap_err();

        assert_eq!(
            err,
            CellError::ParameterShape {
                name: "hiddenToHiddenWeight",
                expected: (3, 3),
                actual: (1, 1)
            }
        );
        assert_eq!(cell.hidden_bias(), before.hidden_bias());
        assert_eq!(cell.hidden_to_hidden_weight(), before.hidden_to_hidden_weight());
    }

    #[test]
    fn test_bad_last_delta_leaves_earlier_parameters_untouched() {
        let mut cell = RecurrentCell::seeded(3, 2, 5).unwrap();
        trained_once(&mut cell, 1.0);
        let before = cell.clone();

        // Only the bias column gets a wrongly shaped delta
        let mut rule = |w: &Array2<f64>, g: &Array2<f64>| {
            if w.ncols() == 1 {
                Array2::zeros((3, 1))
            } else {
                g * -1.0
            }
        };
        let err = cell.update_weights_with(&mut rule).unwrap_err();

        assert_eq!(
            err,
            CellError::ParameterShape {
                name: "hiddenBias",
                expected: (2, 1),
                actual: (3, 1)
            }
        );
        for (param, old) in cell.parameters().zip(before.parameters()) {
            assert_eq!(param.weight, old.weight, "{}", param.name());
            assert_eq!(param.gradient, old.gradient, "{}", param.name());
        }
        assert_eq!(cell.input_gradients().len(), before.input_gradients().len());
    }

    #[test]
    fn test_boxed_strategy() {
        let mut cell = RecurrentCell::seeded(2, 2, 5).unwrap();
        fill_gradients(&mut cell, 1.0);
        let mut optimizer: Box<dyn Optimizer> = Box::new(Sgd::new(1.0));

        cell.update_weights_with(optimizer.as_mut()).unwrap();
        assert_eq!(cell.hidden_bias(), &arr2(&[[-1.0], [-1.0]]));
    }
}

// ============================================================================
// Clipping Tests
// ============================================================================

mod clip_tests {
    use super::*;

    #[test]
    fn test_large_gradients_clipped_to_threshold() {
        let mut cell = RecurrentCell::seeded(4, 6, 11).unwrap();
        fill_gradients(&mut cell, 10.0);
        cell.clip_gradients();

        for param in cell.parameters() {
            let norm = l2_norm(param.gradient);
            assert_relative_eq!(norm, GRADIENT_CLIP_THRESHOLD, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_small_gradients_untouched() {
        let mut cell = RecurrentCell::seeded(4, 6, 11).unwrap();
        fill_gradients(&mut cell, 0.01);
        let before: Vec<Array2<f64>> = cell.parameters().map(|p| p.gradient.clone()).collect();

        cell.clip_gradients();

        for (param, gradient) in cell.parameters().zip(&before) {
            assert_eq!(param.gradient, gradient);
        }
    }

    #[test]
    fn test_each_parameter_clipped_independently() {
        let mut cell = RecurrentCell::seeded(2, 2, 0).unwrap();
        for param in cell.parameters_mut() {
            let value = if param.kind == ParamKind::HiddenBias { 100.0 } else { 0.1 };
            param.gradient.fill(value);
        }
        cell.clip_gradients_to(1.0);

        for param in cell.parameters() {
            let norm = l2_norm(param.gradient);
            if param.kind == ParamKind::HiddenBias {
                assert_relative_eq!(norm, 1.0, epsilon = 1e-12);
            } else {
                assert!(norm < 1.0);
                assert!(param.gradient.iter().all(|&g| g == 0.1));
            }
        }
    }

    #[test]
    fn test_clip_preserves_direction() {
        let mut cell = RecurrentCell::seeded(1, 2, 0).unwrap();
        for param in cell.parameters_mut() {
            if param.kind == ParamKind::HiddenBias {
                param.gradient.assign(&arr2(&[[30.0], [-40.0]]));
            }
        }
        cell.clip_gradients();
        assert_relative_eq!(cell.hidden_bias_gradient()[[0, 0]], 3.0, epsilon = 1e-12);
        assert_relative_eq!(cell.hidden_bias_gradient()[[1, 0]], -4.0, epsilon = 1e-12);
    }
}

// ============================================================================
// Parameter Iteration Tests
// ============================================================================

mod parameter_tests {
    use super::*;

    #[test]
    fn test_parameter_names_and_order() {
        let cell = RecurrentCell::seeded(3, 4, 0).unwrap();
        let names: Vec<&str> = cell.parameters().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec!["hiddenToHiddenWeight", "inputToHiddenWeight", "hiddenBias"]
        );

        let kinds: Vec<ParamKind> = cell.parameters().map(|p| p.kind).collect();
        assert_eq!(kinds, ParamKind::ALL.to_vec());
    }

    #[test]
    fn test_parameter_shapes() {
        let cell = RecurrentCell::seeded(3, 4, 0).unwrap();
        let shapes: Vec<(usize, usize)> = cell.parameters().map(|p| p.weight.dim()).collect();
        assert_eq!(shapes, vec![(4, 4), (4, 3), (4, 1)]);
        for param in cell.parameters() {
            assert_eq!(param.weight.dim(), param.gradient.dim());
        }
    }

    #[test]
    fn test_iteration_is_restartable() {
        let cell = RecurrentCell::seeded(3, 4, 0).unwrap();
        assert_eq!(cell.parameters().count(), 3);
        assert_eq!(cell.parameters().count(), 3);
    }

    #[test]
    fn test_mutation_through_handles_is_live() {
        let mut cell = RecurrentCell::seeded(2, 2, 0).unwrap();
        for param in cell.parameters_mut() {
            param.weight.fill(0.5);
        }
        assert!(cell.hidden_to_hidden_weight().iter().all(|&w| w == 0.5));
        assert!(cell.input_to_hidden_weight().iter().all(|&w| w == 0.5));
        assert!(cell.hidden_bias().iter().all(|&w| w == 0.5));
    }

    #[test]
    fn test_parameter_count() {
        let cell = RecurrentCell::seeded(7, 5, 0).unwrap();
        let total: usize = cell.parameters().map(|p| p.weight.len()).sum();
        assert_eq!(total, cell.parameter_count());
        assert_eq!(total, 25 + 35 + 5);
    }
}

// ============================================================================
// Clearing Tests
// ============================================================================

mod clear_tests {
    use super::*;

    #[test]
    fn test_clear_stored_derivatives() {
        let mut cell = RecurrentCell::seeded(2, 3, 4).unwrap();
        let weights = cell.input_to_hidden_weight().clone();
        trained_once(&mut cell, 1.0);
        let collected = cell.input_gradients().len();

        cell.clear_stored_derivatives();

        for param in cell.parameters() {
            assert!(param.gradient.iter().all(|&g| g == 0.0));
        }
        assert_eq!(cell.input_to_hidden_weight(), &weights);
        assert_eq!(cell.input_gradients().len(), collected);
    }

    #[test]
    fn test_clear_stored_states_keeps_weights_and_accumulators() {
        let mut cell = RecurrentCell::seeded(2, 3, 4).unwrap();
        trained_once(&mut cell, 1.0);
        cell.forward_propagate(arr2(&[[1.0, 1.0]]).view()).unwrap();
        let gradient = cell.input_to_hidden_gradient().clone();

        cell.clear_stored_states();

        assert!(cell.hidden_state().iter().all(|&h| h == 0.0));
        assert!(cell.input_gradients().is_empty());
        assert_eq!(cell.input_to_hidden_gradient(), &gradient);
    }

    #[test]
    fn test_accumulate_then_single_update() {
        let mut cell = RecurrentCell::seeded(2, 3, 4).unwrap();
        trained_once(&mut cell, 1.0);
        let once = cell.hidden_bias_gradient().clone();
        trained_once(&mut cell, 1.0);

        // Backward restores the carried state, so the second pass repeats the first
        for (a, b) in cell.hidden_bias_gradient().iter().zip(once.iter()) {
            assert_relative_eq!(*a, 2.0 * b, epsilon = 1e-12);
        }
        assert_eq!(cell.input_gradients().len(), 8);
    }
}
