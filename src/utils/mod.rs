//! Shared numeric helpers for the recurrent cell
//!
//! This module provides the ReLU activation with its zero mask and the
//! gradient-norm clipping helper used by the cell.

pub mod activations;
pub mod clip;

pub use activations::{relu_inplace, relu_with_mask};
pub use clip::{clip_gradient_norm, l2_norm};
