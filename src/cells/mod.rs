//! Recurrent cell and its forward trace
//!
//! This module provides the ReLU [`RecurrentCell`], the [`ForwardTrace`]
//! that forward propagation returns and backward propagation consumes, and
//! the named parameter handles used to inspect or update the cell's tensors.

pub mod params;
pub mod recurrent;
pub mod trace;

pub use params::{ParamKind, Parameter, ParameterMut};
pub use recurrent::{
    RecurrentCell, DEFAULT_HIDDEN_SIZE, DEFAULT_LEARNING_RATE, GRADIENT_CLIP_THRESHOLD,
};
pub use trace::ForwardTrace;
