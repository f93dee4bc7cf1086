//! Rust Recurrent Cell Library
//!
//! A single recurrent layer with a ReLU nonlinearity, trained by manual
//! backpropagation through time.
//!
//! # Modules
//!
//! - `cells`: `RecurrentCell`, the `ForwardTrace` it records, and parameter handles
//! - `optimizers`: Optimizer trait (update rule) and implementations (SGD, Adam)
//! - `utils`: ReLU with zero mask and gradient-norm clipping
//! - `config`: JSON configuration for building a cell and its update rule
//! - `error`: `CellError`
//!
//! # Example
//!
//! ```
//! use ndarray::{arr2, Array2};
//! use rust_rnn_cell::RecurrentCell;
//!
//! let mut cell = RecurrentCell::seeded(2, 3, 42).unwrap();
//! let trace = cell.forward_propagate(arr2(&[[1.0, 0.0], [0.0, 1.0]]).view()).unwrap();
//! let outputs = trace.outputs();
//! assert_eq!(outputs.dim(), (2, 3));
//!
//! let grads: Vec<Array2<f64>> = outputs
//!     .rows()
//!     .into_iter()
//!     .map(|row| row.to_owned().insert_axis(ndarray::Axis(1)))
//!     .collect();
//! cell.backward_propagate(trace, &grads).unwrap();
//! cell.clip_gradients();
//! cell.update_weights(0.001);
//! ```

pub mod cells;
pub mod config;
pub mod error;
pub mod optimizers;
pub mod utils;

pub use cells::{ForwardTrace, ParamKind, RecurrentCell};
pub use error::CellError;
