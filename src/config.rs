//! Configuration structures for building and training a cell
//!
//! This module parses cell dimensions and update-rule settings from JSON files.

use serde::Deserialize;
use std::error::Error;
use std::fs;

use crate::cells::{
    RecurrentCell, DEFAULT_HIDDEN_SIZE, DEFAULT_LEARNING_RATE, GRADIENT_CLIP_THRESHOLD,
};
use crate::error::CellError;
use crate::optimizers::{Adam, Optimizer, Sgd};

const VALID_OPTIMIZERS: [&str; 2] = ["sgd", "adam"];

/// Configuration for a recurrent cell and its update rule.
///
/// Only `input_size` is required. Optional fields:
///
/// - **hidden_size**: number of hidden units (default 100)
/// - **learning_rate**: step size of the update rule (default 0.001)
/// - **seed**: fixed seed for weight initialization (random if absent)
/// - **optimizer**: "sgd" (default) or "adam"
/// - **beta1**, **beta2**, **epsilon**: Adam hyperparameters (defaults 0.9, 0.999, 1e-8)
/// - **clip_threshold**: gradient norm limit (default 5.0)
///
/// # Example
///
/// ```json
/// {
///   "input_size": 8,
///   "hidden_size": 32,
///   "learning_rate": 0.005,
///   "optimizer": "adam",
///   "seed": 42
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CellConfig {
    /// Width of each input sample
    pub input_size: usize,

    /// Number of hidden units
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,

    /// Learning rate for the update rule
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Seed for reproducible initialization
    pub seed: Option<u64>,

    /// Update rule: "sgd" or "adam"
    pub optimizer: Option<String>,

    /// Exponential decay rate for Adam's first moment
    pub beta1: Option<f64>,

    /// Exponential decay rate for Adam's second moment
    pub beta2: Option<f64>,

    /// Adam's numerical stability constant
    pub epsilon: Option<f64>,

    /// Gradient norm limit used when clipping
    #[serde(default = "default_clip_threshold")]
    pub clip_threshold: f64,
}

fn default_hidden_size() -> usize {
    DEFAULT_HIDDEN_SIZE
}

fn default_learning_rate() -> f64 {
    DEFAULT_LEARNING_RATE
}

fn default_clip_threshold() -> f64 {
    GRADIENT_CLIP_THRESHOLD
}

impl CellConfig {
    /// Configuration with default hidden size and update rule.
    pub fn new(input_size: usize) -> Self {
        Self {
            input_size,
            hidden_size: DEFAULT_HIDDEN_SIZE,
            learning_rate: DEFAULT_LEARNING_RATE,
            seed: None,
            optimizer: None,
            beta1: None,
            beta2: None,
            epsilon: None,
            clip_threshold: GRADIENT_CLIP_THRESHOLD,
        }
    }

    /// Build a cell with the configured dimensions, seeded if `seed` is set.
    pub fn build_cell(&self) -> Result<RecurrentCell, CellError> {
        match self.seed {
            Some(seed) => RecurrentCell::seeded(self.input_size, self.hidden_size, seed),
            None => RecurrentCell::new(self.input_size, self.hidden_size),
        }
    }

    /// Build the configured update rule.
    pub fn build_optimizer(&self) -> Box<dyn Optimizer> {
        match self.optimizer.as_deref() {
            Some("adam") => Box::new(Adam::new(
                self.learning_rate,
                self.beta1.unwrap_or(0.9),
                self.beta2.unwrap_or(0.999),
                self.epsilon.unwrap_or(1e-8),
            )),
            _ => Box::new(Sgd::new(self.learning_rate)),
        }
    }
}

/// Loads a cell configuration from a JSON file.
///
/// Reads the file at `path` and deserializes its JSON contents into a `CellConfig`.
///
/// # Returns
///
/// `Ok(CellConfig)` on success, or an error if the file cannot be read, the JSON
/// is invalid, or a value is out of range.
///
/// # Examples
///
/// ```no_run
/// use rust_rnn_cell::config::load_config;
///
/// let cfg = load_config("config/rnn_sgd.json").unwrap();
/// assert_eq!(cfg.input_size, 1);
/// ```
pub fn load_config(path: &str) -> Result<CellConfig, Box<dyn Error>> {
    let contents = fs::read_to_string(path)?;
    let config: CellConfig = serde_json::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

fn invalid(message: impl Into<String>) -> Box<dyn Error> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message.into(),
    ))
}

fn validate_config(config: &CellConfig) -> Result<(), Box<dyn Error>> {
    if config.input_size == 0 {
        return Err(invalid("input_size must be positive"));
    }

    if config.hidden_size == 0 {
        return Err(invalid("hidden_size must be positive"));
    }

    if config.learning_rate.is_nan() || config.learning_rate < 0.0 {
        return Err(invalid("learning_rate must be non-negative"));
    }

    if config.clip_threshold.is_nan() || config.clip_threshold <= 0.0 {
        return Err(invalid("clip_threshold must be positive"));
    }

    if let Some(ref optimizer) = config.optimizer {
        if !VALID_OPTIMIZERS.contains(&optimizer.as_str()) {
            return Err(invalid(format!(
                "Invalid optimizer '{}'. Must be one of: {}",
                optimizer,
                VALID_OPTIMIZERS.join(", ")
            )));
        }
    }

    for (name, beta) in [("beta1", config.beta1), ("beta2", config.beta2)] {
        if let Some(beta) = beta {
            if !(0.0..1.0).contains(&beta) {
                return Err(invalid(format!("{} must be in [0, 1)", name)));
            }
        }
    }

    if let Some(epsilon) = config.epsilon {
        if epsilon.is_nan() || epsilon <= 0.0 {
            return Err(invalid("epsilon must be positive"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let config: CellConfig = serde_json::from_str(r#"{ "input_size": 4 }"#).unwrap();
        assert_eq!(config.hidden_size, 100);
        assert_eq!(config.learning_rate, 0.001);
        assert_eq!(config.clip_threshold, 5.0);
        assert!(config.seed.is_none());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_new_matches_json_defaults() {
        let config = CellConfig::new(4);
        assert_eq!(config.hidden_size, DEFAULT_HIDDEN_SIZE);
        assert_eq!(config.learning_rate, DEFAULT_LEARNING_RATE);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_zero_hidden_size() {
        let mut config = CellConfig::new(4);
        config.hidden_size = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("hidden_size"));
    }

    #[test]
    fn test_rejects_nan_learning_rate() {
        let mut config = CellConfig::new(4);
        config.learning_rate = f64::NAN;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_seeded_build_is_reproducible() {
        let mut config = CellConfig::new(3);
        config.hidden_size = 5;
        config.seed = Some(9);

        let a = config.build_cell().unwrap();
        let b = config.build_cell().unwrap();
        assert_eq!(a.input_to_hidden_weight(), b.input_to_hidden_weight());
    }
}
