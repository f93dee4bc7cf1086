//! Named handles onto the cell's trainable tensors.

use ndarray::Array2;

/// Identifies one of the three trainable tensors of a
/// [`RecurrentCell`](super::RecurrentCell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Recurrent weight, `hidden_size × hidden_size`.
    HiddenToHiddenWeight,
    /// Input projection, `hidden_size × input_size`.
    InputToHiddenWeight,
    /// Hidden bias column, `hidden_size × 1`.
    HiddenBias,
}

impl ParamKind {
    /// All parameters in iteration order.
    pub const ALL: [ParamKind; 3] = [
        ParamKind::HiddenToHiddenWeight,
        ParamKind::InputToHiddenWeight,
        ParamKind::HiddenBias,
    ];

    /// Name the parameter is reported under.
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKind::HiddenToHiddenWeight => "hiddenToHiddenWeight",
            ParamKind::InputToHiddenWeight => "inputToHiddenWeight",
            ParamKind::HiddenBias => "hiddenBias",
        }
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of a weight and its gradient accumulator.
#[derive(Debug, Clone, Copy)]
pub struct Parameter<'a> {
    pub kind: ParamKind,
    pub weight: &'a Array2<f64>,
    pub gradient: &'a Array2<f64>,
}

impl Parameter<'_> {
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }
}

/// Mutable handle onto a weight and its gradient accumulator.
///
/// Writes through either field go straight to the cell's live tensors.
#[derive(Debug)]
pub struct ParameterMut<'a> {
    pub kind: ParamKind,
    pub weight: &'a mut Array2<f64>,
    pub gradient: &'a mut Array2<f64>,
}

impl ParameterMut<'_> {
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }
}
