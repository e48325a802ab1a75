//! Handle and tolerance types shared across the strut crates.

use std::fmt;

/// Tolerance for floating-point comparisons.
///
/// This value is shared by the matrix engine, the constraint containment
/// checks, and the solver's change detection. Using a single constant keeps
/// degenerate cases (a coefficient that one layer considers zero and another
/// does not) from being classified inconsistently.
pub const TOLERANCE: f64 = 1e-6;

/// Near-zero check for floating point values.
pub fn near_zero(value: f64) -> bool {
    value.abs() <= TOLERANCE
}

/// Equality within [`TOLERANCE`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    near_zero(a - b)
}

/// Handle to a variable owned by a `Solver`.
///
/// Handles are plain indices into the owning solver's variable arena and are
/// only meaningful for the solver that created them. Two handles compare
/// equal iff they name the same variable; comparing the variables' *values*
/// is done explicitly through the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(usize);

impl VariableId {
    /// Create a handle from a raw arena index. Intended for the solver, not
    /// for callers; a fabricated handle is at best rejected and at worst
    /// names a different variable.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Column index of this variable in the augmented matrix.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Handle to a constraint owned by a `Solver`.
///
/// Unlike variables, constraints can be removed; ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(u64);

impl ConstraintId {
    /// Create a handle from a raw id. Intended for the solver side only.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}
