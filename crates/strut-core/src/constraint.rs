//! Linear equality constraints.
//!
//! A constraint is an equation of the form `c1·v1 + c2·v2 + ... + cn·vn = s`,
//! where `c1..cn, s` are constants and `v1..vn` are variables. This module
//! holds only the data and the equation arithmetic; registering a constraint
//! with a solver and re-solving on mutation happen in the solver crate.

use std::fmt;

use indexmap::IndexMap;

use crate::types::{near_zero, VariableId, TOLERANCE};

/// A linear equation over solver variables.
///
/// Term insertion order is preserved; it has no effect on the solution but
/// keeps matrix assembly and display output deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraint {
    terms: IndexMap<VariableId, f64>,
    sum: f64,
}

impl Constraint {
    /// An empty constraint, `0 = 0`. Trivially satisfied until terms are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style term setter, for constructing a constraint in one
    /// expression before handing it to the solver.
    pub fn with_term(mut self, var: VariableId, coefficient: f64) -> Self {
        self.set_term(var, coefficient);
        self
    }

    /// Builder-style sum setter.
    pub fn with_sum(mut self, sum: f64) -> Self {
        self.sum = sum;
        self
    }

    /// Set the coefficient for a variable, replacing any existing one.
    pub fn set_term(&mut self, var: VariableId, coefficient: f64) {
        self.terms.insert(var, coefficient);
    }

    /// Accumulate onto the coefficient for a variable.
    ///
    /// If the variable has no term yet, the given coefficient is stored
    /// as-is; otherwise it is added to the existing coefficient.
    pub fn add_term(&mut self, var: VariableId, coefficient: f64) {
        *self.terms.entry(var).or_insert(0.0) += coefficient;
    }

    /// Remove the term for a variable entirely.
    ///
    /// Equivalent to setting the coefficient to zero as far as
    /// [`contains`](Self::contains) is concerned, but also frees the stored
    /// entry. Term order of the remaining entries is preserved.
    pub fn remove_term(&mut self, var: VariableId) {
        self.terms.shift_remove(&var);
    }

    /// The stored coefficient for a variable, or 0.0 if absent.
    pub fn coefficient(&self, var: VariableId) -> f64 {
        self.terms.get(&var).copied().unwrap_or(0.0)
    }

    /// Whether the variable participates in this equation, i.e. has a
    /// coefficient with magnitude above the shared tolerance. A stored
    /// near-zero coefficient counts as "not contained" but is not pruned.
    pub fn contains(&self, var: VariableId) -> bool {
        self.coefficient(var).abs() > TOLERANCE
    }

    /// The value to which the terms must sum.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Set the target sum.
    pub fn set_sum(&mut self, sum: f64) {
        self.sum = sum;
    }

    /// Iterate over the stored terms in insertion order.
    pub fn terms(&self) -> impl Iterator<Item = (VariableId, f64)> + '_ {
        self.terms.iter().map(|(&var, &coeff)| (var, coeff))
    }

    /// Number of stored terms, including near-zero ones.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Evaluate the left-hand side `Σ coefficient·value` against a value
    /// lookup.
    pub fn evaluate(&self, value_of: impl Fn(VariableId) -> f64) -> f64 {
        self.terms
            .iter()
            .map(|(&var, &coeff)| coeff * value_of(var))
            .sum()
    }

    /// Whether the equation holds within tolerance for the given values.
    pub fn is_satisfied(&self, value_of: impl Fn(VariableId) -> f64) -> bool {
        near_zero(self.evaluate(value_of) - self.sum)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            write!(f, "0 = {}", self.sum)
        } else {
            for (i, (&var, &coeff)) in self.terms.iter().enumerate() {
                if i > 0 {
                    write!(f, " + ")?;
                }
                write!(f, "{coeff}{var}")?;
            }
            write!(f, " = {}", self.sum)
        }
    }
}
