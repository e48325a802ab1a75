//! Live linear-constraint solving.
//!
//! A [`Solver`] owns a set of numeric variables and a set of linear
//! equations relating them, and keeps every variable consistent with the
//! active constraints whenever either side changes. It is meant to be
//! embedded behind higher-level features (UI layout, procedural parameter
//! binding) that want "edit one value, everything dependent updates".
//!
//! ```
//! use strut_solver::{Constraint, Solver};
//!
//! let mut solver = Solver::new();
//! let v1 = solver.add_variable("v1");
//! let v2 = solver.add_variable("v2");
//!
//! // v1 + v2 = 6 and 2·v1 + v2 = 8
//! solver.add_constraint(
//!     Constraint::new().with_term(v1, 1.0).with_term(v2, 1.0).with_sum(6.0),
//! )?;
//! solver.add_constraint(
//!     Constraint::new().with_term(v1, 2.0).with_term(v2, 1.0).with_sum(8.0),
//! )?;
//!
//! assert!((solver.value(v1) - 2.0).abs() < 1e-6);
//! assert!((solver.value(v2) - 4.0).abs() < 1e-6);
//! # Ok::<(), strut_solver::SolverError>(())
//! ```
//!
//! Only exact linear equality systems are handled: no inequalities, no
//! soft-constraint strengths, no objective function. Over-constrained
//! (contradictory) systems are detected and reported rather than answered
//! approximately, unless that policy is switched off.

mod matrix;
mod solver;

pub use solver::Solver;
pub use strut_core::{
    approx_eq, near_zero, Constraint, ConstraintId, SolverError, VariableId, TOLERANCE,
};
