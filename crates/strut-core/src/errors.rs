//! Error types for the strut solver.

use crate::types::{ConstraintId, VariableId};
use thiserror::Error;

/// Errors reported by the solver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// The constraint set is contradictory: after reduction the system
    /// contains a row of the form `0 = nonzero`, so no exact solution
    /// exists. Only raised while the over-constrained-is-fatal policy is
    /// enabled; with the policy disabled, callers poll
    /// `Solver::is_over_constrained` instead.
    #[error("solver is over-constrained and no solutions exist")]
    OverConstrained,

    /// The constraint handle is not (or no longer) registered with this
    /// solver, e.g. removing a constraint twice, or mutating one after
    /// removal.
    #[error("unknown constraint {0}")]
    UnknownConstraint(ConstraintId),

    /// The variable handle does not belong to this solver.
    #[error("unknown variable {0}")]
    UnknownVariable(VariableId),
}
