//! The solver: variable and constraint bookkeeping around the matrix engine.
//!
//! The solver owns everything. Variables live in an arena and are named by
//! [`VariableId`] handles (insertion order = matrix column order); constraints
//! live in an insertion-ordered map keyed by [`ConstraintId`] (insertion order
//! = matrix row order). All mutation goes through solver methods, which is
//! what lets the auto-solve policy re-solve the whole system on every change.

use std::fmt;

use indexmap::IndexMap;
use strut_core::{approx_eq, Constraint, ConstraintId, SolverError, VariableId};

use crate::matrix::Matrix;

/// Single-slot change-notification hook. Receives only the new value, so a
/// hook cannot re-enter the solver while the notification fan-out is running.
type ChangeHook = Box<dyn FnMut(f64)>;

struct VariableSlot {
    name: String,
    value: f64,
    /// The pinning constraint while this variable is locked.
    lock: Option<ConstraintId>,
    hook: Option<ChangeHook>,
}

/// A live set of variables and the linear constraints between them.
///
/// With auto-solve enabled (the default), every constraint mutation and
/// every [`set_value`](Self::set_value) synchronously re-solves the whole
/// system and pushes the results back into the variables, firing each changed
/// variable's change hook once.
pub struct Solver {
    variables: Vec<VariableSlot>,
    constraints: IndexMap<ConstraintId, Constraint>,
    next_constraint_id: u64,
    next_anonymous: u64,
    auto_solve: bool,
    error_on_over_constrained: bool,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    /// Create an empty solver with auto-solve and the over-constrained
    /// error policy both enabled.
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            constraints: IndexMap::new(),
            next_constraint_id: 0,
            next_anonymous: 0,
            auto_solve: true,
            error_on_over_constrained: true,
        }
    }

    // ----- variables --------------------------------------------------

    /// Add a variable with an initial value of 0.0.
    pub fn add_variable(&mut self, name: impl Into<String>) -> VariableId {
        self.add_variable_with_value(name, 0.0)
    }

    /// Add a variable with the given initial value.
    ///
    /// Note that an unlocked variable's value only survives until the next
    /// solve; pin it with [`lock`](Self::lock) or [`set_value`](Self::set_value)
    /// if it must hold.
    pub fn add_variable_with_value(&mut self, name: impl Into<String>, value: f64) -> VariableId {
        let id = VariableId::new(self.variables.len());
        self.variables.push(VariableSlot {
            name: name.into(),
            value,
            lock: None,
            hook: None,
        });
        id
    }

    /// Add an auto-named variable ("var0", "var1", ...). The counter is
    /// owned by this solver instance.
    pub fn fresh_variable(&mut self) -> VariableId {
        let name = format!("var{}", self.next_anonymous);
        self.next_anonymous += 1;
        self.add_variable(name)
    }

    /// Current value of a variable, or 0.0 for a handle this solver does
    /// not know.
    pub fn value(&self, var: VariableId) -> f64 {
        self.variables.get(var.index()).map_or(0.0, |slot| slot.value)
    }

    /// Human-readable name of a variable.
    pub fn name(&self, var: VariableId) -> Option<&str> {
        self.variables.get(var.index()).map(|slot| slot.name.as_str())
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Iterate over all variable handles in insertion (column) order.
    pub fn variables(&self) -> impl Iterator<Item = VariableId> + '_ {
        (0..self.variables.len()).map(VariableId::new)
    }

    /// Set a variable's value, re-solving so that dependent variables adjust.
    ///
    /// If the new value is within tolerance of the current one this is a
    /// complete no-op: no re-solve, no notification. Otherwise the variable
    /// is pinned to the new value for the duration of the solve (permanently,
    /// if it was already locked), and its own change hook fires after the
    /// solve completes. A failed solve still leaves the new value in place
    /// but skips the notification.
    pub fn set_value(&mut self, var: VariableId, value: f64) -> Result<(), SolverError> {
        let slot = self.slot_mut(var)?;
        if approx_eq(slot.value, value) {
            return Ok(());
        }
        slot.value = value;
        let was_locked = slot.lock.is_some();

        // Re-pin: the old lock (if any) still targets the previous value.
        self.remove_lock(var);
        self.install_lock(var);
        let result = self.auto_resolve();
        if !was_locked {
            self.remove_lock(var);
        }
        result?;
        self.fire_hook(var);
        Ok(())
    }

    /// Pin a variable to its current value with a synthetic constraint
    /// `1·var = value`. Idempotent; all variables start unlocked. The value
    /// can still be moved through [`set_value`](Self::set_value), which
    /// re-pins.
    pub fn lock(&mut self, var: VariableId) -> Result<(), SolverError> {
        self.check_variable(var)?;
        if self.variables[var.index()].lock.is_none() {
            self.install_lock(var);
            self.auto_resolve()?;
        }
        Ok(())
    }

    /// Remove a variable's pinning constraint, letting other constraints
    /// move it again. Idempotent. Does not itself re-solve.
    pub fn unlock(&mut self, var: VariableId) -> Result<(), SolverError> {
        self.check_variable(var)?;
        self.remove_lock(var);
        Ok(())
    }

    pub fn is_locked(&self, var: VariableId) -> bool {
        self.variables
            .get(var.index())
            .is_some_and(|slot| slot.lock.is_some())
    }

    /// Attach a change-notification hook, replacing any previous one.
    ///
    /// The hook fires once with the new value whenever a solve moves the
    /// variable beyond tolerance, after all solved values have been written
    /// back.
    pub fn on_change(
        &mut self,
        var: VariableId,
        hook: impl FnMut(f64) + 'static,
    ) -> Result<(), SolverError> {
        self.slot_mut(var)?.hook = Some(Box::new(hook));
        Ok(())
    }

    /// Detach the variable's change hook, if any.
    pub fn clear_on_change(&mut self, var: VariableId) -> Result<(), SolverError> {
        self.slot_mut(var)?.hook = None;
        Ok(())
    }

    // ----- constraints ------------------------------------------------

    /// Register a constraint, triggering an auto-solve.
    ///
    /// All variables referenced by the constraint's terms must belong to
    /// this solver. If the triggered solve fails the constraint stays
    /// registered; the newest id is then the last of
    /// [`constraint_ids`](Self::constraint_ids).
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<ConstraintId, SolverError> {
        for (var, _) in constraint.terms() {
            self.check_variable(var)?;
        }
        let id = self.register_constraint(constraint);
        self.auto_resolve()?;
        Ok(id)
    }

    /// Look up a registered constraint.
    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(&id)
    }

    /// Iterate over constraint handles in insertion (row) order.
    pub fn constraint_ids(&self) -> impl Iterator<Item = ConstraintId> + '_ {
        self.constraints.keys().copied()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Remove a constraint. Reports `UnknownConstraint` on a stale handle
    /// (e.g. a double remove). Does not itself re-solve; call
    /// [`solve`](Self::solve) for the removal to take effect on values.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<(), SolverError> {
        self.constraints
            .shift_remove(&id)
            .ok_or(SolverError::UnknownConstraint(id))?;
        // If this was some variable's lock, the variable is no longer pinned.
        for slot in &mut self.variables {
            if slot.lock == Some(id) {
                slot.lock = None;
            }
        }
        Ok(())
    }

    /// Set a term coefficient on a constraint, replacing any existing one.
    /// Triggers an auto-solve.
    pub fn set_term(
        &mut self,
        id: ConstraintId,
        var: VariableId,
        coefficient: f64,
    ) -> Result<(), SolverError> {
        self.check_variable(var)?;
        self.constraint_mut(id)?.set_term(var, coefficient);
        self.auto_resolve()
    }

    /// Accumulate onto a term coefficient (creating it at the given value if
    /// absent). Triggers an auto-solve.
    pub fn add_term(
        &mut self,
        id: ConstraintId,
        var: VariableId,
        coefficient: f64,
    ) -> Result<(), SolverError> {
        self.check_variable(var)?;
        self.constraint_mut(id)?.add_term(var, coefficient);
        self.auto_resolve()
    }

    /// Remove a term from a constraint. Triggers an auto-solve.
    pub fn remove_term(&mut self, id: ConstraintId, var: VariableId) -> Result<(), SolverError> {
        self.check_variable(var)?;
        self.constraint_mut(id)?.remove_term(var);
        self.auto_resolve()
    }

    /// Set a constraint's target sum. Triggers an auto-solve.
    pub fn set_sum(&mut self, id: ConstraintId, sum: f64) -> Result<(), SolverError> {
        self.constraint_mut(id)?.set_sum(sum);
        self.auto_resolve()
    }

    // ----- solving ----------------------------------------------------

    /// Solve the current system and write the results into the variables.
    ///
    /// Builds the augmented matrix (variables as columns, constraints as
    /// rows, both in insertion order), reduces it, and back-substitutes.
    /// If the system is over-constrained and
    /// [`error_on_over_constrained`](Self::error_on_over_constrained) is set,
    /// returns [`SolverError::OverConstrained`] with all values untouched;
    /// with the policy off, the approximate back-substitution result is
    /// written anyway. Change hooks fire only after every value is written,
    /// once per changed variable, in variable insertion order.
    ///
    /// Calling this manually is only needed while auto-solve is disabled.
    pub fn solve(&mut self) -> Result<(), SolverError> {
        let mut matrix = self.build_matrix();
        matrix.rref();

        if self.error_on_over_constrained && matrix.is_over_constrained() {
            return Err(SolverError::OverConstrained);
        }

        let solution = matrix.solution();
        let mut changed = Vec::new();
        for (index, &value) in solution.iter().enumerate() {
            let slot = &mut self.variables[index];
            if !approx_eq(slot.value, value) {
                changed.push(VariableId::new(index));
            }
            slot.value = value;
        }
        for var in changed {
            self.fire_hook(var);
        }
        Ok(())
    }

    /// Whether the current constraint set is contradictory. Reduces a fresh
    /// matrix; shares no state with [`solve`](Self::solve).
    pub fn is_over_constrained(&self) -> bool {
        let mut matrix = self.build_matrix();
        matrix.rref();
        matrix.is_over_constrained()
    }

    /// Whether the current constraint set leaves variables free (fewer
    /// independent equations than variables).
    pub fn is_under_constrained(&self) -> bool {
        let mut matrix = self.build_matrix();
        matrix.rref();
        matrix.is_under_constrained()
    }

    // ----- policy -----------------------------------------------------

    /// Enable or disable auto-solve. Enabled by default; disable for bulk
    /// edits where per-mutation re-solving would be wasteful, then call
    /// [`solve`](Self::solve) once.
    pub fn set_auto_solve(&mut self, auto_solve: bool) {
        self.auto_solve = auto_solve;
    }

    pub fn auto_solve(&self) -> bool {
        self.auto_solve
    }

    /// Whether [`solve`](Self::solve) fails on an over-constrained system
    /// (the default) instead of writing an approximate result.
    pub fn set_error_on_over_constrained(&mut self, error: bool) {
        self.error_on_over_constrained = error;
    }

    pub fn error_on_over_constrained(&self) -> bool {
        self.error_on_over_constrained
    }

    // ----- internals --------------------------------------------------

    fn check_variable(&self, var: VariableId) -> Result<(), SolverError> {
        if var.index() < self.variables.len() {
            Ok(())
        } else {
            Err(SolverError::UnknownVariable(var))
        }
    }

    fn slot_mut(&mut self, var: VariableId) -> Result<&mut VariableSlot, SolverError> {
        self.variables
            .get_mut(var.index())
            .ok_or(SolverError::UnknownVariable(var))
    }

    fn constraint_mut(&mut self, id: ConstraintId) -> Result<&mut Constraint, SolverError> {
        self.constraints
            .get_mut(&id)
            .ok_or(SolverError::UnknownConstraint(id))
    }

    fn register_constraint(&mut self, constraint: Constraint) -> ConstraintId {
        let id = ConstraintId::new(self.next_constraint_id);
        self.next_constraint_id += 1;
        self.constraints.insert(id, constraint);
        id
    }

    fn auto_resolve(&mut self) -> Result<(), SolverError> {
        if self.auto_solve {
            self.solve()
        } else {
            Ok(())
        }
    }

    /// Create the pinning constraint for a variable's current value. No-op
    /// if already locked; does not solve.
    fn install_lock(&mut self, var: VariableId) {
        let slot = &self.variables[var.index()];
        if slot.lock.is_none() {
            let pin = Constraint::new().with_term(var, 1.0).with_sum(slot.value);
            let id = self.register_constraint(pin);
            self.variables[var.index()].lock = Some(id);
        }
    }

    /// Remove a variable's pinning constraint, if present. Does not solve.
    fn remove_lock(&mut self, var: VariableId) {
        if let Some(id) = self.variables[var.index()].lock.take() {
            self.constraints.shift_remove(&id);
        }
    }

    /// Invoke a variable's change hook with its current value. The hook is
    /// taken out of the slot for the duration of the call.
    fn fire_hook(&mut self, var: VariableId) {
        let value = self.variables[var.index()].value;
        if let Some(mut hook) = self.variables[var.index()].hook.take() {
            hook(value);
            self.variables[var.index()].hook = Some(hook);
        }
    }

    /// Assemble the augmented matrix: one column per variable plus the sum
    /// column, one row per constraint.
    fn build_matrix(&self) -> Matrix {
        let width = self.variables.len() + 1;
        let rows = self
            .constraints
            .values()
            .map(|constraint| {
                let mut row = vec![0.0; width];
                for (var, coefficient) in constraint.terms() {
                    row[var.index()] = coefficient;
                }
                row[width - 1] = constraint.sum();
                row
            })
            .collect();
        Matrix::from_rows(width, rows)
    }
}

// Hand-written because the change hooks are not Debug.
impl fmt::Debug for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("variables", &VariableDebug(&self.variables))
            .field("constraints", &self.constraints)
            .field("auto_solve", &self.auto_solve)
            .field("error_on_over_constrained", &self.error_on_over_constrained)
            .finish()
    }
}

struct VariableDebug<'a>(&'a [VariableSlot]);

impl fmt::Debug for VariableDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.iter().map(|slot| (&slot.name, slot.value)))
            .finish()
    }
}
