//! The solver context and its public interface.
//!
//! A [`Solver`] owns every variable, constraint and tableau row. Callers
//! hold [`Variable`] and [`Constraint`] handles and pass them back to the
//! solver for every operation.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::constraint::{Constraint, ConstraintData, Relation, Strength};
use crate::error::SolverError;
use crate::options::SolverOptions;
use crate::pool::Registry;
use crate::row::{near_zero, Num, Row};
use crate::symbol::{Symbol, SymbolCounter, SymbolKind};
use crate::table::SymbolTable;
use crate::variable::{Variable, VariableData};

static NEXT_SOLVER_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a solver, carried by handles to detect cross-solver use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SolverId(u32);

impl SolverId {
    fn fresh() -> Self {
        Self(NEXT_SOLVER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The Cassowary constraint solver.
#[derive(Debug)]
pub struct Solver {
    id: SolverId,
    /// The objective function row
    pub(crate) objective: Row,
    pub(crate) vars: Registry<VariableData>,
    pub(crate) constraints: Registry<ConstraintData>,
    /// The tableau rows, keyed by their basic symbol
    pub(crate) rows: SymbolTable<Row>,
    pub(crate) symbols: SymbolCounter,
    constraint_counter: u64,
    pub(crate) auto_update: bool,
    /// Rows with a negative constant, pending dual optimization
    pub(crate) infeasible_rows: Vec<Symbol>,
    /// Variables whose cached value is stale
    pub(crate) dirty_vars: Vec<Symbol>,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    /// Create a new solver with default options.
    pub fn new() -> Self {
        Self::with_options(SolverOptions::default())
    }

    pub fn with_options(options: SolverOptions) -> Self {
        Self {
            id: SolverId::fresh(),
            objective: Row::new(0.0),
            vars: Registry::new(options.pool_page_slots),
            constraints: Registry::new(options.pool_page_slots),
            rows: SymbolTable::new(),
            symbols: SymbolCounter::default(),
            constraint_counter: 0,
            auto_update: options.auto_update,
            infeasible_rows: Vec::new(),
            dirty_vars: Vec::new(),
        }
    }

    pub fn auto_update(&self) -> bool {
        self.auto_update
    }

    pub fn set_auto_update(&mut self, auto_update: bool) {
        self.auto_update = auto_update;
    }

    /// Copy solved values into every variable touched since the last update.
    pub fn update_vars(&mut self) {
        while let Some(sym) = self.dirty_vars.pop() {
            let value = self.rows.get(sym).map_or(0.0, |row| row.constant);
            if let Some(var) = self.vars.get_mut(sym) {
                var.dirty = false;
                var.value = value;
            }
        }
    }

    /// Drop every edit, and optionally detach every constraint.
    ///
    /// Detached constraints stay registered and can be added again.
    pub fn reset(&mut self, clear_constraints: bool) {
        if !self.auto_update {
            self.update_vars();
        }
        let mut edits = Vec::new();
        self.vars.for_each_mut(|var| {
            if let Some(edit) = var.edit.take() {
                edits.push(edit);
            }
        });
        for edit in edits {
            self.delete_constraint_by_key(edit);
        }
        self.update_vars();
        debug_assert!(self.infeasible_rows.is_empty());
        debug_assert!(self.dirty_vars.is_empty());
        tracing::debug!(
            component = "solver",
            operation = "reset",
            status = "success",
            clear_constraints,
            objective = self.objective.constant,
            "Reset solver"
        );
        if !clear_constraints {
            return;
        }
        self.objective.reset();
        self.constraints.for_each_mut(|cons| {
            cons.marker = Symbol::NULL;
            cons.other = Symbol::NULL;
        });
        self.rows.clear();
        self.infeasible_rows.clear();
    }

    // Variables

    pub fn new_variable(&mut self) -> Variable {
        let sym = self.symbols.next(SymbolKind::External);
        self.vars.insert(sym, VariableData::new());
        Variable { sym, owner: self.id }
    }

    /// Take an additional reference to a variable.
    pub fn use_variable(&mut self, var: Variable) -> Result<(), SolverError> {
        self.check_owner(var.owner)?;
        let data = self.vars.get_mut(var.sym).ok_or(SolverError::UnknownVariable)?;
        data.refcount += 1;
        Ok(())
    }

    /// Release the caller's reference to a variable.
    pub fn delete_variable(&mut self, var: Variable) {
        if var.owner == self.id {
            self.release_variable(var.sym);
        }
    }

    /// Last solved value, or zero for an unknown handle.
    pub fn value(&self, var: Variable) -> Num {
        self.var_data(var).map_or(0.0, |data| data.value)
    }

    /// Target last passed to `suggest`.
    pub fn edit_value(&self, var: Variable) -> Num {
        self.var_data(var).map_or(0.0, |data| data.edit_value)
    }

    pub fn has_edit(&self, var: Variable) -> bool {
        self.var_data(var).is_ok_and(|data| data.edit.is_some())
    }

    pub fn variable_count(&self) -> usize {
        self.vars.len()
    }

    // Constraints

    /// Create an empty constraint. A zero strength means REQUIRED.
    pub fn new_constraint(&mut self, strength: impl Into<Strength>) -> Constraint {
        self.constraint_counter += 1;
        let key = Symbol::new(self.constraint_counter, SymbolKind::External);
        let strength = strength.into().or_required();
        self.constraints.insert(key, ConstraintData::new(strength));
        Constraint { key, owner: self.id }
    }

    /// Copy a constraint's expression and relation into a new, detached
    /// constraint. A zero strength keeps the source strength.
    pub fn clone_constraint(
        &mut self,
        other: Constraint,
        strength: impl Into<Strength>,
    ) -> Result<Constraint, SolverError> {
        let source = self.cons_data(other)?;
        let strength = strength.into();
        let strength = if near_zero(strength.value()) {
            source.strength
        } else {
            strength
        };
        let relation = source.relation;
        let cons = self.new_constraint(strength);
        self.merge_constraint(cons, other, 1.0)?;
        if let Some(data) = self.constraints.get_mut(cons.key) {
            data.relation = relation;
        }
        Ok(cons)
    }

    /// Add `multiplier * other` to a detached constraint's expression.
    pub fn merge_constraint(
        &mut self,
        cons: Constraint,
        other: Constraint,
        multiplier: Num,
    ) -> Result<(), SolverError> {
        let source = self.cons_data(other)?;
        let constant = source.expression.constant;
        let terms: Vec<(Symbol, Num)> = source.expression.terms().collect();
        let target = self.detached_mut(cons)?;
        let multiplier = multiplier * target.side_sign();
        target.expression.constant += constant * multiplier;
        let mut changes = Vec::with_capacity(terms.len());
        for (sym, coeff) in terms {
            let had = target.expression.contains(sym);
            target.expression.add_term(sym, coeff * multiplier);
            changes.push((sym, had, target.expression.contains(sym)));
        }
        for (sym, had, has) in changes {
            self.track_term(sym, had, has);
        }
        Ok(())
    }

    /// Add `coefficient * var` to the side of the relation being built.
    pub fn add_term(
        &mut self,
        cons: Constraint,
        var: Variable,
        coefficient: Num,
    ) -> Result<(), SolverError> {
        self.var_data(var)?;
        let data = self.detached_mut(cons)?;
        let coefficient = coefficient * data.side_sign();
        let had = data.expression.contains(var.sym);
        data.expression.add_term(var.sym, coefficient);
        let has = data.expression.contains(var.sym);
        self.track_term(var.sym, had, has);
        Ok(())
    }

    /// An expression holds one reference per variable it mentions.
    fn track_term(&mut self, sym: Symbol, had: bool, has: bool) {
        match (had, has) {
            (false, true) => {
                if let Some(var) = self.vars.get_mut(sym) {
                    var.refcount += 1;
                }
            }
            (true, false) => self.release_variable(sym),
            _ => {}
        }
    }

    pub fn add_constant(&mut self, cons: Constraint, constant: Num) -> Result<(), SolverError> {
        let data = self.detached_mut(cons)?;
        let sign = data.side_sign();
        data.expression.constant += constant * sign;
        Ok(())
    }

    /// Set the relation. Everything added so far becomes the left-hand side.
    pub fn set_relation(
        &mut self,
        cons: Constraint,
        relation: Relation,
    ) -> Result<(), SolverError> {
        let data = self.detached_mut(cons)?;
        if data.relation.is_some() {
            return Err(SolverError::RelationAlreadySet);
        }
        if relation != Relation::GreaterOrEqual {
            data.expression.multiply(-1.0);
        }
        data.relation = Some(relation);
        Ok(())
    }

    /// Change a constraint's strength.
    ///
    /// Moving between soft strengths adjusts the objective in place. Moving
    /// to or from REQUIRED removes the constraint if needed and adds it back.
    pub fn set_strength(
        &mut self,
        cons: Constraint,
        strength: impl Into<Strength>,
    ) -> Result<(), SolverError> {
        self.cons_data(cons)?;
        self.set_strength_by_key(cons.key, strength.into().or_required())
    }

    pub(crate) fn set_strength_by_key(
        &mut self,
        key: Symbol,
        strength: Strength,
    ) -> Result<(), SolverError> {
        let data = self.constraints.get(key).ok_or(SolverError::UnknownConstraint)?;
        let (current, live) = (data.strength, data.is_live());
        let (marker, other) = (data.marker, data.other);
        if current == strength {
            return Ok(());
        }
        if current.is_required() || strength.is_required() {
            if live {
                self.remove_constraint(key);
            }
            if let Some(data) = self.constraints.get_mut(key) {
                data.strength = strength;
            }
            return self.add_constraint(key);
        }
        if live {
            let diff = strength.value() - current.value();
            self.merge_into_objective(marker, diff);
            self.merge_into_objective(other, diff);
            self.optimize_objective();
            if self.auto_update {
                self.update_vars();
            }
        }
        if let Some(data) = self.constraints.get_mut(key) {
            data.strength = strength;
        }
        tracing::debug!(
            component = "solver",
            operation = "set_strength",
            status = "success",
            constraint = key.id(),
            strength = strength.value(),
            "Adjusted constraint strength"
        );
        Ok(())
    }

    /// Insert a constraint into the tableau.
    ///
    /// A rejected constraint leaves the solver as it was.
    pub fn add(&mut self, cons: Constraint) -> Result<(), SolverError> {
        if self.cons_data(cons)?.is_live() {
            return Err(SolverError::ConstraintInSolver);
        }
        self.add_constraint(cons.key)
    }

    /// Take a constraint out of the tableau. It stays registered.
    pub fn remove(&mut self, cons: Constraint) {
        if self.cons_data(cons).is_ok() {
            self.remove_constraint(cons.key);
        }
    }

    /// Remove a constraint and clear its expression and relation.
    pub fn reset_constraint(&mut self, cons: Constraint) {
        if self.cons_data(cons).is_err() {
            return;
        }
        self.remove_constraint(cons.key);
        let Some(data) = self.constraints.get_mut(cons.key) else {
            return;
        };
        data.relation = None;
        let terms: Vec<Symbol> = data.expression.terms().map(|(sym, _)| sym).collect();
        data.expression.reset();
        for sym in terms {
            self.release_variable(sym);
        }
    }

    /// Remove and destroy a constraint, releasing its variables.
    pub fn delete_constraint(&mut self, cons: Constraint) {
        if self.cons_data(cons).is_ok() {
            self.delete_constraint_by_key(cons.key);
        }
    }

    pub fn has_constraint(&self, cons: Constraint) -> bool {
        self.cons_data(cons).is_ok_and(|data| data.is_live())
    }

    pub fn strength(&self, cons: Constraint) -> Option<Strength> {
        self.cons_data(cons).ok().map(|data| data.strength)
    }

    pub fn relation(&self, cons: Constraint) -> Option<Relation> {
        self.cons_data(cons).ok().and_then(|data| data.relation)
    }

    /// Constant of the normalized expression.
    pub fn constraint_constant(&self, cons: Constraint) -> Num {
        self.cons_data(cons).map_or(0.0, |data| data.expression.constant)
    }

    /// Coefficient of `var` in the normalized expression.
    pub fn constraint_coefficient(&self, cons: Constraint, var: Variable) -> Num {
        self.cons_data(cons)
            .map_or(0.0, |data| data.expression.coefficient(var.sym))
    }

    pub fn constraint_term_count(&self, cons: Constraint) -> usize {
        self.cons_data(cons)
            .map_or(0, |data| data.expression.term_count())
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Number of rows in the tableau.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    // Edits

    /// Make `var` editable through `suggest`. Strength is capped at STRONG;
    /// an existing edit only has its strength changed.
    pub fn add_edit(
        &mut self,
        var: Variable,
        strength: impl Into<Strength>,
    ) -> Result<(), SolverError> {
        let data = self.var_data(var)?;
        let (edit, value) = (data.edit, data.value);
        let mut strength = strength.into().or_required();
        if strength >= Strength::STRONG {
            strength = Strength::STRONG;
        }
        if let Some(edit) = edit {
            return self.set_strength_by_key(edit, strength);
        }

        let cons = self.new_constraint(strength);
        self.set_relation(cons, Relation::Equal)?;
        self.add_term(cons, var, 1.0)?;
        self.add_constant(cons, -value)?;
        if let Err(err) = self.add(cons) {
            self.delete_constraint_by_key(cons.key);
            return Err(err);
        }
        if let Some(data) = self.vars.get_mut(var.sym) {
            data.edit = Some(cons.key);
            data.edit_value = value;
        }
        tracing::debug!(
            component = "solver",
            operation = "add_edit",
            status = "success",
            variable = var.id(),
            strength = strength.value(),
            "Added edit variable"
        );
        Ok(())
    }

    /// Move an edit variable toward `value`, creating a MEDIUM edit first if
    /// the variable has none.
    pub fn suggest(&mut self, var: Variable, value: Num) {
        let Ok(data) = self.var_data(var) else {
            return;
        };
        if data.edit.is_none() && self.add_edit(var, Strength::MEDIUM).is_err() {
            return;
        }
        let Some(data) = self.vars.get_mut(var.sym) else {
            return;
        };
        let Some(edit) = data.edit else {
            return;
        };
        let delta = value - data.edit_value;
        data.edit_value = value;
        self.delta_edit_constant(delta, edit);
        self.dual_optimize();
        if self.auto_update {
            self.update_vars();
        }
    }

    pub fn delete_edit(&mut self, var: Variable) {
        let Ok(data) = self.var_data(var) else {
            return;
        };
        if data.edit.is_none() {
            return;
        }
        let Some(data) = self.vars.get_mut(var.sym) else {
            return;
        };
        let edit = data.edit.take();
        data.edit_value = 0.0;
        if let Some(edit) = edit {
            self.delete_constraint_by_key(edit);
        }
        tracing::debug!(
            component = "solver",
            operation = "delete_edit",
            status = "success",
            variable = var.id(),
            "Deleted edit variable"
        );
    }

    // Handle plumbing

    fn check_owner(&self, owner: SolverId) -> Result<(), SolverError> {
        if owner == self.id {
            Ok(())
        } else {
            Err(SolverError::ForeignHandle)
        }
    }

    fn var_data(&self, var: Variable) -> Result<&VariableData, SolverError> {
        self.check_owner(var.owner)?;
        self.vars.get(var.sym).ok_or(SolverError::UnknownVariable)
    }

    fn cons_data(&self, cons: Constraint) -> Result<&ConstraintData, SolverError> {
        self.check_owner(cons.owner)?;
        self.constraints
            .get(cons.key)
            .ok_or(SolverError::UnknownConstraint)
    }

    /// Mutable access to a constraint that is not in the tableau.
    fn detached_mut(&mut self, cons: Constraint) -> Result<&mut ConstraintData, SolverError> {
        self.check_owner(cons.owner)?;
        let data = self
            .constraints
            .get_mut(cons.key)
            .ok_or(SolverError::UnknownConstraint)?;
        if data.is_live() {
            return Err(SolverError::ConstraintInSolver);
        }
        Ok(data)
    }

    /// Drop one reference; the last one destroys the variable and its edit.
    pub(crate) fn release_variable(&mut self, sym: Symbol) {
        let Some(data) = self.vars.get_mut(sym) else {
            return;
        };
        data.refcount = data.refcount.saturating_sub(1);
        if data.refcount > 0 {
            return;
        }
        let edit = data.edit.take();
        self.vars.remove(sym);
        if let Some(edit) = edit {
            self.delete_constraint_by_key(edit);
        }
    }

    pub(crate) fn delete_constraint_by_key(&mut self, key: Symbol) {
        self.remove_constraint(key);
        let Some(data) = self.constraints.remove(key) else {
            return;
        };
        for (sym, _) in data.expression.terms() {
            self.release_variable(sym);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Num, b: Num) -> bool {
        (a - b).abs() < 1e-3
    }

    /// `var == value` at the given strength.
    fn fix(solver: &mut Solver, var: Variable, value: Num, strength: Strength) -> Constraint {
        let cons = solver.new_constraint(strength);
        solver.add_term(cons, var, 1.0).unwrap();
        solver.set_relation(cons, Relation::Equal).unwrap();
        solver.add_constant(cons, value).unwrap();
        cons
    }

    #[test]
    fn test_create_variable() {
        let mut solver = Solver::new();
        let v1 = solver.new_variable();
        let v2 = solver.new_variable();
        assert_ne!(v1.id(), v2.id());
        assert_eq!(solver.variable_count(), 2);
        assert_eq!(solver.value(v1), 0.0);
    }

    #[test]
    fn test_simple_equality() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        let cons = fix(&mut solver, x, 100.0, Strength::REQUIRED);
        solver.add(cons).unwrap();
        solver.update_vars();
        assert!(approx_eq(solver.value(x), 100.0));
        assert!(solver.has_constraint(cons));
    }

    #[test]
    fn test_two_variables() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        let y = solver.new_variable();

        let c1 = fix(&mut solver, x, 100.0, Strength::REQUIRED);
        solver.add(c1).unwrap();

        // y == x + 50
        let c2 = solver.new_constraint(Strength::REQUIRED);
        solver.add_term(c2, y, 1.0).unwrap();
        solver.set_relation(c2, Relation::Equal).unwrap();
        solver.add_term(c2, x, 1.0).unwrap();
        solver.add_constant(c2, 50.0).unwrap();
        solver.add(c2).unwrap();

        solver.update_vars();
        assert!(approx_eq(solver.value(x), 100.0));
        assert!(approx_eq(solver.value(y), 150.0));
    }

    #[test]
    fn test_inequality() {
        let mut solver = Solver::new();
        let x = solver.new_variable();

        // x >= 50
        let c1 = solver.new_constraint(Strength::REQUIRED);
        solver.add_term(c1, x, 1.0).unwrap();
        solver.set_relation(c1, Relation::GreaterOrEqual).unwrap();
        solver.add_constant(c1, 50.0).unwrap();
        solver.add(c1).unwrap();

        // x == 10 (weak)
        let c2 = fix(&mut solver, x, 10.0, Strength::WEAK);
        solver.add(c2).unwrap();

        solver.update_vars();
        assert!(approx_eq(solver.value(x), 50.0), "got {}", solver.value(x));
    }

    #[test]
    fn test_less_or_equal() {
        let mut solver = Solver::new();
        let x = solver.new_variable();

        // x <= 30
        let c1 = solver.new_constraint(Strength::REQUIRED);
        solver.add_term(c1, x, 1.0).unwrap();
        solver.set_relation(c1, Relation::LessOrEqual).unwrap();
        solver.add_constant(c1, 30.0).unwrap();
        solver.add(c1).unwrap();

        let c2 = fix(&mut solver, x, 100.0, Strength::STRONG);
        solver.add(c2).unwrap();

        solver.update_vars();
        assert!(approx_eq(solver.value(x), 30.0), "got {}", solver.value(x));
    }

    #[test]
    fn test_strength_ordering() {
        let mut solver = Solver::new();
        let x = solver.new_variable();

        let weak = fix(&mut solver, x, 100.0, Strength::WEAK);
        solver.add(weak).unwrap();
        let strong = fix(&mut solver, x, 50.0, Strength::STRONG);
        solver.add(strong).unwrap();

        solver.update_vars();
        assert!(approx_eq(solver.value(x), 50.0));
    }

    #[test]
    fn test_add_twice_fails() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        let cons = fix(&mut solver, x, 1.0, Strength::REQUIRED);
        solver.add(cons).unwrap();
        assert_eq!(solver.add(cons), Err(SolverError::ConstraintInSolver));
        assert_eq!(
            solver.add_term(cons, x, 1.0),
            Err(SolverError::ConstraintInSolver)
        );
        assert_eq!(
            solver.add_constant(cons, 1.0),
            Err(SolverError::ConstraintInSolver)
        );
    }

    #[test]
    fn test_relation_set_once() {
        let mut solver = Solver::new();
        let cons = solver.new_constraint(Strength::REQUIRED);
        solver.set_relation(cons, Relation::Equal).unwrap();
        assert_eq!(
            solver.set_relation(cons, Relation::LessOrEqual),
            Err(SolverError::RelationAlreadySet)
        );
        assert_eq!(solver.relation(cons), Some(Relation::Equal));
    }

    #[test]
    fn test_foreign_handles() {
        let mut a = Solver::new();
        let mut b = Solver::new();
        let x = a.new_variable();
        let cons = b.new_constraint(Strength::REQUIRED);
        assert_eq!(b.add_term(cons, x, 1.0), Err(SolverError::ForeignHandle));
        assert_eq!(b.use_variable(x), Err(SolverError::ForeignHandle));
        assert_eq!(a.add(cons), Err(SolverError::ForeignHandle));
    }

    #[test]
    fn test_zero_strength_is_required() {
        let mut solver = Solver::new();
        let cons = solver.new_constraint(0.0 as Num);
        assert_eq!(solver.strength(cons), Some(Strength::REQUIRED));
    }

    #[test]
    fn test_refcount_keeps_variable_alive() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        let cons = fix(&mut solver, x, 3.0, Strength::REQUIRED);
        solver.add(cons).unwrap();

        solver.delete_variable(x);
        assert_eq!(solver.variable_count(), 1);
        solver.update_vars();
        assert!(approx_eq(solver.value(x), 3.0));

        solver.delete_constraint(cons);
        assert_eq!(solver.variable_count(), 0);
        assert_eq!(solver.constraint_count(), 0);
        assert_eq!(solver.row_count(), 0);
        assert_eq!(solver.use_variable(x), Err(SolverError::UnknownVariable));
    }

    #[test]
    fn test_cancelled_term_releases_variable() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        let cons = solver.new_constraint(Strength::REQUIRED);
        solver.add_term(cons, x, 1.0).unwrap();
        solver.add_term(cons, x, -1.0).unwrap();
        assert_eq!(solver.constraint_term_count(cons), 0);

        solver.delete_constraint(cons);
        solver.delete_variable(x);
        assert_eq!(solver.variable_count(), 0);
    }

    #[test]
    fn test_repeated_term_holds_one_reference() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        let cons = solver.new_constraint(Strength::REQUIRED);
        solver.add_term(cons, x, 1.0).unwrap();
        solver.add_term(cons, x, 2.0).unwrap();
        assert_eq!(solver.constraint_coefficient(cons, x), 3.0);

        solver.delete_variable(x);
        assert_eq!(solver.variable_count(), 1);
        solver.delete_constraint(cons);
        assert_eq!(solver.variable_count(), 0);
    }

    #[test]
    fn test_merge_cancel_releases_variables() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        let y = solver.new_variable();
        let source = solver.new_constraint(Strength::MEDIUM);
        solver.add_term(source, x, 1.0).unwrap();
        solver.add_term(source, y, 2.0).unwrap();
        solver.set_relation(source, Relation::Equal).unwrap();

        let copy = solver.clone_constraint(source, 0.0 as Num).unwrap();
        solver.merge_constraint(copy, source, -1.0).unwrap();
        assert_eq!(solver.constraint_term_count(copy), 0);

        solver.delete_constraint(source);
        solver.delete_variable(x);
        solver.delete_variable(y);
        assert_eq!(solver.variable_count(), 0);
        solver.delete_constraint(copy);
        assert_eq!(solver.constraint_count(), 0);
    }

    #[test]
    fn test_use_variable() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        solver.use_variable(x).unwrap();
        solver.delete_variable(x);
        assert_eq!(solver.variable_count(), 1);
        solver.delete_variable(x);
        assert_eq!(solver.variable_count(), 0);
    }

    #[test]
    fn test_reset_constraint() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        let cons = fix(&mut solver, x, 7.0, Strength::REQUIRED);
        solver.add(cons).unwrap();
        solver.reset_constraint(cons);

        assert!(!solver.has_constraint(cons));
        assert_eq!(solver.relation(cons), None);
        assert_eq!(solver.constraint_term_count(cons), 0);
        assert_eq!(solver.constraint_constant(cons), 0.0);
        assert_eq!(solver.row_count(), 0);

        // The constraint can be rebuilt and added again.
        solver.add_term(cons, x, 1.0).unwrap();
        solver.set_relation(cons, Relation::Equal).unwrap();
        solver.add_constant(cons, 9.0).unwrap();
        solver.add(cons).unwrap();
        solver.update_vars();
        assert!(approx_eq(solver.value(x), 9.0));
    }

    #[test]
    fn test_set_strength_soft() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        let a = fix(&mut solver, x, 10.0, Strength::WEAK);
        let b = fix(&mut solver, x, 20.0, Strength::MEDIUM);
        solver.add(a).unwrap();
        solver.add(b).unwrap();
        solver.update_vars();
        assert!(approx_eq(solver.value(x), 20.0));

        solver.set_strength(a, Strength::STRONG).unwrap();
        solver.update_vars();
        assert!(approx_eq(solver.value(x), 10.0));
        assert_eq!(solver.strength(a), Some(Strength::STRONG));
    }

    #[test]
    fn test_set_strength_to_required() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        let a = fix(&mut solver, x, 10.0, Strength::WEAK);
        let b = fix(&mut solver, x, 20.0, Strength::STRONG);
        solver.add(a).unwrap();
        solver.add(b).unwrap();

        solver.set_strength(a, Strength::REQUIRED).unwrap();
        assert!(solver.has_constraint(a));
        solver.update_vars();
        assert!(approx_eq(solver.value(x), 10.0));
    }

    #[test]
    fn test_set_strength_to_required_adds_detached() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        let a = fix(&mut solver, x, 7.0, Strength::WEAK);
        assert!(!solver.has_constraint(a));

        solver.set_strength(a, Strength::REQUIRED).unwrap();
        assert!(solver.has_constraint(a));
        assert_eq!(solver.strength(a), Some(Strength::REQUIRED));
        solver.update_vars();
        assert!(approx_eq(solver.value(x), 7.0));
    }

    #[test]
    fn test_set_strength_from_required_adds_detached() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        let a = fix(&mut solver, x, 10.0, Strength::REQUIRED);
        solver.set_strength(a, Strength::WEAK).unwrap();
        assert!(solver.has_constraint(a));
        assert_eq!(solver.strength(a), Some(Strength::WEAK));
    }

    #[test]
    fn test_edit_lifecycle() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        assert!(!solver.has_edit(x));

        solver.add_edit(x, Strength::REQUIRED).unwrap();
        assert!(solver.has_edit(x));

        solver.suggest(x, 42.0);
        solver.update_vars();
        assert!(approx_eq(solver.value(x), 42.0));
        assert_eq!(solver.edit_value(x), 42.0);

        solver.delete_edit(x);
        assert!(!solver.has_edit(x));
        assert_eq!(solver.edit_value(x), 0.0);
        assert_eq!(solver.row_count(), 0);
        assert_eq!(solver.variable_count(), 1);
    }

    #[test]
    fn test_suggest_creates_edit() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        solver.suggest(x, 5.0);
        assert!(solver.has_edit(x));
        solver.suggest(x, 8.0);
        solver.update_vars();
        assert!(approx_eq(solver.value(x), 8.0));
    }

    #[test]
    fn test_auto_update() {
        let mut solver = Solver::with_options(SolverOptions::default().with_auto_update(true));
        assert!(solver.auto_update());
        let x = solver.new_variable();
        let cons = fix(&mut solver, x, 12.0, Strength::REQUIRED);
        solver.add(cons).unwrap();
        assert!(approx_eq(solver.value(x), 12.0));

        solver.remove(cons);
        assert!(approx_eq(solver.value(x), 0.0));
    }

    #[test]
    fn test_reset_keeps_constraints() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        let y = solver.new_variable();
        let cons = fix(&mut solver, y, 4.0, Strength::REQUIRED);
        solver.add(cons).unwrap();
        solver.suggest(x, 3.0);

        solver.reset(false);
        assert!(!solver.has_edit(x));
        assert!(solver.has_constraint(cons));
        assert_eq!(solver.row_count(), 1);
    }

    #[test]
    fn test_reset_clears_constraints() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        let cons = fix(&mut solver, x, 4.0, Strength::REQUIRED);
        solver.add(cons).unwrap();

        solver.reset(true);
        assert!(!solver.has_constraint(cons));
        assert_eq!(solver.row_count(), 0);
        assert_eq!(solver.constraint_count(), 1);

        solver.add(cons).unwrap();
        solver.update_vars();
        assert!(approx_eq(solver.value(x), 4.0));
    }

    #[test]
    fn test_clone_constraint() {
        let mut solver = Solver::new();
        let x = solver.new_variable();
        let cons = fix(&mut solver, x, 6.0, Strength::WEAK);
        let copy = solver.clone_constraint(cons, 0.0 as Num).unwrap();

        assert_eq!(solver.strength(copy), Some(Strength::WEAK));
        assert_eq!(solver.relation(copy), Some(Relation::Equal));
        assert_eq!(
            solver.constraint_coefficient(copy, x),
            solver.constraint_coefficient(cons, x)
        );
        assert_eq!(solver.constraint_constant(copy), solver.constraint_constant(cons));

        let strong = solver.clone_constraint(cons, Strength::STRONG).unwrap();
        assert_eq!(solver.strength(strong), Some(Strength::STRONG));
    }

    #[test]
    fn test_unknown_constraint() {
        let mut solver = Solver::new();
        let cons = solver.new_constraint(Strength::REQUIRED);
        solver.delete_constraint(cons);
        assert_eq!(solver.add(cons), Err(SolverError::UnknownConstraint));
        assert!(!solver.has_constraint(cons));
        assert_eq!(solver.strength(cons), None);
    }
}
