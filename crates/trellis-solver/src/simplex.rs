//! Tableau maintenance: constraint insertion and removal, the primal
//! simplex over the objective, and the dual simplex used after edits.
//!
//! Every row in `Solver::rows` reads `basic = constant + Σ(coeff * sym)`.
//! Restricted rows (slack and error basics) must keep a non-negative
//! constant; a row that goes negative is queued on the infeasible worklist
//! and repaired by [`Solver::dual_optimize`].

use crate::constraint::Relation;
use crate::error::SolverError;
use crate::pool::Registry;
use crate::row::{approx, near_zero, Num, Row};
use crate::solver::Solver;
use crate::symbol::{Symbol, SymbolKind};
use crate::variable::VariableData;

fn mark_dirty(vars: &mut Registry<VariableData>, dirty: &mut Vec<Symbol>, sym: Symbol) {
    if let Some(var) = vars.get_mut(sym) {
        if !var.dirty {
            var.dirty = true;
            dirty.push(sym);
        }
    }
}

fn mark_infeasible(infeasible: &mut Vec<Symbol>, key: Symbol, row: &mut Row) {
    if row.constant < 0.0 && !row.infeasible {
        row.infeasible = true;
        infeasible.push(key);
    }
}

impl Solver {
    /// Insert a registered constraint into the tableau and re-optimize.
    ///
    /// On failure the objective, the tableau and the symbol counter are
    /// restored.
    pub(crate) fn add_constraint(&mut self, key: Symbol) -> Result<(), SolverError> {
        let mark = self.symbols.mark();
        let row = self.make_row(key).ok_or(SolverError::UnknownConstraint)?;
        match self.try_add_row(row, key) {
            Ok(()) => {
                self.optimize_objective();
                if self.auto_update {
                    self.update_vars();
                }
                tracing::debug!(
                    component = "solver",
                    operation = "add",
                    status = "success",
                    constraint = key.id(),
                    rows = self.rows.len(),
                    "Added constraint"
                );
                Ok(())
            }
            Err(err) => {
                let marker = self.detach(key);
                if err == SolverError::Unbound {
                    if let Some(marker) = marker {
                        self.drop_marker_row(marker);
                    }
                    self.scrub_symbols(mark);
                    self.optimize_objective();
                }
                self.symbols.rewind(mark);
                tracing::warn!(
                    component = "solver",
                    operation = "add",
                    status = "rejected",
                    constraint = key.id(),
                    error = %err,
                    "Rejected constraint"
                );
                Err(err)
            }
        }
    }

    /// Take a constraint out of the tableau and re-optimize.
    pub(crate) fn remove_constraint(&mut self, key: Symbol) {
        let Some(marker) = self.detach(key) else {
            return;
        };
        self.drop_marker_row(marker);
        self.optimize_objective();
        if self.auto_update {
            self.update_vars();
        }
        tracing::debug!(
            component = "solver",
            operation = "remove",
            status = "success",
            constraint = key.id(),
            rows = self.rows.len(),
            "Removed constraint"
        );
    }

    /// Build the tableau row for a constraint, allocating its marker and
    /// error symbols and charging the error symbols to the objective.
    fn make_row(&mut self, key: Symbol) -> Option<Row> {
        let data = self.constraints.get(key)?;
        let (relation, strength) = (data.relation, data.strength);
        let mut row = Row::new(data.expression.constant);
        let terms: Vec<(Symbol, Num)> = data.expression.terms().collect();

        for (sym, coeff) in terms {
            mark_dirty(&mut self.vars, &mut self.dirty_vars, sym);
            match self.rows.get(sym) {
                Some(basic) => row.add_row(basic, coeff),
                None => row.add_term(sym, coeff),
            }
        }

        let (marker, other) = if relation != Some(Relation::Equal) {
            let slack = self.symbols.next(SymbolKind::Slack);
            row.add_term(slack, -1.0);
            if strength.is_required() {
                (slack, Symbol::NULL)
            } else {
                let error = self.symbols.next(SymbolKind::Error);
                row.add_term(error, 1.0);
                self.objective.add_term(error, strength.value());
                (slack, error)
            }
        } else if strength.is_required() {
            let dummy = self.symbols.next(SymbolKind::Dummy);
            row.add_term(dummy, 1.0);
            (dummy, Symbol::NULL)
        } else {
            let minus = self.symbols.next(SymbolKind::Error);
            let plus = self.symbols.next(SymbolKind::Error);
            row.add_term(minus, -1.0);
            row.add_term(plus, 1.0);
            self.objective.add_term(minus, strength.value());
            self.objective.add_term(plus, strength.value());
            (minus, plus)
        };

        let data = self.constraints.get_mut(key)?;
        data.marker = marker;
        data.other = other;

        if row.constant < 0.0 {
            row.multiply(-1.0);
        }
        Some(row)
    }

    /// Pick a basic symbol for a new row and insert it.
    fn try_add_row(&mut self, row: Row, key: Symbol) -> Result<(), SolverError> {
        let (marker, other) = self
            .constraints
            .get(key)
            .map(|data| (data.marker, data.other))
            .ok_or(SolverError::UnknownConstraint)?;

        let subject = Self::choose_subject(&row, marker, other);
        let subject = match subject {
            Some(subject) => subject,
            None if row.terms().all(|(sym, _)| sym.is_dummy()) => {
                if !near_zero(row.constant) {
                    return Err(SolverError::Unsatisfied);
                }
                marker
            }
            None => return self.add_with_artificial(row),
        };
        self.pivot(row, subject, Symbol::NULL);
        Ok(())
    }

    /// An external symbol if the row has one, otherwise the marker or the
    /// other symbol when it is pivotable and has a negative coefficient.
    fn choose_subject(row: &Row, marker: Symbol, other: Symbol) -> Option<Symbol> {
        if let Some((sym, _)) = row.terms().find(|(sym, _)| sym.is_external()) {
            return Some(sym);
        }
        [marker, other].into_iter().find(|sym| {
            sym.is_pivotable() && row.term(*sym).is_some_and(|coeff| coeff < 0.0)
        })
    }

    /// Insert a row with no usable subject by optimizing an artificial
    /// variable out of the basis.
    fn add_with_artificial(&mut self, row: Row) -> Result<(), SolverError> {
        let mark = self.symbols.mark();
        let art = self.symbols.next(SymbolKind::Slack);
        let mut artificial = row.clone();
        self.put_row(art, row);

        let mut result = match self.optimize(Some(&mut artificial)) {
            Ok(()) if near_zero(artificial.constant) => Ok(()),
            _ => Err(SolverError::Unbound),
        };

        if let Some(row) = self.take_row(art) {
            if !row.is_constant() {
                let entry = row.terms().map(|(sym, _)| sym).find(Symbol::is_pivotable);
                match entry {
                    Some(entry) => self.pivot(row, entry, art),
                    None => result = Err(SolverError::Unbound),
                }
            }
        }
        for (_, row) in self.rows.iter_mut() {
            row.remove_term(art);
        }
        self.objective.remove_term(art);
        self.symbols.rewind(mark);
        result
    }

    /// Clear a constraint's markers and refund its error costs.
    ///
    /// Returns the marker if the constraint was live.
    fn detach(&mut self, key: Symbol) -> Option<Symbol> {
        let data = self.constraints.get_mut(key)?;
        if !data.is_live() {
            return None;
        }
        let (marker, other) = (data.marker, data.other);
        let cost = data.strength.value();
        data.marker = Symbol::NULL;
        data.other = Symbol::NULL;

        self.merge_into_objective(marker, -cost);
        self.merge_into_objective(other, -cost);
        if self.objective.is_constant() {
            self.objective.constant = 0.0;
        }
        Some(marker)
    }

    /// Add `multiplier * sym` to the objective, expanding `sym` if it is
    /// basic. Only error symbols carry a cost.
    pub(crate) fn merge_into_objective(&mut self, sym: Symbol, multiplier: Num) {
        if !sym.is_error() {
            return;
        }
        match self.rows.get(sym) {
            Some(row) => self.objective.add_row(row, multiplier),
            None => self.objective.add_term(sym, multiplier),
        }
    }

    /// Make `marker` basic if it is not already and discard its row.
    fn drop_marker_row(&mut self, marker: Symbol) {
        if self.take_row(marker).is_some() {
            return;
        }
        let Some(exit) = self.marker_leaving_row(marker) else {
            return;
        };
        if let Some(mut row) = self.take_row(exit) {
            tracing::trace!(entry = marker.id(), exit = exit.id(), "pivot");
            row.solve_for(marker, exit);
            self.substitute_rows(marker, &row);
        }
    }

    /// Row to pivot on when removing `marker`: the tightest restricted row
    /// with a negative coefficient, then the tightest with a positive one,
    /// then any external row.
    fn marker_leaving_row(&self, marker: Symbol) -> Option<Symbol> {
        let mut first = (Num::MAX, None);
        let mut second = (Num::MAX, None);
        let mut third = None;
        for (key, row) in self.rows.iter() {
            let Some(coeff) = row.term(marker) else {
                continue;
            };
            if key.is_external() {
                third = Some(key);
            } else if coeff < 0.0 {
                let ratio = -row.constant / coeff;
                if ratio < first.0 {
                    first = (ratio, Some(key));
                }
            } else {
                let ratio = row.constant / coeff;
                if ratio < second.0 {
                    second = (ratio, Some(key));
                }
            }
        }
        first.1.or(second.1).or(third)
    }

    /// Drop every symbol allocated after `mark` from the tableau.
    fn scrub_symbols(&mut self, mark: u64) {
        let stale: Vec<Symbol> = self.rows.keys().filter(|key| key.id() > mark).collect();
        for key in stale {
            self.take_row(key);
        }
        let scrub = |row: &mut Row| {
            let stale: Vec<Symbol> = row
                .terms()
                .map(|(sym, _)| sym)
                .filter(|sym| sym.id() > mark)
                .collect();
            for sym in stale {
                row.remove_term(sym);
            }
        };
        for (_, row) in self.rows.iter_mut() {
            scrub(row);
        }
        scrub(&mut self.objective);
    }

    /// Primal optimization of the objective, then repair of any rows left
    /// infeasible.
    pub(crate) fn optimize_objective(&mut self) {
        if let Err(err) = self.optimize(None) {
            tracing::warn!(
                component = "solver",
                operation = "optimize",
                status = "unbounded",
                error = %err,
                "Objective has no leaving row"
            );
        }
        self.dual_optimize();
    }

    /// Primal simplex over `artificial`, or over the solver's objective.
    fn optimize(&mut self, mut artificial: Option<&mut Row>) -> Result<(), SolverError> {
        loop {
            let objective = match artificial.as_deref() {
                Some(row) => row,
                None => &self.objective,
            };
            let entry = objective
                .terms()
                .find(|&(sym, coeff)| !sym.is_dummy() && coeff < 0.0)
                .map(|(sym, _)| sym);
            let Some(entry) = entry else {
                return Ok(());
            };
            let exit = self.min_ratio_row(entry).ok_or(SolverError::Unbound)?;
            let Some(mut row) = self.take_row(exit) else {
                return Err(SolverError::Unbound);
            };
            tracing::trace!(entry = entry.id(), exit = exit.id(), "pivot");
            row.solve_for(entry, exit);
            self.substitute_rows(entry, &row);
            if let Some(artificial) = artificial.as_deref_mut() {
                artificial.substitute(entry, &row);
            }
            self.put_row(entry, row);
        }
    }

    /// The restricted row that most limits `entry`. Ties go to the smaller
    /// basic symbol id.
    fn min_ratio_row(&self, entry: Symbol) -> Option<Symbol> {
        let mut min_ratio = Num::MAX;
        let mut exit: Option<Symbol> = None;
        for (key, row) in self.rows.iter() {
            let Some(coeff) = row.term(entry) else {
                continue;
            };
            if !key.is_pivotable() || coeff > 0.0 {
                continue;
            }
            let ratio = -row.constant / coeff;
            if ratio < min_ratio
                || (approx(ratio, min_ratio) && exit.is_some_and(|exit| key.id() < exit.id()))
            {
                min_ratio = ratio;
                exit = Some(key);
            }
        }
        exit
    }

    /// Shift the constant of every row that depends on an edit constraint.
    pub(crate) fn delta_edit_constant(&mut self, delta: Num, edit: Symbol) {
        let Some(data) = self.constraints.get(edit) else {
            return;
        };
        let (marker, other) = (data.marker, data.other);

        if let Some(row) = self.rows.get_mut(marker) {
            row.constant -= delta;
            mark_infeasible(&mut self.infeasible_rows, marker, row);
            return;
        }
        if let Some(row) = self.rows.get_mut(other) {
            row.constant += delta;
            mark_infeasible(&mut self.infeasible_rows, other, row);
            return;
        }
        for (key, row) in self.rows.iter_mut() {
            let Some(coeff) = row.term(marker) else {
                continue;
            };
            row.constant += coeff * delta;
            if key.is_external() {
                mark_dirty(&mut self.vars, &mut self.dirty_vars, key);
            } else {
                mark_infeasible(&mut self.infeasible_rows, key, row);
            }
        }
    }

    /// Dual simplex: drain the infeasible worklist.
    pub(crate) fn dual_optimize(&mut self) {
        while let Some(leave) = self.infeasible_rows.pop() {
            let Some(row) = self.rows.get_mut(leave) else {
                continue;
            };
            row.infeasible = false;
            if row.constant >= 0.0 || near_zero(row.constant) {
                continue;
            }
            let Some(row) = self.take_row(leave) else {
                continue;
            };
            let entry = self.dual_entering(&row);
            match entry {
                Some(entry) => self.pivot(row, entry, leave),
                None => {
                    tracing::warn!(
                        component = "solver",
                        operation = "dual_optimize",
                        status = "infeasible",
                        row = leave.id(),
                        "No entering symbol for infeasible row"
                    );
                    self.put_row(leave, row);
                }
            }
        }
    }

    fn dual_entering(&self, row: &Row) -> Option<Symbol> {
        let mut min_ratio = Num::MAX;
        let mut entry = None;
        for (sym, coeff) in row.terms() {
            if sym.is_dummy() || coeff <= 0.0 {
                continue;
            }
            let ratio = self.objective.coefficient(sym) / coeff;
            if ratio < min_ratio {
                min_ratio = ratio;
                entry = Some(sym);
            }
        }
        entry
    }

    /// Solve `row` for `entry`, substitute it everywhere and make it basic.
    fn pivot(&mut self, mut row: Row, entry: Symbol, exit: Symbol) {
        tracing::trace!(entry = entry.id(), exit = exit.id(), "pivot");
        row.solve_for(entry, exit);
        self.substitute_rows(entry, &row);
        self.put_row(entry, row);
    }

    fn substitute_rows(&mut self, sym: Symbol, expr: &Row) {
        for (key, row) in self.rows.iter_mut() {
            if !row.contains(sym) {
                continue;
            }
            row.substitute(sym, expr);
            if key.is_external() {
                mark_dirty(&mut self.vars, &mut self.dirty_vars, key);
            } else {
                mark_infeasible(&mut self.infeasible_rows, key, row);
            }
        }
        self.objective.substitute(sym, expr);
    }

    fn take_row(&mut self, sym: Symbol) -> Option<Row> {
        let mut row = self.rows.remove(sym)?;
        row.infeasible = false;
        if sym.is_external() {
            mark_dirty(&mut self.vars, &mut self.dirty_vars, sym);
        }
        Some(row)
    }

    fn put_row(&mut self, sym: Symbol, row: Row) {
        if sym.is_external() {
            mark_dirty(&mut self.vars, &mut self.dirty_vars, sym);
        }
        self.rows.insert(sym, row);
    }
}
