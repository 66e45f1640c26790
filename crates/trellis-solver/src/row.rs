//! Sparse linear rows.
//!
//! A row is `constant + Σ(coefficient * symbol)`. Stored in the tableau
//! under a basic symbol `B`, it reads `B = constant + Σ(...)`.

use crate::symbol::Symbol;
use crate::table::SymbolTable;

/// Numeric type used throughout the solver.
#[cfg(not(feature = "f32"))]
pub type Num = f64;
/// Numeric type used throughout the solver.
#[cfg(feature = "f32")]
pub type Num = f32;

/// Coefficients and constants closer than this to zero are treated as zero.
#[cfg(not(feature = "f32"))]
pub const EPSILON: Num = 1e-6;
/// Coefficients and constants closer than this to zero are treated as zero.
#[cfg(feature = "f32")]
pub const EPSILON: Num = 1e-4;

pub(crate) fn approx(a: Num, b: Num) -> bool {
    if a > b {
        a - b < EPSILON
    } else {
        b - a < EPSILON
    }
}

pub(crate) fn near_zero(value: Num) -> bool {
    approx(value, 0.0)
}

/// A linear expression with no zero coefficients.
#[derive(Debug, Clone, Default)]
pub(crate) struct Row {
    pub(crate) constant: Num,
    terms: SymbolTable<Num>,
    /// Queued on the solver's infeasible worklist.
    pub(crate) infeasible: bool,
}

impl Row {
    pub(crate) fn new(constant: Num) -> Self {
        Self {
            constant,
            ..Self::default()
        }
    }

    pub(crate) fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    pub(crate) fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub(crate) fn coefficient(&self, symbol: Symbol) -> Num {
        self.terms.get(symbol).copied().unwrap_or(0.0)
    }

    pub(crate) fn term(&self, symbol: Symbol) -> Option<Num> {
        self.terms.get(symbol).copied()
    }

    pub(crate) fn contains(&self, symbol: Symbol) -> bool {
        self.terms.contains_key(symbol)
    }

    pub(crate) fn remove_term(&mut self, symbol: Symbol) -> Option<Num> {
        self.terms.remove(symbol)
    }

    /// Terms in table order.
    pub(crate) fn terms(&self) -> impl Iterator<Item = (Symbol, Num)> + '_ {
        self.terms.iter().map(|(symbol, &coeff)| (symbol, coeff))
    }

    /// Zero the constant and drop every term.
    pub(crate) fn reset(&mut self) {
        self.constant = 0.0;
        self.terms.clear();
    }

    pub(crate) fn multiply(&mut self, multiplier: Num) {
        self.constant *= multiplier;
        for (_, coeff) in self.terms.iter_mut() {
            *coeff *= multiplier;
        }
    }

    /// Add `delta` to a symbol's coefficient, dropping it if it cancels.
    pub(crate) fn add_term(&mut self, symbol: Symbol, delta: Num) {
        if symbol.is_null() {
            return;
        }
        let cancelled = {
            let coeff = self.terms.get_or_insert_with(symbol, || 0.0);
            *coeff += delta;
            near_zero(*coeff)
        };
        if cancelled {
            self.terms.remove(symbol);
        }
    }

    /// Add `multiplier * other` to this row.
    pub(crate) fn add_row(&mut self, other: &Row, multiplier: Num) {
        self.constant += other.constant * multiplier;
        for (symbol, &coeff) in other.terms.iter() {
            self.add_term(symbol, coeff * multiplier);
        }
    }

    /// Pivot on `entry`: remove its term and rescale the rest so the row
    /// defines `entry`. When `exit` is not null it takes the reciprocal
    /// coefficient, i.e. it is the symbol that previously owned this row.
    pub(crate) fn solve_for(&mut self, entry: Symbol, exit: Symbol) {
        debug_assert!(entry != exit);
        let Some(coeff) = self.terms.remove(entry) else {
            debug_assert!(false, "pivot symbol missing from row");
            return;
        };
        debug_assert!(!near_zero(coeff));
        let reciprocal = 1.0 / coeff;
        self.multiply(-reciprocal);
        if !exit.is_null() {
            self.add_term(exit, reciprocal);
        }
    }

    /// Replace `entry` by the expression in `other`.
    pub(crate) fn substitute(&mut self, entry: Symbol, other: &Row) {
        if let Some(coeff) = self.terms.remove(entry) {
            self.add_row(other, coeff);
        }
    }
}
