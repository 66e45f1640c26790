//! Variables: the external unknowns of a constraint system.

use crate::row::Num;
use crate::solver::SolverId;
use crate::symbol::Symbol;

/// Handle to a variable owned by a [`Solver`](crate::Solver).
///
/// Handles are plain values; the solver keeps the variable alive while
/// its reference count is positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variable {
    pub(crate) sym: Symbol,
    pub(crate) owner: SolverId,
}

impl Variable {
    /// The variable's symbol id, unique within its solver.
    pub fn id(&self) -> u64 {
        self.sym.id()
    }
}

#[derive(Debug)]
pub(crate) struct VariableData {
    /// Queued on the solver's dirty worklist.
    pub(crate) dirty: bool,
    pub(crate) refcount: u32,
    /// Key of the hidden edit constraint, if any.
    pub(crate) edit: Option<Symbol>,
    pub(crate) edit_value: Num,
    pub(crate) value: Num,
}

impl VariableData {
    pub(crate) fn new() -> Self {
        Self {
            dirty: false,
            refcount: 1,
            edit: None,
            edit_value: 0.0,
            value: 0.0,
        }
    }
}
