//! Constraints, relations and strengths.

use crate::row::{near_zero, Num, Row};
use crate::solver::SolverId;
use crate::symbol::Symbol;

/// The relation of a constraint (equality or inequality).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Relation {
    LessOrEqual,
    Equal,
    GreaterOrEqual,
}

/// Constraint strength levels.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Strength(pub Num);

impl Strength {
    pub const REQUIRED: Strength = Strength(1_000_000_000.0);
    pub const STRONG: Strength = Strength(1_000_000.0);
    pub const MEDIUM: Strength = Strength(1_000.0);
    pub const WEAK: Strength = Strength(1.0);

    /// Create a custom strength.
    pub fn new(value: Num) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Num {
        self.0
    }

    /// Check if this is a required constraint.
    pub fn is_required(&self) -> bool {
        self.0 >= Self::REQUIRED.0
    }

    /// A zero strength stands for REQUIRED.
    pub(crate) fn or_required(self) -> Self {
        if near_zero(self.0) {
            Self::REQUIRED
        } else {
            self
        }
    }
}

impl Default for Strength {
    fn default() -> Self {
        Self::REQUIRED
    }
}

impl From<Num> for Strength {
    fn from(value: Num) -> Self {
        Self(value)
    }
}

/// Handle to a constraint owned by a [`Solver`](crate::Solver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constraint {
    pub(crate) key: Symbol,
    pub(crate) owner: SolverId,
}

impl Constraint {
    /// The constraint's id, unique within its solver.
    pub fn id(&self) -> u64 {
        self.key.id()
    }
}

/// Solver-side state of a constraint.
///
/// The expression is accumulated in normalized form: inequalities read
/// `expression >= 0` and equalities `expression == 0`. Terms added before
/// the relation is set belong to the left-hand side, later ones to the
/// right-hand side.
#[derive(Debug)]
pub(crate) struct ConstraintData {
    pub(crate) expression: Row,
    /// Null unless the constraint is in the tableau.
    pub(crate) marker: Symbol,
    pub(crate) other: Symbol,
    pub(crate) relation: Option<Relation>,
    pub(crate) strength: Strength,
}

impl ConstraintData {
    pub(crate) fn new(strength: Strength) -> Self {
        Self {
            expression: Row::new(0.0),
            marker: Symbol::NULL,
            other: Symbol::NULL,
            relation: None,
            strength,
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        !self.marker.is_null()
    }

    /// Multiplier applied to right-hand side input.
    pub(crate) fn side_sign(&self) -> Num {
        if self.relation == Some(Relation::GreaterOrEqual) {
            -1.0
        } else {
            1.0
        }
    }
}
