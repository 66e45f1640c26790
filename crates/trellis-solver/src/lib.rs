//! Incremental Cassowary constraint solving for layout.
//!
//! This crate implements:
//! - Sparse tableau rows over typed symbols
//! - Primal simplex for constraint insertion and removal
//! - Dual simplex for cheap per-frame edits through `suggest`
//! - Strength-weighted soft constraints alongside required ones
//!
//! ```
//! use trellis_solver::{Relation, Solver, Strength};
//!
//! let mut solver = Solver::new();
//! let left = solver.new_variable();
//! let right = solver.new_variable();
//!
//! // right - left >= 100
//! let width = solver.new_constraint(Strength::REQUIRED);
//! solver.add_term(width, right, 1.0).unwrap();
//! solver.add_term(width, left, -1.0).unwrap();
//! solver.set_relation(width, Relation::GreaterOrEqual).unwrap();
//! solver.add_constant(width, 100.0).unwrap();
//! solver.add(width).unwrap();
//!
//! solver.suggest(left, 20.0);
//! solver.update_vars();
//! assert!(solver.value(right) - solver.value(left) >= 100.0 - 1e-6);
//! ```

mod constraint;
mod error;
mod options;
mod pool;
mod row;
mod simplex;
mod solver;
mod symbol;
mod table;
mod variable;

pub use constraint::{Constraint, Relation, Strength};
pub use error::{SolverError, Status};
pub use options::SolverOptions;
pub use row::{Num, EPSILON};
pub use solver::Solver;
pub use variable::Variable;
