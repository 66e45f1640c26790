//! Error and status types for the solver.

use thiserror::Error;

/// Numeric outcome of an operation, mirroring the classic C status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    Ok,
    Failed,
    Unsatisfied,
    Unbound,
}

impl Status {
    /// The integer code: 0, -1, -2 or -3.
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Failed => -1,
            Status::Unsatisfied => -2,
            Status::Unbound => -3,
        }
    }

    pub fn from_result<T>(result: &Result<T, SolverError>) -> Self {
        match result {
            Ok(_) => Status::Ok,
            Err(err) => err.status(),
        }
    }
}

/// Errors that can occur while building or solving constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error("The variable is not registered in this solver")]
    UnknownVariable,

    #[error("The constraint is not registered in this solver")]
    UnknownConstraint,

    #[error("The handle belongs to a different solver")]
    ForeignHandle,

    #[error("The constraint is already part of the solver and cannot be modified")]
    ConstraintInSolver,

    #[error("The constraint relation has already been set")]
    RelationAlreadySet,

    /// A required constraint conflicts with the existing required constraints.
    #[error("The constraint cannot be satisfied")]
    Unsatisfied,

    /// The artificial variable used to insert the constraint could not be
    /// driven to zero.
    #[error("The constraint could not be made feasible")]
    Unbound,
}

impl SolverError {
    pub fn status(&self) -> Status {
        match self {
            SolverError::Unsatisfied => Status::Unsatisfied,
            SolverError::Unbound => Status::Unbound,
            SolverError::UnknownVariable
            | SolverError::UnknownConstraint
            | SolverError::ForeignHandle
            | SolverError::ConstraintInSolver
            | SolverError::RelationAlreadySet => Status::Failed,
        }
    }
}
