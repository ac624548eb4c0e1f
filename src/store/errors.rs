//! Store error types.

use thiserror::Error;

use super::statement::Statement;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures coming out of the data layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Opening the session failed
    #[error("failed to connect to the store")]
    Connect(#[source] sqlx::Error),

    /// The driver reported an error while executing a statement
    #[error("query failed")]
    Query(#[from] sqlx::Error),

    /// Primary key already taken
    #[error("duplicate key value violates unique constraint: id {0} already exists")]
    DuplicateKey(i64),

    /// Parameter list length does not match the statement
    #[error("{statement} expects {expected} parameters, got {actual}")]
    Arity {
        statement: Statement,
        expected: usize,
        actual: usize,
    },

    /// Parameter at `position` (1-based) has the wrong type
    #[error("parameter ${position} of {statement} must be {expected}")]
    ParamType {
        statement: Statement,
        position: usize,
        expected: &'static str,
    },

    /// The session was closed
    #[error("store session is closed")]
    Closed,
}
