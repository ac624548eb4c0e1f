//! # Data Access
//!
//! Parameterized statement execution against the `users` table.
//!
//! Handlers never build SQL. They pick a [`Statement`] from the fixed catalogue
//! and pass its positional [`Param`]s to a [`StoreSession`], which binds them.
//!
//! # Backends
//!
//! - [`PgSession`] - one PostgreSQL connection shared by every request
//! - [`MemorySession`] - in-process table with the same statement semantics

mod errors;
mod memory;
mod postgres;
mod record;
mod statement;

pub use errors::{StoreError, StoreResult};
pub use memory::MemorySession;
pub use postgres::PgSession;
pub use record::{QueryResult, Record};
pub use statement::{Param, ParamKind, Statement, TABLE};

use async_trait::async_trait;

/// An open session against the record store.
///
/// A session is created once at process start and closed once at stop.
/// After [`StoreSession::close`], every query fails with [`StoreError::Closed`].
#[async_trait]
pub trait StoreSession: Send + Sync {
    /// Execute `statement` with positional `params`.
    async fn query(&self, statement: Statement, params: &[Param]) -> StoreResult<QueryResult>;

    /// Release the session.
    async fn close(&self) -> StoreResult<()>;
}
