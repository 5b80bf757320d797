//! Database abstraction layer for the SQL tutor.
//!
//! Provides a trait-based interface over the embedded engine so that the
//! grader can be driven by the real SQLite client or by a scripted mock.

mod mock;
mod schema;
mod sqlite;
mod types;

pub use mock::MockDatabaseClient;
pub use schema::{Column, ForeignKey, Schema, Table};
pub use sqlite::{SqliteClient, DEFAULT_QUERY_TIMEOUT_SECS};
pub use types::{ColumnInfo, QueryResult, Row, StatementOutcome, Value, ValueKind};

use crate::error::Result;
use async_trait::async_trait;

/// Trait defining the interface for database clients.
///
/// Methods take `&mut self`: a client belongs to exactly one tutoring
/// session, and holding the exclusive borrow across several statements
/// guarantees nothing else runs in between.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Executes a single SQL statement.
    ///
    /// Returns the result set for statements that produce one, otherwise the
    /// number of affected rows. Engine diagnostics are reported as query errors.
    async fn execute_query(&mut self, sql: &str) -> Result<StatementOutcome>;

    /// Introspects the database schema, returning table and relationship information.
    async fn introspect_schema(&mut self) -> Result<Schema>;
}
