//! Mock database client for testing.
//!
//! Returns scripted outcomes keyed by SQL text and records every statement
//! it was asked to run.

use super::{DatabaseClient, QueryResult, Schema, StatementOutcome};
use crate::error::{Result, TutorError};
use async_trait::async_trait;
use std::collections::HashMap;

/// A mock database client that returns predefined results.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    schema: Schema,
    outcomes: HashMap<String, std::result::Result<StatementOutcome, String>>,
    executed: Vec<String>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with no scripted statements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new mock database client with the given schema.
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    /// Scripts a result set for the given SQL text.
    pub fn with_result(mut self, sql: impl Into<String>, result: QueryResult) -> Self {
        self.outcomes
            .insert(sql.into(), Ok(StatementOutcome::Rows(result)));
        self
    }

    /// Scripts an affected-row count for the given SQL text.
    pub fn with_affected(mut self, sql: impl Into<String>, rows_affected: u64) -> Self {
        self.outcomes
            .insert(sql.into(), Ok(StatementOutcome::Affected { rows_affected }));
        self
    }

    /// Scripts an engine error for the given SQL text.
    pub fn with_error(mut self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        self.outcomes.insert(sql.into(), Err(message.into()));
        self
    }

    /// Returns every statement executed so far, in order.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&mut self, sql: &str) -> Result<StatementOutcome> {
        self.executed.push(sql.to_string());

        match self.outcomes.get(sql) {
            Some(Ok(outcome)) => Ok(outcome.clone()),
            Some(Err(message)) => Err(TutorError::query(message.clone())),
            None => Err(TutorError::query(format!(
                "mock database has no result scripted for: {sql}"
            ))),
        }
    }

    async fn introspect_schema(&mut self) -> Result<Schema> {
        Ok(self.schema.clone())
    }
}
