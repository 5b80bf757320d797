//! Query execution with mutation-policy enforcement.
//!
//! Provides isolated query execution that can be tested independently of
//! the grader and the session.

use std::fmt;
use std::time::Instant;

use tracing::{debug, warn};

use crate::db::{DatabaseClient, StatementOutcome};
use crate::error::{Result, TutorError};
use crate::safety::MutationPolicy;

/// Who submitted a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuerySource {
    /// Typed by the learner; subject to the mutation policy.
    Learner,
    /// An exercise's reference answer; always trusted.
    Reference,
}

impl fmt::Display for QuerySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Learner => write!(f, "learner"),
            Self::Reference => write!(f, "reference"),
        }
    }
}

/// Runs statements against a client, applying the mutation policy to
/// learner input.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryRunner {
    policy: MutationPolicy,
}

impl QueryRunner {
    /// Creates a new runner with the given mutation policy.
    pub fn new(policy: MutationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MutationPolicy {
        self.policy
    }

    /// Executes one statement.
    ///
    /// Learner statements refused by the policy never reach the client and
    /// are reported as query errors.
    pub async fn execute(
        &self,
        client: &mut dyn DatabaseClient,
        sql: &str,
        source: QuerySource,
    ) -> Result<StatementOutcome> {
        if source == QuerySource::Learner {
            if let Err(reason) = self.policy.check(sql) {
                warn!(%source, sql, "{}", reason);
                return Err(TutorError::query(reason));
            }
        }

        let start = Instant::now();
        let result = client.execute_query(sql).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(StatementOutcome::Rows(rows)) => debug!(
                %source,
                rows = rows.row_count,
                elapsed_ms = elapsed.as_millis() as u64,
                "query returned rows"
            ),
            Ok(StatementOutcome::Affected { rows_affected }) => debug!(
                %source,
                rows_affected,
                elapsed_ms = elapsed.as_millis() as u64,
                "statement changed rows"
            ),
            Err(e) => debug!(
                %source,
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "statement failed"
            ),
        }

        result
    }
}
