//! Grading verdicts.

use serde::Serialize;

use crate::db::QueryResult;
use crate::error::TutorError;

/// The outcome of grading one learner query.
///
/// Every variant except `ExecutionError` carries the learner's own result
/// so the caller can show what the query returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// The learner query produces the reference table.
    Match { message: String, result: QueryResult },

    /// Column names or their order differ.
    ColumnMismatch {
        message: String,
        expected: Vec<String>,
        actual: Vec<String>,
        result: QueryResult,
    },

    /// Same columns, different number of rows.
    RowCountMismatch {
        message: String,
        expected: usize,
        actual: usize,
        result: QueryResult,
    },

    /// Same shape, different values.
    ValueMismatch { message: String, result: QueryResult },

    /// One of the two queries could not be executed.
    ExecutionError { message: String },
}

impl Verdict {
    /// Builds an execution-error verdict from an engine failure.
    pub fn execution_error(error: &TutorError) -> Self {
        let detail = match error {
            TutorError::Query(message) => message.clone(),
            other => other.to_string(),
        };
        Self::ExecutionError {
            message: format!("Execution error: {detail}"),
        }
    }

    /// Human-readable explanation.
    pub fn message(&self) -> &str {
        match self {
            Self::Match { message, .. }
            | Self::ColumnMismatch { message, .. }
            | Self::RowCountMismatch { message, .. }
            | Self::ValueMismatch { message, .. }
            | Self::ExecutionError { message } => message,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match { .. })
    }

    /// The learner's raw result, when the learner query ran.
    pub fn learner_result(&self) -> Option<&QueryResult> {
        match self {
            Self::Match { result, .. }
            | Self::ColumnMismatch { result, .. }
            | Self::RowCountMismatch { result, .. }
            | Self::ValueMismatch { result, .. } => Some(result),
            Self::ExecutionError { .. } => None,
        }
    }

    /// Stable snake_case name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Match { .. } => "match",
            Self::ColumnMismatch { .. } => "column_mismatch",
            Self::RowCountMismatch { .. } => "row_count_mismatch",
            Self::ValueMismatch { .. } => "value_mismatch",
            Self::ExecutionError { .. } => "execution_error",
        }
    }
}
