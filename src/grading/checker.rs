//! Result-set equivalence checking.
//!
//! Runs a learner query and a reference query back to back on the same
//! client and decides whether they produce the same table, regardless of
//! row order and of how numbers happen to be stored.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::normalize::{column_kinds, normalize, NormalizedResult};
use super::verdict::Verdict;
use crate::db::{DatabaseClient, QueryResult, StatementOutcome, Value};
use crate::query::{QueryRunner, QuerySource};

/// How column names are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnNamePolicy {
    /// Names must match exactly, or differ only in letter case.
    #[default]
    CaseInsensitive,
    /// Names must match exactly.
    Exact,
}

impl ColumnNamePolicy {
    fn matches(&self, expected: &[String], actual: &[String]) -> bool {
        if expected == actual {
            return true;
        }
        match self {
            Self::Exact => false,
            Self::CaseInsensitive => {
                expected.len() == actual.len()
                    && expected
                        .iter()
                        .zip(actual)
                        .all(|(e, a)| e.to_lowercase() == a.to_lowercase())
            }
        }
    }
}

/// Grading options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradingOptions {
    pub column_names: ColumnNamePolicy,
    /// Relative tolerance for comparing reals; 0.0 means exact equality.
    pub float_tolerance: f64,
}

impl Default for GradingOptions {
    fn default() -> Self {
        Self {
            column_names: ColumnNamePolicy::CaseInsensitive,
            float_tolerance: 0.0,
        }
    }
}

/// Compares a learner query against a reference query.
#[derive(Debug, Clone, Copy, Default)]
pub struct Checker {
    runner: QueryRunner,
    options: GradingOptions,
}

impl Checker {
    pub fn new(runner: QueryRunner, options: GradingOptions) -> Self {
        Self { runner, options }
    }

    pub fn options(&self) -> &GradingOptions {
        &self.options
    }

    /// Grades a learner query.
    ///
    /// The learner query runs first; if it fails, the reference never runs.
    /// Every failure is reported as a verdict.
    pub async fn check(
        &self,
        client: &mut dyn DatabaseClient,
        learner_sql: &str,
        reference_sql: &str,
    ) -> Verdict {
        let verdict = self.grade(client, learner_sql, reference_sql).await;
        info!(verdict = verdict.kind(), "graded learner query");
        verdict
    }

    async fn grade(
        &self,
        client: &mut dyn DatabaseClient,
        learner_sql: &str,
        reference_sql: &str,
    ) -> Verdict {
        let learner = match self
            .runner
            .execute(client, learner_sql, QuerySource::Learner)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => return Verdict::execution_error(&e),
        };

        let reference = match self
            .runner
            .execute(client, reference_sql, QuerySource::Reference)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => return Verdict::execution_error(&e),
        };

        match (learner, reference) {
            (StatementOutcome::Rows(learner), StatementOutcome::Rows(reference)) => {
                self.compare(learner, &reference)
            }
            (
                StatementOutcome::Affected { rows_affected },
                StatementOutcome::Rows(reference),
            ) => Verdict::ColumnMismatch {
                message: format!(
                    "Column names or order do not match: expected {}, but the query returned no result set ({rows_affected} rows affected)",
                    format_names(&reference.column_names())
                ),
                expected: reference.column_names(),
                actual: Vec::new(),
                result: QueryResult::new(),
            },
            (StatementOutcome::Rows(learner), StatementOutcome::Affected { .. }) => {
                Verdict::ColumnMismatch {
                    message: format!(
                        "Column names or order do not match: expected no result set, got {}",
                        format_names(&learner.column_names())
                    ),
                    expected: Vec::new(),
                    actual: learner.column_names(),
                    result: learner,
                }
            }
            (
                StatementOutcome::Affected {
                    rows_affected: actual,
                },
                StatementOutcome::Affected {
                    rows_affected: expected,
                },
            ) => {
                if actual == expected {
                    Verdict::Match {
                        message: format!("Solution correct ({actual} rows affected)."),
                        result: QueryResult::new(),
                    }
                } else {
                    Verdict::RowCountMismatch {
                        message: format!(
                            "Incorrect number of affected rows: expected {expected}, got {actual}"
                        ),
                        expected: expected as usize,
                        actual: actual as usize,
                        result: QueryResult::new(),
                    }
                }
            }
        }
    }

    /// Compares two result sets once both queries have run.
    fn compare(&self, learner: QueryResult, reference: &QueryResult) -> Verdict {
        if learner.rows.is_empty() && reference.rows.is_empty() {
            return Verdict::Match {
                message: "Solution correct (empty result).".to_string(),
                result: learner,
            };
        }

        let expected_names = reference.column_names();
        let actual_names = learner.column_names();
        if !self.options.column_names.matches(&expected_names, &actual_names) {
            return Verdict::ColumnMismatch {
                message: format!(
                    "Column names or order do not match: expected {}, got {}",
                    format_names(&expected_names),
                    format_names(&actual_names)
                ),
                expected: expected_names,
                actual: actual_names,
                result: learner,
            };
        }

        if learner.rows.len() != reference.rows.len() {
            return Verdict::RowCountMismatch {
                message: format!(
                    "Incorrect number of rows: expected {}, got {}",
                    reference.rows.len(),
                    learner.rows.len()
                ),
                expected: reference.rows.len(),
                actual: learner.rows.len(),
                result: learner,
            };
        }

        let kinds = column_kinds(reference);
        let normalized = normalize(&learner, &kinds)
            .and_then(|learner_n| normalize(reference, &kinds).map(|ref_n| (learner_n, ref_n)));
        let (learner_n, reference_n) = match normalized {
            Ok(pair) => pair,
            Err(e) => {
                return Verdict::ValueMismatch {
                    message: format!("Returned data does not match: {e}"),
                    result: learner,
                }
            }
        };

        match self.first_difference(&learner_n, &reference_n) {
            None => Verdict::Match {
                message: "Solution correct.".to_string(),
                result: learner,
            },
            Some((row, column)) => Verdict::ValueMismatch {
                message: format!(
                    "Returned data does not match (check the values or the column order): \
                     sorted row {} differs in column '{}', expected {}, got {}",
                    row + 1,
                    reference_n.columns.get(column).map_or("?", String::as_str),
                    describe(&reference_n.rows[row][column]),
                    describe(&learner_n.rows[row][column]),
                ),
                result: learner,
            },
        }
    }

    /// Returns the position of the first differing value, if any.
    fn first_difference(
        &self,
        learner: &NormalizedResult,
        reference: &NormalizedResult,
    ) -> Option<(usize, usize)> {
        learner
            .rows
            .iter()
            .zip(&reference.rows)
            .enumerate()
            .find_map(|(row_index, (actual, expected))| {
                actual
                    .iter()
                    .zip(expected)
                    .position(|(a, e)| !values_equal(a, e, self.options.float_tolerance))
                    .map(|column| (row_index, column))
            })
    }
}

/// Compares two normalized values, numbers by numeric value.
fn values_equal(actual: &Value, expected: &Value, tolerance: f64) -> bool {
    let close = |a: f64, e: f64| {
        a == e || (tolerance > 0.0 && (a - e).abs() <= tolerance * a.abs().max(e.abs()))
    };

    match (actual, expected) {
        (Value::Float(a), Value::Float(e)) => close(*a, *e),
        (Value::Int(a), Value::Float(e)) => close(*a as f64, *e),
        (Value::Float(a), Value::Int(e)) => close(*a, *e as f64),
        _ => actual == expected,
    }
}

fn format_names(names: &[String]) -> String {
    format!("[{}]", names.join(", "))
}

fn describe(value: &Value) -> String {
    match value {
        Value::Text(s) => format!("'{s}'"),
        other => other.to_display_string(),
    }
}
