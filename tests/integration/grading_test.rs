//! Grading tests against a real SQLite database.

use super::{provisioned, select};
use pretty_assertions::assert_eq;
use sql_tutor::db::Value;
use sql_tutor::grading::{Checker, ColumnNamePolicy, GradingOptions, Verdict};
use sql_tutor::provision::SampleSchema;
use sql_tutor::query::QueryRunner;
use sql_tutor::safety::MutationPolicy;

const IT_SALARIES: &str = "SELECT name, salary FROM employees WHERE department = 'IT'";

#[tokio::test]
async fn test_order_by_does_not_change_verdict() {
    let mut client = provisioned(SampleSchema::Employees).await;

    let verdict = Checker::default()
        .check(
            &mut client,
            "SELECT name, salary FROM employees WHERE department = 'IT' ORDER BY salary DESC;",
            IT_SALARIES,
        )
        .await;

    assert!(verdict.is_match(), "{verdict:?}");
    let result = verdict.learner_result().unwrap();
    assert_eq!(result.row_count, 3);
    // The learner's own row order is preserved for display.
    assert_eq!(result.rows[2], vec![Value::from("Pierre Martin"), Value::Float(48000.0)]);
}

#[tokio::test]
async fn test_reversed_rows_match() {
    let mut client = provisioned(SampleSchema::Employees).await;

    let verdict = Checker::default()
        .check(
            &mut client,
            "SELECT name, salary FROM employees WHERE department = 'IT' ORDER BY id DESC",
            "SELECT name, salary FROM employees WHERE department = 'IT' ORDER BY id",
        )
        .await;

    assert!(verdict.is_match(), "{verdict:?}");
}

#[tokio::test]
async fn test_missing_alias_is_column_mismatch() {
    let mut client = provisioned(SampleSchema::Employees).await;

    let verdict = Checker::default()
        .check(
            &mut client,
            "SELECT AVG(salary) FROM employees;",
            "SELECT AVG(salary) as average_salary FROM employees;",
        )
        .await;

    match &verdict {
        Verdict::ColumnMismatch {
            expected, actual, ..
        } => {
            assert_eq!(expected, &vec!["average_salary".to_string()]);
            assert_eq!(actual, &vec!["AVG(salary)".to_string()]);
        }
        other => panic!("expected column mismatch, got {other:?}"),
    }
    assert!(verdict.message().contains("average_salary"));
    assert!(verdict.message().contains("AVG(salary)"));
}

#[tokio::test]
async fn test_swapped_columns_are_column_mismatch() {
    let mut client = provisioned(SampleSchema::Employees).await;

    let verdict = Checker::default()
        .check(
            &mut client,
            "SELECT salary, name FROM employees WHERE department = 'IT'",
            IT_SALARIES,
        )
        .await;

    assert_eq!(verdict.kind(), "column_mismatch");
}

#[tokio::test]
async fn test_column_case_policy() {
    let learner = "SELECT name AS NAME, salary AS Salary FROM employees WHERE department = 'IT'";

    let mut client = provisioned(SampleSchema::Employees).await;
    let verdict = Checker::default().check(&mut client, learner, IT_SALARIES).await;
    assert!(verdict.is_match(), "{verdict:?}");

    let strict = Checker::new(
        QueryRunner::default(),
        GradingOptions {
            column_names: ColumnNamePolicy::Exact,
            ..GradingOptions::default()
        },
    );
    let verdict = strict.check(&mut client, learner, IT_SALARIES).await;
    assert_eq!(verdict.kind(), "column_mismatch");
}

#[tokio::test]
async fn test_extra_and_missing_rows() {
    let mut client = provisioned(SampleSchema::Employees).await;
    let checker = Checker::default();

    let extra = checker
        .check(
            &mut client,
            "SELECT name, salary FROM employees WHERE department IN ('IT', 'RH')",
            IT_SALARIES,
        )
        .await;
    match extra {
        Verdict::RowCountMismatch {
            expected, actual, ..
        } => assert_eq!((expected, actual), (3, 4)),
        other => panic!("expected row count mismatch, got {other:?}"),
    }

    let fewer = checker
        .check(
            &mut client,
            "SELECT name, salary FROM employees WHERE department = 'IT' AND id < 8",
            IT_SALARIES,
        )
        .await;
    match fewer {
        Verdict::RowCountMismatch {
            expected, actual, ..
        } => assert_eq!((expected, actual), (3, 2)),
        other => panic!("expected row count mismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_syntax_error_stops_before_reference() {
    let mut client = provisioned(SampleSchema::Employees).await;

    // A reference that would empty the table proves it never ran.
    let verdict = Checker::default()
        .check(&mut client, "SELEC * FROM employees;", "DELETE FROM employees")
        .await;

    assert_eq!(verdict.kind(), "execution_error");
    assert!(verdict.message().contains("syntax error"), "{verdict:?}");
    let count = select(&mut client, "SELECT COUNT(*) FROM employees").await;
    assert_eq!(count.rows[0][0], Value::Int(8));
}

#[tokio::test]
async fn test_multiple_statements_are_execution_error() {
    let mut client = provisioned(SampleSchema::Employees).await;
    let checker = Checker::default();

    let split = checker
        .check(
            &mut client,
            "SELECT 1 AS a; SELECT 2 AS a",
            "SELECT 1 AS a UNION ALL SELECT 2",
        )
        .await;
    assert_eq!(split.kind(), "execution_error");
    assert!(split.message().contains("one statement"), "{split:?}");

    let sneaky = checker
        .check(
            &mut client,
            "DELETE FROM employees; SELECT name, salary FROM employees WHERE department = 'IT'",
            IT_SALARIES,
        )
        .await;
    assert_eq!(sneaky.kind(), "execution_error");
    let count = select(&mut client, "SELECT COUNT(*) FROM employees").await;
    assert_eq!(count.rows[0][0], Value::Int(8));
}

#[tokio::test]
async fn test_unknown_table_is_execution_error() {
    let mut client = provisioned(SampleSchema::Employees).await;

    let verdict = Checker::default()
        .check(&mut client, "SELECT * FROM staff", IT_SALARIES)
        .await;

    assert_eq!(verdict.kind(), "execution_error");
    assert!(verdict.message().contains("no such table"));
    assert!(verdict.learner_result().is_none());
}

#[tokio::test]
async fn test_trailing_semicolon_is_optional() {
    let mut client = provisioned(SampleSchema::Employees).await;

    let verdict = Checker::default()
        .check(
            &mut client,
            "SELECT AVG(salary) as average_salary FROM employees",
            "SELECT AVG(salary) as average_salary FROM employees;",
        )
        .await;

    assert!(verdict.is_match(), "{verdict:?}");
    let result = verdict.learner_result().unwrap();
    assert_eq!(result.rows, vec![vec![Value::Float(60625.0)]]);
}

#[tokio::test]
async fn test_integer_cast_matches_real_column() {
    let mut client = provisioned(SampleSchema::Employees).await;

    let verdict = Checker::default()
        .check(
            &mut client,
            "SELECT name, CAST(salary AS INTEGER) AS salary FROM employees WHERE department = 'IT'",
            IT_SALARIES,
        )
        .await;

    assert!(verdict.is_match(), "{verdict:?}");
}

#[tokio::test]
async fn test_changed_values_are_value_mismatch() {
    let mut client = provisioned(SampleSchema::Employees).await;

    let verdict = Checker::default()
        .check(
            &mut client,
            "SELECT name, salary + 1 AS salary FROM employees WHERE department = 'IT'",
            IT_SALARIES,
        )
        .await;

    assert_eq!(verdict.kind(), "value_mismatch");
    assert!(verdict.message().contains("salary"));
}

#[tokio::test]
async fn test_text_in_numeric_column_is_value_mismatch() {
    let mut client = provisioned(SampleSchema::Employees).await;

    let verdict = Checker::default()
        .check(
            &mut client,
            "SELECT name, department AS salary FROM employees WHERE department = 'IT'",
            IT_SALARIES,
        )
        .await;

    assert_eq!(verdict.kind(), "value_mismatch");
    assert!(verdict.message().contains("'IT'"), "{verdict:?}");
}

#[tokio::test]
async fn test_both_empty_is_match() {
    let mut client = provisioned(SampleSchema::Employees).await;

    let verdict = Checker::default()
        .check(
            &mut client,
            "SELECT id FROM employees WHERE department = 'Legal'",
            "SELECT name, salary FROM employees WHERE salary > 1000000",
        )
        .await;

    assert!(verdict.is_match());
    assert_eq!(verdict.message(), "Solution correct (empty result).");
    assert_eq!(
        verdict.learner_result().unwrap().column_names(),
        vec!["id".to_string()]
    );
}

#[tokio::test]
async fn test_nulls_compare_equal() {
    let mut client = provisioned(SampleSchema::Library).await;

    let verdict = Checker::default()
        .check(
            &mut client,
            "SELECT id, return_date FROM loans ORDER BY return_date DESC",
            "SELECT id, return_date FROM loans",
        )
        .await;

    assert!(verdict.is_match(), "{verdict:?}");
}

#[tokio::test]
async fn test_learner_mutation_persists_under_allow() {
    let mut client = provisioned(SampleSchema::Employees).await;

    let verdict = Checker::default()
        .check(
            &mut client,
            "DELETE FROM employees WHERE department = 'IT'",
            IT_SALARIES,
        )
        .await;

    assert_eq!(verdict.kind(), "column_mismatch");
    assert!(verdict.message().contains("3 rows affected"));
    let count = select(&mut client, "SELECT COUNT(*) FROM employees").await;
    assert_eq!(count.rows[0][0], Value::Int(5));
}

#[tokio::test]
async fn test_learner_mutation_refused_under_reject() {
    let mut client = provisioned(SampleSchema::Employees).await;
    let checker = Checker::new(
        QueryRunner::new(MutationPolicy::Reject),
        GradingOptions::default(),
    );

    let verdict = checker
        .check(&mut client, "DELETE FROM employees", IT_SALARIES)
        .await;

    assert_eq!(verdict.kind(), "execution_error");
    let count = select(&mut client, "SELECT COUNT(*) FROM employees").await;
    assert_eq!(count.rows[0][0], Value::Int(8));
}
