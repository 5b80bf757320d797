//! Session tests against a real SQLite database.

use pretty_assertions::assert_eq;
use sql_tutor::catalog::Level;
use sql_tutor::config::Config;
use sql_tutor::db::{StatementOutcome, Value};
use sql_tutor::provision::SampleSchema;
use sql_tutor::safety::MutationPolicy;
use sql_tutor::session::TutorSession;
use std::io::Write;

#[tokio::test]
async fn test_basic_selection_scenario() {
    let mut session = TutorSession::open(Config::default()).await.unwrap();

    let verdict = session
        .check_exercise(
            Level::Beginner,
            "Basic selection",
            "SELECT * FROM employees WHERE department = 'IT'",
        )
        .await
        .unwrap();

    assert!(verdict.is_match(), "{verdict:?}");
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_aggregation_without_alias_scenario() {
    let mut session = TutorSession::open(Config::default()).await.unwrap();

    let verdict = session
        .check_exercise(
            Level::Beginner,
            "aggregation",
            "SELECT AVG(salary) FROM employees;",
        )
        .await
        .unwrap();

    assert_eq!(verdict.kind(), "column_mismatch");
    assert!(verdict.message().contains("average_salary"));
    assert!(verdict.message().contains("AVG(salary)"));
}

#[tokio::test]
async fn test_check_switches_to_exercise_schema() {
    let mut session = TutorSession::open(Config::default()).await.unwrap();
    assert_eq!(session.schema(), SampleSchema::Employees);

    let verdict = session
        .check_exercise(
            Level::Beginner,
            "Books by category",
            "SELECT title, author FROM books WHERE category = 'Science'",
        )
        .await
        .unwrap();

    assert!(verdict.is_match(), "{verdict:?}");
    assert_eq!(session.schema(), SampleSchema::Library);
}

#[tokio::test]
async fn test_unknown_exercise_is_an_error() {
    let mut session = TutorSession::open(Config::default()).await.unwrap();

    let err = session
        .check_exercise(Level::Intermediate, "Basic selection", "SELECT 1")
        .await
        .unwrap_err();

    assert_eq!(err.category(), "Catalog Error");
}

#[tokio::test]
async fn test_run_query_outcomes() {
    let mut session = TutorSession::open(Config::default()).await.unwrap();

    let outcome = session
        .run_query("UPDATE employees SET salary = salary + 1000 WHERE department = 'RH'")
        .await
        .unwrap();
    assert_eq!(outcome, StatementOutcome::Affected { rows_affected: 1 });

    let outcome = session
        .run_query("SELECT salary FROM employees WHERE id = 4")
        .await
        .unwrap();
    assert_eq!(outcome.rows().unwrap().rows, vec![vec![Value::Float(52000.0)]]);

    let err = session.run_query("SELEC * FROM employees;").await.unwrap_err();
    assert!(err.to_string().contains("syntax error"));
}

#[tokio::test]
async fn test_load_schema_restores_seed_data() {
    let mut session = TutorSession::open(Config::default()).await.unwrap();
    session.run_query("DELETE FROM departments").await.unwrap();

    session.load_schema(SampleSchema::Employees).await.unwrap();

    let outcome = session
        .run_query("SELECT COUNT(*) AS n FROM departments")
        .await
        .unwrap();
    assert_eq!(outcome.rows().unwrap().rows[0][0], Value::Int(4));
}

#[tokio::test]
async fn test_reject_policy_from_config() {
    let mut config = Config::default();
    config.grading.mutations = MutationPolicy::Reject;
    let mut session = TutorSession::open(config).await.unwrap();

    let err = session.run_query("DROP TABLE employees").await.unwrap_err();
    assert!(err.to_string().contains("DROP"));

    let outcome = session
        .run_query("SELECT COUNT(*) FROM employees")
        .await
        .unwrap();
    assert_eq!(outcome.rows().unwrap().rows[0][0], Value::Int(8));
}

#[tokio::test]
async fn test_describe_schema_includes_samples() {
    let mut config = Config::default();
    config.session.default_schema = SampleSchema::Library;
    let mut session = TutorSession::open(config).await.unwrap();

    let overview = session.describe_schema().await.unwrap();

    assert_eq!(overview.schema, SampleSchema::Library);
    assert_eq!(overview.structure.tables.len(), 3);
    assert_eq!(overview.structure.foreign_keys.len(), 2);
    let samples: Vec<(&str, usize)> = overview
        .samples
        .iter()
        .map(|(name, rows)| (name.as_str(), rows.row_count))
        .collect();
    assert_eq!(samples, vec![("books", 4), ("members", 3), ("loans", 3)]);
}

#[tokio::test]
async fn test_describe_schema_limits_sample_rows() {
    let mut session = TutorSession::open(Config::default()).await.unwrap();

    let overview = session.describe_schema().await.unwrap();

    let (name, employees) = &overview.samples[0];
    assert_eq!(name, "employees");
    assert_eq!(employees.row_count, 5);
}

#[tokio::test]
async fn test_custom_catalog_from_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[[exercises]]
level = "advanced"
title = "Most expensive department"
description = "Find the department with the largest budget."
reference = "SELECT name FROM departments ORDER BY budget DESC LIMIT 1"
hint = "Sort by budget and keep one row."
expected_columns = ["name"]
"#
    )
    .unwrap();

    let mut config = Config::default();
    config.session.catalog = Some(file.path().to_path_buf());
    let mut session = TutorSession::open(config).await.unwrap();

    assert_eq!(session.catalog().exercises().len(), 1);
    assert_eq!(
        session
            .hint(Level::Advanced, "most expensive department")
            .unwrap(),
        "Sort by budget and keep one row."
    );

    let verdict = session
        .check_exercise(
            Level::Advanced,
            "Most expensive department",
            "SELECT name FROM departments WHERE budget = (SELECT MAX(budget) FROM departments)",
        )
        .await
        .unwrap();
    assert!(verdict.is_match(), "{verdict:?}");
}

#[tokio::test]
async fn test_missing_catalog_file_fails_open() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.session.catalog = Some(dir.path().join("missing.toml"));

    let result = TutorSession::open(config).await;

    assert!(result.is_err());
}
