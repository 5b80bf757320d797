//! Built-in catalog tests against a real SQLite database.

use super::{provisioned, select};
use sql_tutor::catalog::Catalog;
use sql_tutor::grading::Checker;

#[tokio::test]
async fn test_every_reference_matches_itself() {
    let catalog = Catalog::builtin();
    let checker = Checker::default();

    for exercise in catalog.exercises() {
        let mut client = provisioned(exercise.schema).await;

        let verdict = checker
            .check(&mut client, &exercise.reference, &exercise.reference)
            .await;

        assert!(
            verdict.is_match(),
            "{} / {}: {:?}",
            exercise.level,
            exercise.title,
            verdict
        );
    }
}

#[tokio::test]
async fn test_alternatives_match_reference() {
    let catalog = Catalog::builtin();
    let checker = Checker::default();

    for exercise in catalog.exercises() {
        for alternative in &exercise.alternatives {
            let mut client = provisioned(exercise.schema).await;

            let verdict = checker
                .check(&mut client, alternative, &exercise.reference)
                .await;

            assert!(verdict.is_match(), "{}: {:?}", exercise.title, verdict);
        }
    }
}

#[tokio::test]
async fn test_expected_columns_describe_reference() {
    let catalog = Catalog::builtin();

    for exercise in catalog.exercises() {
        let mut client = provisioned(exercise.schema).await;

        let result = select(&mut client, &exercise.reference).await;

        assert_eq!(
            result.column_names(),
            exercise.expected_columns,
            "{}",
            exercise.title
        );
        assert!(!result.rows.is_empty(), "{} returns no rows", exercise.title);
    }
}
