//! Integration tests for the SQL tutor.

pub mod catalog_test;
pub mod grading_test;
pub mod provision_test;
pub mod session_test;

use sql_tutor::db::{DatabaseClient, QueryResult, SqliteClient};
use sql_tutor::provision::{provision, SampleSchema};

/// Opens a fresh in-memory database loaded with a sample schema.
pub async fn provisioned(schema: SampleSchema) -> SqliteClient {
    let mut client = SqliteClient::connect_in_memory().await.unwrap();
    provision(&mut client, schema).await.unwrap();
    client
}

/// Runs a query that must produce a result set.
pub async fn select(client: &mut SqliteClient, sql: &str) -> QueryResult {
    client
        .execute_query(sql)
        .await
        .unwrap()
        .into_rows()
        .unwrap_or_else(|| panic!("no result set for {sql}"))
}
