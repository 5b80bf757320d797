//! Provisioning tests against a real SQLite database.

use super::{provisioned, select};
use pretty_assertions::assert_eq;
use sql_tutor::db::{DatabaseClient, QueryResult, SqliteClient, Value};
use sql_tutor::provision::{provision, SampleSchema};

async fn snapshot(client: &mut SqliteClient, schema: SampleSchema) -> Vec<QueryResult> {
    let mut tables = Vec::new();
    for table in schema.tables() {
        let mut result = select(client, &format!("SELECT * FROM {} ORDER BY id", table.name)).await;
        result.execution_time = Default::default();
        tables.push(result);
    }
    tables
}

#[tokio::test]
async fn test_provisioning_twice_gives_identical_contents() {
    for schema in SampleSchema::ALL {
        let mut client = provisioned(schema).await;
        let first = snapshot(&mut client, schema).await;

        provision(&mut client, schema).await.unwrap();
        let second = snapshot(&mut client, schema).await;

        assert_eq!(first, second, "{schema}");
    }
}

#[tokio::test]
async fn test_reprovisioning_discards_learner_changes() {
    let mut client = provisioned(SampleSchema::Employees).await;
    client
        .execute_query("UPDATE employees SET salary = 0")
        .await
        .unwrap();
    client
        .execute_query("CREATE TABLE scratch (id INTEGER)")
        .await
        .unwrap();

    provision(&mut client, SampleSchema::Employees).await.unwrap();

    let total = select(&mut client, "SELECT SUM(salary) FROM employees").await;
    assert_eq!(total.rows[0][0], Value::Float(485000.0));
}

#[tokio::test]
async fn test_employee_seed_data() {
    let mut client = provisioned(SampleSchema::Employees).await;

    let it = select(
        &mut client,
        "SELECT id, name, age, department, salary FROM employees WHERE department = 'IT' ORDER BY id",
    )
    .await;
    assert_eq!(
        it.rows,
        vec![
            vec![
                Value::Int(1),
                Value::from("Jean Dupont"),
                Value::Int(35),
                Value::from("IT"),
                Value::Float(55000.0)
            ],
            vec![
                Value::Int(3),
                Value::from("Pierre Martin"),
                Value::Int(28),
                Value::from("IT"),
                Value::Float(48000.0)
            ],
            vec![
                Value::Int(8),
                Value::from("Laura Simon"),
                Value::Int(33),
                Value::from("IT"),
                Value::Float(55000.0)
            ],
        ]
    );

    let departments = select(&mut client, "SELECT COUNT(*), SUM(budget) FROM departments").await;
    assert_eq!(
        departments.rows,
        vec![vec![Value::Int(4), Value::Float(1800000.0)]]
    );
}

#[tokio::test]
async fn test_library_seed_data() {
    let mut client = provisioned(SampleSchema::Library).await;

    let open_loans = select(
        &mut client,
        "SELECT book_id, member_id, loan_date FROM loans WHERE return_date IS NULL",
    )
    .await;
    assert_eq!(
        open_loans.rows,
        vec![vec![Value::Int(102), Value::Int(1), Value::from("2023-01-10")]]
    );

    let books = select(&mut client, "SELECT COUNT(*) FROM books").await;
    assert_eq!(books.rows[0][0], Value::Int(4));
}

#[tokio::test]
async fn test_switching_schema_drops_previous_tables() {
    let mut client = provisioned(SampleSchema::Employees).await;

    provision(&mut client, SampleSchema::Library).await.unwrap();

    let err = client
        .execute_query("SELECT * FROM employees")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no such table"));

    let schema = client.introspect_schema().await.unwrap();
    let names: Vec<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["books", "members", "loans"]);
}

#[tokio::test]
async fn test_introspection_reports_relationships() {
    let mut client = provisioned(SampleSchema::Employees).await;

    let schema = client.introspect_schema().await.unwrap();

    let employees = schema.table("employees").unwrap();
    assert_eq!(employees.primary_key, vec!["id".to_string()]);
    assert_eq!(employees.columns.len(), 5);
    assert_eq!(employees.columns[4].data_type, "REAL");

    assert_eq!(schema.foreign_keys.len(), 1);
    let fk = &schema.foreign_keys[0];
    assert_eq!(fk.from_table, "departments");
    assert_eq!(fk.from_columns, vec!["manager_id".to_string()]);
    assert_eq!(fk.to_table, "employees");
    assert_eq!(fk.to_columns, vec!["id".to_string()]);

    let diagram = schema.format_for_display();
    assert!(diagram.contains("departments.manager_id -> employees.id"));
}
