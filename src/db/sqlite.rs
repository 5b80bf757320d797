//! SQLite database client implementation.
//!
//! Provides the `SqliteClient` struct that implements the `DatabaseClient` trait
//! for a private in-memory SQLite database using sqlx.

use crate::db::{
    Column, ColumnInfo, DatabaseClient, ForeignKey, QueryResult, Row, Schema, StatementOutcome,
    Table, Value,
};
use crate::error::{Result, TutorError};
use crate::safety::{classify_sql, StatementType};
use async_trait::async_trait;
use sqlx::sqlite::{LockedSqliteHandle, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{
    Column as SqlxColumn, Connection, Executor, Row as SqlxRow, Statement, TypeInfo, ValueRef,
};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default query timeout in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

const MULTIPLE_STATEMENTS: &str = "Only one statement can be run at a time";

/// Virtual machine instructions between deadline checks.
const PROGRESS_HANDLER_OPS: i32 = 1000;

/// In-memory SQLite client owning a single connection.
///
/// An in-memory database lives exactly as long as its connection, so the
/// client never pools: dropping it discards the data.
#[derive(Debug)]
pub struct SqliteClient {
    conn: SqliteConnection,
    timeout: Duration,
}

impl SqliteClient {
    /// Opens a fresh, empty in-memory database.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| TutorError::internal(format!("Invalid database options: {e}")))?;

        let conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(|e| TutorError::provision(format!("Failed to open in-memory database: {e}")))?;

        debug!("Opened in-memory SQLite database");

        Ok(Self {
            conn,
            timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        })
    }

    /// Sets the per-statement execution timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the per-statement execution timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Closes the connection, discarding the in-memory database.
    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| TutorError::internal(format!("Failed to close database: {e}")))
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn execute_query(&mut self, sql: &str) -> Result<StatementOutcome> {
        let start = Instant::now();
        let timeout = self.timeout;
        let deadline = start + timeout;

        // SQLite polls the handler while the statement runs and aborts it
        // once the deadline passes, freeing the connection for the next call.
        self.lock_handle()
            .await?
            .set_progress_handler(PROGRESS_HANDLER_OPS, move || Instant::now() < deadline);

        let outcome = run_statement(&mut self.conn, sql).await;

        self.lock_handle().await?.remove_progress_handler();

        let outcome = match outcome {
            Err(TutorError::Query(_)) if Instant::now() >= deadline => {
                warn!("Statement exceeded timeout of {:?}", timeout);
                return Err(TutorError::query(format!(
                    "Query timed out after {} seconds",
                    timeout.as_secs()
                )));
            }
            other => other?,
        };

        let execution_time = start.elapsed();
        debug!("Statement executed in {:?}", execution_time);

        Ok(match outcome {
            StatementOutcome::Rows(result) => {
                StatementOutcome::Rows(result.with_execution_time(execution_time))
            }
            affected => affected,
        })
    }

    async fn introspect_schema(&mut self) -> Result<Schema> {
        let table_names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT name
            FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY rowid
            "#,
        )
        .fetch_all(&mut self.conn)
        .await
        .map_err(|e| TutorError::query(format!("Failed to fetch tables: {e}")))?;

        let mut tables = Vec::with_capacity(table_names.len());
        let mut foreign_keys = Vec::new();

        for table_name in table_names {
            tables.push(self.fetch_table(&table_name).await?);
            foreign_keys.extend(self.fetch_foreign_keys(&table_name).await?);
        }

        Ok(Schema {
            tables,
            foreign_keys,
        })
    }
}

impl SqliteClient {
    async fn lock_handle(&mut self) -> Result<LockedSqliteHandle<'_>> {
        self.conn
            .lock_handle()
            .await
            .map_err(|e| TutorError::internal(format!("Failed to lock database handle: {e}")))
    }

    /// Fetches columns and primary key for a specific table.
    async fn fetch_table(&mut self, table_name: &str) -> Result<Table> {
        let rows: Vec<(String, String, i64, Option<String>, i64)> = sqlx::query_as(
            r#"
            SELECT name, type, "notnull", dflt_value, pk
            FROM pragma_table_info(?1)
            ORDER BY cid
            "#,
        )
        .bind(table_name)
        .fetch_all(&mut self.conn)
        .await
        .map_err(|e| {
            TutorError::query(format!("Failed to fetch columns for {table_name}: {e}"))
        })?;

        let mut primary_key: Vec<(i64, String)> = rows
            .iter()
            .filter(|(_, _, _, _, pk)| *pk > 0)
            .map(|(name, _, _, _, pk)| (*pk, name.clone()))
            .collect();
        primary_key.sort();

        let columns = rows
            .into_iter()
            .map(|(name, data_type, not_null, default, _)| Column {
                name,
                data_type,
                is_nullable: not_null == 0,
                default,
            })
            .collect();

        Ok(Table {
            name: table_name.to_string(),
            columns,
            primary_key: primary_key.into_iter().map(|(_, name)| name).collect(),
        })
    }

    /// Fetches the foreign keys declared on a specific table.
    async fn fetch_foreign_keys(&mut self, table_name: &str) -> Result<Vec<ForeignKey>> {
        let rows: Vec<(i64, String, String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT id, "table", "from", "to"
            FROM pragma_foreign_key_list(?1)
            ORDER BY id, seq
            "#,
        )
        .bind(table_name)
        .fetch_all(&mut self.conn)
        .await
        .map_err(|e| {
            TutorError::query(format!("Failed to fetch foreign keys for {table_name}: {e}"))
        })?;

        // Group by constraint id to support multi-column keys
        let mut keys: Vec<(i64, ForeignKey)> = Vec::new();
        for (id, to_table, from_column, to_column) in rows {
            let to_column = to_column.unwrap_or_else(|| "rowid".to_string());
            match keys.iter_mut().find(|(key_id, _)| *key_id == id) {
                Some((_, fk)) => {
                    fk.from_columns.push(from_column);
                    fk.to_columns.push(to_column);
                }
                None => keys.push((
                    id,
                    ForeignKey::new(table_name, vec![from_column], to_table, vec![to_column]),
                )),
            }
        }

        Ok(keys.into_iter().map(|(_, fk)| fk).collect())
    }
}

/// Prepares and runs one statement on the connection.
///
/// Whether the statement yields a result set is read from the prepared
/// statement's column metadata.
async fn run_statement(conn: &mut SqliteConnection, sql: &str) -> Result<StatementOutcome> {
    if matches!(classify_sql(sql).statement_type, StatementType::Multiple(_)) {
        return Err(TutorError::query(MULTIPLE_STATEMENTS));
    }

    let statement = (&mut *conn)
        .prepare(sql)
        .await
        .map_err(|e| TutorError::query(format_query_error(e)))?;

    let columns: Vec<ColumnInfo> = statement
        .columns()
        .iter()
        .map(|col| ColumnInfo::new(col.name(), declared_type(col.type_info().name())))
        .collect();

    if columns.is_empty() {
        let done = sqlx::query(sql)
            .execute(&mut *conn)
            .await
            .map_err(|e| TutorError::query(format_query_error(e)))?;
        return Ok(StatementOutcome::Affected {
            rows_affected: done.rows_affected(),
        });
    }

    let rows: Vec<Row> = sqlx::query(sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| TutorError::query(format_query_error(e)))?
        .iter()
        .map(convert_row)
        .collect();

    // Text the parser could not split may still hold several statements
    if rows.iter().any(|row| row.len() != columns.len()) {
        return Err(TutorError::query(MULTIPLE_STATEMENTS));
    }

    Ok(StatementOutcome::Rows(QueryResult::with_data(columns, rows)))
}

/// SQLite reports computed expressions as having type NULL.
fn declared_type(type_name: &str) -> &str {
    if type_name.eq_ignore_ascii_case("NULL") {
        ""
    } else {
        type_name
    }
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.len()).map(|i| convert_value(row, i)).collect()
}

/// Converts a single column value from a SqliteRow to our Value type.
///
/// Dispatches on the storage class of the value itself rather than the
/// declared column type, since SQLite columns may hold any class.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let storage_class = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    match storage_class.as_str() {
        "INTEGER" => row
            .try_get_unchecked::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "REAL" => row
            .try_get_unchecked::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "BLOB" => row
            .try_get_unchecked::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Blob)
            .unwrap_or(Value::Null),

        // TEXT and anything unexpected is read as text
        _ => row
            .try_get_unchecked::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::Text)
            .unwrap_or(Value::Null),
    }
}

/// Extracts the engine's diagnostic text from a sqlx error.
fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}
