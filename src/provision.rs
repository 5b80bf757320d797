//! Sample databases and the provisioner that loads them.
//!
//! Two fixed schemas are available: a small company (`employees` and
//! `departments`) and a lending library (`books`, `members`, `loans`).
//! Loading one drops every table either schema may have created, so the
//! learner always starts from the same contents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::{DatabaseClient, Row, Value};
use crate::error::{Result, TutorError};

/// Identifies one of the built-in sample databases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSchema {
    /// Employees and departments.
    #[default]
    Employees,
    /// Books, members and loans.
    Library,
}

impl SampleSchema {
    pub const ALL: [SampleSchema; 2] = [SampleSchema::Employees, SampleSchema::Library];

    /// Returns the tables of this schema in creation order.
    pub fn tables(&self) -> Vec<SeedTable> {
        match self {
            Self::Employees => employees_tables(),
            Self::Library => library_tables(),
        }
    }

    /// Short description shown next to the schema name.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Employees => "Company employees and their departments",
            Self::Library => "Library books, members and loans",
        }
    }
}

impl fmt::Display for SampleSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Employees => write!(f, "employees"),
            Self::Library => write!(f, "library"),
        }
    }
}

impl FromStr for SampleSchema {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "employees" | "company" => Ok(Self::Employees),
            "library" => Ok(Self::Library),
            _ => Err(format!(
                "Unknown sample schema: {s}. Expected: employees or library"
            )),
        }
    }
}

/// A column declaration in a seed table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub data_type: &'static str,
    /// Extra constraint text appended to the declaration.
    pub constraint: Option<&'static str>,
}

impl ColumnDef {
    fn new(name: &'static str, data_type: &'static str) -> Self {
        Self {
            name,
            data_type,
            constraint: None,
        }
    }

    fn with(mut self, constraint: &'static str) -> Self {
        self.constraint = Some(constraint);
        self
    }
}

/// A table definition together with its seed rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedTable {
    pub name: &'static str,
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Row>,
}

impl SeedTable {
    /// Returns the CREATE TABLE statement for this table.
    pub fn create_statement(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| match c.constraint {
                Some(constraint) => format!("{} {} {}", c.name, c.data_type, constraint),
                None => format!("{} {}", c.name, c.data_type),
            })
            .collect();
        format!("CREATE TABLE {} ({})", self.name, columns.join(", "))
    }

    /// Returns a single multi-row INSERT for the seed rows, if there are any.
    pub fn insert_statement(&self) -> Option<String> {
        if self.rows.is_empty() {
            return None;
        }

        let names: Vec<&str> = self.columns.iter().map(|c| c.name).collect();
        let tuples: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let literals: Vec<String> = row.iter().map(Value::to_sql_literal).collect();
                format!("({})", literals.join(", "))
            })
            .collect();

        Some(format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.name,
            names.join(", "),
            tuples.join(", ")
        ))
    }
}

/// Every table any sample schema creates, dependents first.
fn known_tables() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = SampleSchema::ALL
        .iter()
        .flat_map(|schema| schema.tables().into_iter().map(|t| t.name))
        .collect();
    // Creation order lists parents first; drop in the opposite order.
    names.reverse();
    names
}

/// Loads a sample schema into the database.
///
/// Drops the tables of every sample schema, recreates the requested ones and
/// inserts their seed rows in declared order. Running it twice leaves the
/// same contents behind.
pub async fn provision(client: &mut dyn DatabaseClient, schema: SampleSchema) -> Result<()> {
    for table in known_tables() {
        client
            .execute_query(&format!("DROP TABLE IF EXISTS {table}"))
            .await
            .map_err(|e| TutorError::provision(format!("failed to drop table {table}: {e}")))?;
    }

    for table in schema.tables() {
        client
            .execute_query(&table.create_statement())
            .await
            .map_err(|e| {
                TutorError::provision(format!("failed to create table {}: {e}", table.name))
            })?;

        if let Some(insert) = table.insert_statement() {
            client.execute_query(&insert).await.map_err(|e| {
                TutorError::provision(format!("failed to seed table {}: {e}", table.name))
            })?;
        }
    }

    info!(%schema, "sample schema loaded");
    Ok(())
}

fn employees_tables() -> Vec<SeedTable> {
    let employee = |id: i64, name: &str, age: i64, department: &str, salary: f64| -> Row {
        vec![
            Value::Int(id),
            Value::from(name),
            Value::Int(age),
            Value::from(department),
            Value::Float(salary),
        ]
    };
    let department = |id: i64, name: &str, manager_id: i64, budget: f64| -> Row {
        vec![
            Value::Int(id),
            Value::from(name),
            Value::Int(manager_id),
            Value::Float(budget),
        ]
    };

    vec![
        SeedTable {
            name: "employees",
            columns: vec![
                ColumnDef::new("id", "INTEGER").with("PRIMARY KEY"),
                ColumnDef::new("name", "TEXT"),
                ColumnDef::new("age", "INTEGER"),
                ColumnDef::new("department", "TEXT"),
                ColumnDef::new("salary", "REAL"),
            ],
            rows: vec![
                employee(1, "Jean Dupont", 35, "IT", 55000.0),
                employee(2, "Marie Lefebvre", 42, "Marketing", 62000.0),
                employee(3, "Pierre Martin", 28, "IT", 48000.0),
                employee(4, "Sophie Bernard", 31, "RH", 51000.0),
                employee(5, "Thomas Dubois", 45, "Finance", 75000.0),
                employee(6, "Lucie Moreau", 29, "Marketing", 59000.0),
                employee(7, "David Petit", 50, "Finance", 80000.0),
                employee(8, "Laura Simon", 33, "IT", 55000.0),
            ],
        },
        SeedTable {
            name: "departments",
            columns: vec![
                ColumnDef::new("id", "INTEGER").with("PRIMARY KEY"),
                ColumnDef::new("name", "TEXT"),
                ColumnDef::new("manager_id", "INTEGER").with("REFERENCES employees(id)"),
                ColumnDef::new("budget", "REAL"),
            ],
            rows: vec![
                department(1, "IT", 1, 500000.0),
                department(2, "Marketing", 2, 350000.0),
                department(3, "RH", 4, 200000.0),
                department(4, "Finance", 5, 750000.0),
            ],
        },
    ]
}

fn library_tables() -> Vec<SeedTable> {
    let book = |id: i64, title: &str, author: &str, category: &str| -> Row {
        vec![
            Value::Int(id),
            Value::from(title),
            Value::from(author),
            Value::from(category),
        ]
    };
    let member = |id: i64, name: &str, email: &str| -> Row {
        vec![Value::Int(id), Value::from(name), Value::from(email)]
    };
    let loan = |id: i64, book_id: i64, member_id: i64, loaned: &str, returned: Option<&str>| -> Row {
        vec![
            Value::Int(id),
            Value::Int(book_id),
            Value::Int(member_id),
            Value::from(loaned),
            Value::from(returned),
        ]
    };

    vec![
        SeedTable {
            name: "books",
            columns: vec![
                ColumnDef::new("id", "INTEGER").with("PRIMARY KEY"),
                ColumnDef::new("title", "TEXT"),
                ColumnDef::new("author", "TEXT"),
                ColumnDef::new("category", "TEXT"),
            ],
            rows: vec![
                book(101, "Data Science 101", "A. Smith", "Science"),
                book(102, "SQL Mastery", "B. Jones", "Informatique"),
                book(103, "Python Basics", "C. Hall", "Informatique"),
                book(104, "Deep Learning", "D. King", "Science"),
            ],
        },
        SeedTable {
            name: "members",
            columns: vec![
                ColumnDef::new("id", "INTEGER").with("PRIMARY KEY"),
                ColumnDef::new("name", "TEXT"),
                ColumnDef::new("email", "TEXT"),
            ],
            rows: vec![
                member(1, "Alex Durand", "alex.durand@example.com"),
                member(2, "Emma Leroy", "emma.leroy@example.com"),
                member(3, "Marc Riviere", "marc.riviere@example.com"),
            ],
        },
        SeedTable {
            name: "loans",
            columns: vec![
                ColumnDef::new("id", "INTEGER").with("PRIMARY KEY"),
                ColumnDef::new("book_id", "INTEGER").with("REFERENCES books(id)"),
                ColumnDef::new("member_id", "INTEGER").with("REFERENCES members(id)"),
                ColumnDef::new("loan_date", "DATE"),
                ColumnDef::new("return_date", "DATE"),
            ],
            rows: vec![
                loan(1, 101, 1, "2023-01-01", Some("2023-01-15")),
                loan(2, 103, 2, "2023-01-05", Some("2023-01-20")),
                loan(3, 102, 1, "2023-01-10", None),
            ],
        },
    ]
}
