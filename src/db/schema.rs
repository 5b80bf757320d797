//! Database schema types for the SQL tutor.
//!
//! Represents the structure of the loaded sample database: tables, columns
//! and the relationships between them.

use serde::{Deserialize, Serialize};

/// Represents the complete schema of a database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// All tables in the schema.
    pub tables: Vec<Table>,

    /// Foreign key relationships between tables.
    pub foreign_keys: Vec<ForeignKey>,
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the table with the given name, if present.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|table| table.name.eq_ignore_ascii_case(name))
    }

    /// Formats the schema as a textual diagram for learners.
    ///
    /// Each table lists its columns with their declared types; primary and
    /// foreign keys are annotated inline.
    pub fn format_for_display(&self) -> String {
        let tables_text = self
            .tables
            .iter()
            .map(|table| self.format_table(table))
            .collect::<Vec<_>>()
            .join("");

        let relationships_text = if self.foreign_keys.is_empty() {
            String::new()
        } else {
            let fk_lines = self
                .foreign_keys
                .iter()
                .map(|fk| {
                    format!(
                        "  - {}.{} -> {}.{}\n",
                        fk.from_table,
                        fk.from_columns.join(", "),
                        fk.to_table,
                        fk.to_columns.join(", ")
                    )
                })
                .collect::<Vec<_>>()
                .join("");
            format!("Relationships:\n{}", fk_lines)
        };

        format!("Database Schema:\n\n{}{}", tables_text, relationships_text)
    }

    fn format_table(&self, table: &Table) -> String {
        let column_lines = table
            .columns
            .iter()
            .map(|column| self.format_column(table, column))
            .collect::<Vec<_>>()
            .join("");

        format!("Table: {}\n{}\n", table.name, column_lines)
    }

    fn format_column(&self, table: &Table, column: &Column) -> String {
        let fk_refs = self
            .foreign_keys
            .iter()
            .filter(|fk| fk.from_table == table.name && fk.from_columns.contains(&column.name))
            .map(|fk| {
                format!(
                    "FK -> {}.{}",
                    fk.to_table,
                    fk.to_columns.first().map(String::as_str).unwrap_or("")
                )
            });

        let annotations = table
            .primary_key
            .contains(&column.name)
            .then(|| "PK".to_string())
            .into_iter()
            .chain((!column.is_nullable).then(|| "NOT NULL".to_string()))
            .chain(fk_refs)
            .collect::<Vec<_>>();

        let data_type = if column.data_type.is_empty() {
            "ANY"
        } else {
            column.data_type.as_str()
        };

        if annotations.is_empty() {
            format!("  - {}: {}\n", column.name, data_type)
        } else {
            format!(
                "  - {}: {} ({})\n",
                column.name,
                data_type,
                annotations.join(", ")
            )
        }
    }
}

/// Represents a database table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Columns in the table, in declaration order.
    pub columns: Vec<Column>,

    /// Column names that form the primary key.
    pub primary_key: Vec<String>,
}

impl Table {
    /// Creates a new table with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }
}

/// Represents a column in a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Declared type (e.g., "INTEGER", "TEXT").
    pub data_type: String,

    /// Whether the column allows NULL values.
    pub is_nullable: bool,

    /// Default value expression, if any.
    pub default: Option<String>,
}

impl Column {
    /// Creates a new column with the given name and data type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default: None,
        }
    }

    /// Sets whether the column is nullable.
    pub fn nullable(self, nullable: bool) -> Self {
        Self {
            is_nullable: nullable,
            ..self
        }
    }
}

/// Represents a foreign key relationship between tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Source table name.
    pub from_table: String,

    /// Source column names.
    pub from_columns: Vec<String>,

    /// Target table name.
    pub to_table: String,

    /// Target column names.
    pub to_columns: Vec<String>,
}

impl ForeignKey {
    /// Creates a new foreign key relationship.
    pub fn new(
        from_table: impl Into<String>,
        from_columns: Vec<String>,
        to_table: impl Into<String>,
        to_columns: Vec<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_columns,
            to_table: to_table.into(),
            to_columns,
        }
    }
}
