//! Statement classification and the learner mutation policy.
//!
//! Parses SQL and classifies statements as read-only, mutating or
//! destructive so that sessions configured to forbid changes to the sample
//! database can refuse a learner's statement before it reaches the engine.

mod classifier;

pub use classifier::{classify_sql, SqlClassifier};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Safety level classification for SQL statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SafetyLevel {
    /// Statements that only read data (SELECT, VALUES, EXPLAIN).
    ReadOnly,
    /// Statements that modify rows or connection settings (INSERT, UPDATE, PRAGMA).
    Mutating,
    /// Statements that delete data or change the schema
    /// (DELETE, DROP, ALTER, CREATE), plus anything unrecognised.
    Destructive,
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "Read-only"),
            Self::Mutating => write!(f, "Mutating"),
            Self::Destructive => write!(f, "Destructive"),
        }
    }
}

/// The type of SQL statement detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Drop,
    Alter,
    Create,
    Explain,
    Pragma,
    With,
    /// Multiple statements detected; contains the most dangerous type.
    Multiple(Box<StatementType>),
    /// Statement type could not be determined.
    Unknown,
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Drop => write!(f, "DROP"),
            Self::Alter => write!(f, "ALTER"),
            Self::Create => write!(f, "CREATE"),
            Self::Explain => write!(f, "EXPLAIN"),
            Self::Pragma => write!(f, "PRAGMA"),
            Self::With => write!(f, "WITH (CTE)"),
            Self::Multiple(inner) => write!(f, "Multiple ({})", inner),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Result of classifying a SQL string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// The determined safety level.
    pub level: SafetyLevel,
    /// The type of statement(s) detected.
    pub statement_type: StatementType,
    /// Parser diagnostic when the text could not be parsed.
    pub parse_error: Option<String>,
}

impl Classification {
    /// Creates a new classification result.
    pub fn new(level: SafetyLevel, statement_type: StatementType) -> Self {
        Self {
            level,
            statement_type,
            parse_error: None,
        }
    }

    /// Creates the classification used for text that could not be parsed.
    pub fn unparseable(error: impl Into<String>) -> Self {
        Self {
            level: SafetyLevel::Destructive,
            statement_type: StatementType::Unknown,
            parse_error: Some(error.into()),
        }
    }

    /// Returns true if the statement cannot change the database.
    pub fn is_read_only(&self) -> bool {
        self.level == SafetyLevel::ReadOnly
    }
}

/// Whether learner statements may change the session database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPolicy {
    /// Every statement runs; changes persist for the rest of the session.
    #[default]
    Allow,
    /// Only statements classified as read-only run.
    Reject,
}

impl MutationPolicy {
    /// Checks a statement against the policy.
    ///
    /// Returns a learner-facing explanation when the statement is refused.
    pub fn check(&self, sql: &str) -> std::result::Result<(), String> {
        match self {
            Self::Allow => Ok(()),
            Self::Reject => {
                let classification = classify_sql(sql);
                if classification.is_read_only() {
                    return Ok(());
                }
                Err(match classification.parse_error {
                    Some(error) => format!(
                        "Statement rejected: only read-only queries are allowed and this one could not be parsed ({error})"
                    ),
                    None => format!(
                        "Statement rejected: {} statements are not allowed in read-only mode ({})",
                        classification.statement_type, classification.level
                    ),
                })
            }
        }
    }
}

impl fmt::Display for MutationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Reject => write!(f, "reject"),
        }
    }
}
