//! Error types for the SQL tutor.
//!
//! Defines the main error enum used throughout the application. Grading
//! itself never fails with these: every grading problem becomes a verdict.

use thiserror::Error;

/// Main error type for tutor operations.
#[derive(Error, Debug)]
pub enum TutorError {
    /// Query execution errors (syntax errors, unknown tables, timeouts, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Sample schema provisioning errors (rejected DDL, failed inserts, etc.)
    #[error("Provisioning error: {0}")]
    Provision(String),

    /// Configuration errors (invalid config file, unknown schema name, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Exercise or quiz catalog errors (unknown exercise, invalid catalog file, etc.)
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Terminal or file I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TutorError {
    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a provisioning error with the given message.
    pub fn provision(msg: impl Into<String>) -> Self {
        Self::Provision(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a catalog error with the given message.
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Query(_) => "Query Error",
            Self::Provision(_) => "Provisioning Error",
            Self::Config(_) => "Configuration Error",
            Self::Catalog(_) => "Catalog Error",
            Self::Io(_) => "I/O Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using TutorError.
pub type Result<T> = std::result::Result<T, TutorError>;
