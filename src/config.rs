//! Configuration management for the SQL tutor.
//!
//! Handles loading configuration from a TOML file. Every setting has a
//! default, so a missing file or missing table is never an error.

use crate::error::{Result, TutorError};
use crate::grading::{ColumnNamePolicy, GradingOptions};
use crate::provision::SampleSchema;
use crate::safety::MutationPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// How learner queries are graded.
    #[serde(default)]
    pub grading: GradingConfig,

    /// Session defaults.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Grading configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GradingConfig {
    /// Whether column names may differ in letter case.
    pub column_names: ColumnNamePolicy,

    /// Whether learner statements may change the database.
    pub mutations: MutationPolicy,

    /// Per-statement timeout in seconds.
    pub query_timeout_secs: u64,

    /// Relative tolerance for comparing reals.
    pub float_tolerance: f64,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            column_names: ColumnNamePolicy::default(),
            mutations: MutationPolicy::default(),
            query_timeout_secs: crate::db::DEFAULT_QUERY_TIMEOUT_SECS,
            float_tolerance: 0.0,
        }
    }
}

impl GradingConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Options handed to the checker.
    pub fn options(&self) -> GradingOptions {
        GradingOptions {
            column_names: self.column_names,
            float_tolerance: self.float_tolerance,
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Sample database loaded when a session opens.
    pub default_schema: SampleSchema,

    /// Maximum rows printed for a result table.
    pub max_display_rows: usize,

    /// Exercise catalog replacing the built-in one.
    pub catalog: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_schema: SampleSchema::default(),
            max_display_rows: 100,
            catalog: None,
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sql-tutor")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| TutorError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            TutorError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let tolerance = self.grading.float_tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(TutorError::config(format!(
                "Configuration error in {}:\n  float_tolerance must be a non-negative number, got {tolerance}",
                path.display()
            )));
        }
        if self.grading.query_timeout_secs == 0 {
            return Err(TutorError::config(format!(
                "Configuration error in {}:\n  query_timeout_secs must be at least 1",
                path.display()
            )));
        }
        Ok(())
    }
}
