//! Command-line argument parsing for the SQL tutor.
//!
//! Uses clap derive with one subcommand per learner action.

use crate::catalog::Level;
use crate::config::Config;
use crate::provision::SampleSchema;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Output format for grading results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable verdict and result table.
    #[default]
    Text,
    /// The verdict serialized as JSON.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Learn SQL against small sample databases.
#[derive(Parser, Debug)]
#[command(name = "sqltutor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", env = "SQL_TUTOR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Identifies one exercise of the catalog.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ExerciseRef {
    /// Difficulty tier (beginner, intermediate, advanced)
    #[arg(short, long, value_name = "LEVEL")]
    pub level: Level,

    /// Exercise title (case-insensitive)
    #[arg(short, long, value_name = "TITLE")]
    pub exercise: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one SQL statement and print its result
    Run {
        /// The SQL to run ("-" reads it from stdin)
        #[arg(value_name = "SQL")]
        sql: String,

        /// Sample database to run against
        #[arg(short, long, value_name = "SCHEMA")]
        schema: Option<SampleSchema>,
    },

    /// Grade an answer to an exercise
    Check {
        #[command(flatten)]
        target: ExerciseRef,

        /// Your answer ("-" reads it from stdin)
        #[arg(value_name = "SQL")]
        sql: String,

        /// Output format (text or json)
        #[arg(long, value_name = "FORMAT", default_value = "text")]
        format: OutputFormat,
    },

    /// List the available exercises
    Exercises {
        /// Only list this tier
        #[arg(short, long, value_name = "LEVEL")]
        level: Option<Level>,
    },

    /// Show the hint for an exercise
    Hint {
        #[command(flatten)]
        target: ExerciseRef,
    },

    /// Show the reference solution for an exercise
    Solution {
        #[command(flatten)]
        target: ExerciseRef,
    },

    /// Show a sample database's tables, relationships and data
    Schema {
        /// Sample database to describe
        #[arg(value_name = "SCHEMA")]
        schema: Option<SampleSchema>,
    },

    /// Take the multiple-choice quiz
    Quiz {
        /// Seed for the question order
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,
    },

    /// Interactive query tester
    Shell {
        /// Sample database to start with
        #[arg(short, long, value_name = "SCHEMA")]
        schema: Option<SampleSchema>,
    },
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }
}
