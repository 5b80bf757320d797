//! Query execution for learner and reference statements.
//!
//! Isolates policy enforcement, timing and logging from the grading and
//! session layers.

mod executor;

pub use executor::{QueryRunner, QuerySource};
