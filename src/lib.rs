//! SQL Tutor - graded SQL exercises against in-memory sample databases.
//!
//! This library exposes the core modules for use by the binary and the
//! integration tests.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod grading;
pub mod logging;
pub mod provision;
pub mod query;
pub mod quiz;
pub mod render;
pub mod safety;
pub mod session;
