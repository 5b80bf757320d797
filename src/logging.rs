//! Logging configuration for the SQL tutor.
//!
//! Logs go to stderr by default so they never mix with results printed on
//! stdout. `RUST_LOG` overrides the level chosen here.

use std::fs::{self, File};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Returns the default filter directive.
///
/// Quiet by default so interactive output stays clean.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "sql_tutor=debug,sqltutor=debug,warn"
    } else {
        "warn"
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Initializes logging to stderr.
pub fn init_stderr_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .init();
}

/// Initializes logging to a file.
///
/// Falls back to stderr when the file cannot be created.
pub fn init_file_logging(path: &Path, verbose: bool) {
    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            init_stderr_logging(verbose);
            return;
        }
    }

    let log_file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            init_stderr_logging(verbose);
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(log_file)
        .with_ansi(false) // No ANSI colors in file output
        .init();
}
