//! Grading of learner queries against reference answers.
//!
//! The checker runs both queries on the session database, the normalizer
//! makes their results comparable, and every outcome (including engine
//! failures) is reported as a [`Verdict`].

mod checker;
mod normalize;
mod verdict;

pub use checker::{Checker, ColumnNamePolicy, GradingOptions};
pub use normalize::{
    column_kinds, compare_rows, compare_values, normalize, ColumnKind, NormalizationError,
    NormalizedResult,
};
pub use verdict::Verdict;
