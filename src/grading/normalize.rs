//! Result normalization.
//!
//! Brings a result set into canonical form so it can be compared with a
//! reference: values are coerced column by column to the reference's column
//! kinds, then rows are sorted using every column as a composite key.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

use crate::db::{QueryResult, Row, Value, ValueKind};

/// Canonical type of a result column, inferred from the values it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Only NULLs, or a mix that has no common type. Values are left alone.
    Unknown,
    Integer,
    /// Reals, or integers mixed with reals.
    Real,
    Text,
    Blob,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "ANY"),
            Self::Integer => write!(f, "INTEGER"),
            Self::Real => write!(f, "REAL"),
            Self::Text => write!(f, "TEXT"),
            Self::Blob => write!(f, "BLOB"),
        }
    }
}

/// Why a result could not be brought into canonical form.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NormalizationError {
    #[error("value {value} in column '{column}' (row {row}) cannot be read as {kind}")]
    Coercion {
        column: String,
        row: usize,
        value: String,
        kind: ColumnKind,
    },

    #[error("column '{column}' holds a value that cannot be ordered")]
    Unordered { column: String },
}

/// A result set in canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Infers the canonical kind of every column of a result.
pub fn column_kinds(result: &QueryResult) -> Vec<ColumnKind> {
    (0..result.columns.len())
        .map(|index| {
            let kinds = result
                .rows
                .iter()
                .filter_map(|row| row.get(index))
                .map(Value::kind)
                .filter(|kind| *kind != ValueKind::Null);
            infer_kind(kinds)
        })
        .collect()
}

fn infer_kind(kinds: impl Iterator<Item = ValueKind>) -> ColumnKind {
    let mut inferred = ColumnKind::Unknown;
    let mut first = true;

    for kind in kinds {
        let this = match kind {
            ValueKind::Integer => ColumnKind::Integer,
            ValueKind::Real => ColumnKind::Real,
            ValueKind::Text => ColumnKind::Text,
            ValueKind::Blob => ColumnKind::Blob,
            ValueKind::Null => continue,
        };

        if first {
            inferred = this;
            first = false;
            continue;
        }

        inferred = match (inferred, this) {
            (a, b) if a == b => a,
            (ColumnKind::Integer, ColumnKind::Real) | (ColumnKind::Real, ColumnKind::Integer) => {
                ColumnKind::Real
            }
            _ => return ColumnKind::Unknown,
        };
    }

    inferred
}

/// Normalizes a result against the given column kinds.
///
/// Coercion is positional: the i-th kind applies to the i-th column. Rows
/// are then sorted lexicographically, NULL first, then numbers, text and
/// blobs.
pub fn normalize(
    result: &QueryResult,
    kinds: &[ColumnKind],
) -> Result<NormalizedResult, NormalizationError> {
    let columns = result.column_names();

    let mut rows = Vec::with_capacity(result.rows.len());
    for (row_index, row) in result.rows.iter().enumerate() {
        let coerced = row
            .iter()
            .enumerate()
            .map(|(col, value)| {
                let kind = kinds.get(col).copied().unwrap_or(ColumnKind::Unknown);
                coerce(value, kind).ok_or_else(|| NormalizationError::Coercion {
                    column: column_label(&columns, col),
                    row: row_index + 1,
                    value: describe(value),
                    kind,
                })
            })
            .collect::<Result<Row, _>>()?;
        rows.push(coerced);
    }

    for row in &rows {
        if let Some(col) = row
            .iter()
            .position(|value| matches!(value, Value::Float(f) if f.is_nan()))
        {
            return Err(NormalizationError::Unordered {
                column: column_label(&columns, col),
            });
        }
    }

    rows.sort_by(|a, b| compare_rows(a, b));

    Ok(NormalizedResult { columns, rows })
}

/// Coerces a value toward a column kind. Returns None when that is impossible.
fn coerce(value: &Value, kind: ColumnKind) -> Option<Value> {
    if value.is_null() || kind == ColumnKind::Unknown {
        return Some(value.clone());
    }

    match (kind, value) {
        (ColumnKind::Integer, Value::Int(_)) => Some(value.clone()),
        (ColumnKind::Integer, Value::Float(f)) => integral(*f).map(Value::Int),
        (ColumnKind::Integer, Value::Text(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
                .map(Value::Int)
        }

        (ColumnKind::Real, Value::Int(i)) => Some(Value::Float(*i as f64)),
        (ColumnKind::Real, Value::Float(_)) => Some(value.clone()),
        (ColumnKind::Real, Value::Text(s)) => s.trim().parse::<f64>().ok().map(Value::Float),

        (ColumnKind::Text, Value::Text(_)) => Some(value.clone()),
        (ColumnKind::Text, Value::Int(i)) => Some(Value::Text(i.to_string())),
        (ColumnKind::Text, Value::Float(f)) => Some(Value::Text(format!("{f:?}"))),

        (ColumnKind::Blob, Value::Blob(_)) => Some(value.clone()),
        (ColumnKind::Blob, Value::Text(s)) => Some(Value::Blob(s.as_bytes().to_vec())),

        _ => None,
    }
}

/// Returns the integer a float represents exactly, if any.
fn integral(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound.
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn column_label(columns: &[String], index: usize) -> String {
    columns
        .get(index)
        .cloned()
        .unwrap_or_else(|| format!("#{}", index + 1))
}

fn describe(value: &Value) -> String {
    match value {
        Value::Text(s) => format!("'{s}'"),
        other => other.to_display_string(),
    }
}

/// Orders two rows lexicographically, column by column.
pub fn compare_rows(a: &[Value], b: &[Value]) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| compare_values(x, y))
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

/// Orders two values: NULL, then numbers, then text, then blobs.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::Text(_) => 2,
            Value::Blob(_) => 3,
        }
    }

    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => x.total_cmp(y),
        (Value::Int(x), Value::Float(y)) => compare_int_float(*x, *y),
        (Value::Float(x), Value::Int(y)) => compare_int_float(*y, *x).reverse(),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Blob(x), Value::Blob(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Exact integer/float ordering, so that integers beyond 2^53 stay
/// distinct from the float they round to.
fn compare_int_float(int: i64, float: f64) -> Ordering {
    // 2^63, one past i64::MAX
    const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

    match (int as f64).total_cmp(&float) {
        Ordering::Equal if float >= I64_LIMIT => Ordering::Less,
        // the float is integral and in range here
        Ordering::Equal => int.cmp(&(float as i64)),
        ordering => ordering,
    }
}
