#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-column semantic type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Float64,
    Int64,
    Utf8,
    Bool,
    Date,
    Undefined,
}

impl DType {
    /// Whether arithmetic and numeric reductions are defined for this tag.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Float64 | Self::Int64 | Self::Bool | Self::Undefined)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Float64 => "float64",
            Self::Int64 => "int64",
            Self::Utf8 => "string",
            Self::Bool => "boolean",
            Self::Date => "datetime",
            Self::Undefined => "undefined",
        };
        f.write_str(tag)
    }
}

impl FromStr for DType {
    type Err = TypeError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "float" | "float32" | "float64" => Ok(Self::Float64),
            "int" | "int32" | "int64" => Ok(Self::Int64),
            "string" | "str" | "utf8" => Ok(Self::Utf8),
            "bool" | "boolean" => Ok(Self::Bool),
            "date" | "datetime" => Ok(Self::Date),
            "undefined" => Ok(Self::Undefined),
            _ => Err(TypeError::UnknownDtype {
                tag: tag.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullKind {
    Null,
    NaN,
}

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Scalar {
    Null(NullKind),
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Utf8(String),
}

impl Scalar {
    /// The padding value used wherever a cell has no source.
    #[must_use]
    pub fn nan() -> Self {
        Self::Null(NullKind::NaN)
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null(_) => true,
            Self::Float64(v) => v.is_nan(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_nan(&self) -> bool {
        matches!(self, Self::Null(NullKind::NaN)) || matches!(self, Self::Float64(v) if v.is_nan())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null(_))
    }

    #[must_use]
    pub fn semantic_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (a, b) if a.is_missing() && b.is_missing() => true,
            (Self::Float64(a), Self::Int64(b)) | (Self::Int64(b), Self::Float64(a)) => {
                *a == *b as f64
            }
            _ => self == other,
        }
    }

    #[must_use]
    pub fn coalesce(&self, other: &Self) -> Self {
        if self.is_missing() {
            other.clone()
        } else {
            self.clone()
        }
    }

    pub fn to_f64(&self) -> Result<f64, TypeError> {
        match self {
            Self::Bool(v) => Ok(if *v { 1.0 } else { 0.0 }),
            Self::Int64(v) => Ok(*v as f64),
            Self::Float64(v) => Ok(*v),
            Self::Null(kind) => Err(TypeError::ValueIsMissing { kind: *kind }),
            Self::Utf8(v) => Err(TypeError::NonNumericValue { value: v.clone() }),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(v) => Some(v),
            _ => None,
        }
    }
}

/// Renders the way composite keys and default labels expect: integral
/// floats print without a fractional part and missing cells print `NaN`.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null(_) => f.write_str("NaN"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) if v.is_nan() => f.write_str("NaN"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Utf8(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Utf8(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Utf8(value)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypeError {
    #[error("unsupported dtype tag '{tag}'")]
    UnknownDtype { tag: String },
    #[error("cannot cast {value} to {to}")]
    InvalidCast { value: String, to: DType },
    #[error("value {value:?} is not numeric")]
    NonNumericValue { value: String },
    #[error("value is missing ({kind:?})")]
    ValueIsMissing { kind: NullKind },
}

// ── Dtype inference ────────────────────────────────────────────────────

/// Class of a single sampled value. Missing cells count as `Float`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueClass {
    Bool,
    Float,
    Int,
    Date,
    Str,
}

fn classify(value: &Scalar) -> ValueClass {
    match value {
        Scalar::Bool(_) => ValueClass::Bool,
        Scalar::Null(_) | Scalar::Float64(_) => ValueClass::Float,
        Scalar::Int64(_) => ValueClass::Int,
        Scalar::Utf8(text) => classify_text(text),
    }
}

fn classify_text(text: &str) -> ValueClass {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return ValueClass::Float;
    }
    if is_date_like(trimmed) {
        return ValueClass::Date;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => {
            if trimmed.contains(['.', 'e', 'E']) {
                ValueClass::Float
            } else {
                ValueClass::Int
            }
        }
        _ => ValueClass::Str,
    }
}

/// ISO dates, ISO date-times (with `T` or a space) and RFC 3339 timestamps.
#[must_use]
pub fn is_date_like(text: &str) -> bool {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
        || NaiveDate::parse_from_str(text, "%Y/%m/%d").is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").is_ok()
        || DateTime::parse_from_rfc3339(text).is_ok()
}

/// Infer a column dtype from at most `sample_limit` leading values. A
/// limit of 0 samples one value.
///
/// Priority is string > float > int > boolean > date > undefined: one text
/// value makes the column `Utf8`, one missing or fractional value makes a
/// numeric column `Float64`.
#[must_use]
pub fn infer_dtype(values: &[Scalar], sample_limit: usize) -> DType {
    let mut seen = [false; 5];
    for value in values.iter().take(sample_limit.max(1)) {
        let slot = match classify(value) {
            ValueClass::Str => 0,
            ValueClass::Float => 1,
            ValueClass::Int => 2,
            ValueClass::Bool => 3,
            ValueClass::Date => 4,
        };
        seen[slot] = true;
    }

    const ORDER: [DType; 5] = [
        DType::Utf8,
        DType::Float64,
        DType::Int64,
        DType::Bool,
        DType::Date,
    ];
    seen.iter()
        .zip(ORDER)
        .find_map(|(hit, dtype)| hit.then_some(dtype))
        .unwrap_or(DType::Undefined)
}

/// Infer one dtype per column of a row-major block, sampling at most
/// `sample_limit` rows.
#[must_use]
pub fn infer_row_dtypes(rows: &[Vec<Scalar>], width: usize, sample_limit: usize) -> Vec<DType> {
    let sample_len = rows.len().min(sample_limit.max(1));
    transpose(&rows[..sample_len], width)
        .iter()
        .map(|column| infer_dtype(column, sample_limit))
        .collect()
}

/// Cast a scalar to a target dtype. Missing values stay missing.
pub fn cast_scalar(value: &Scalar, target: DType) -> Result<Scalar, TypeError> {
    if value.is_missing() {
        return Ok(Scalar::nan());
    }
    let invalid = || TypeError::InvalidCast {
        value: value.to_string(),
        to: target,
    };

    match target {
        DType::Float64 => match value {
            Scalar::Utf8(text) => text
                .trim()
                .parse::<f64>()
                .map(Scalar::Float64)
                .map_err(|_| invalid()),
            other => other.to_f64().map(Scalar::Float64),
        },
        DType::Int64 => match value {
            Scalar::Int64(v) => Ok(Scalar::Int64(*v)),
            Scalar::Bool(v) => Ok(Scalar::Int64(i64::from(*v))),
            Scalar::Float64(v) => {
                if !v.is_finite() || *v != v.trunc() || v.abs() > i64::MAX as f64 {
                    return Err(invalid());
                }
                Ok(Scalar::Int64(*v as i64))
            }
            Scalar::Utf8(text) => text
                .trim()
                .parse::<i64>()
                .map(Scalar::Int64)
                .map_err(|_| invalid()),
            Scalar::Null(_) => Err(invalid()),
        },
        DType::Bool => match value {
            Scalar::Bool(v) => Ok(Scalar::Bool(*v)),
            Scalar::Int64(0) => Ok(Scalar::Bool(false)),
            Scalar::Int64(1) => Ok(Scalar::Bool(true)),
            Scalar::Float64(v) if *v == 0.0 => Ok(Scalar::Bool(false)),
            Scalar::Float64(v) if *v == 1.0 => Ok(Scalar::Bool(true)),
            Scalar::Utf8(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Scalar::Bool(true)),
                "false" => Ok(Scalar::Bool(false)),
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        },
        DType::Utf8 => Ok(Scalar::Utf8(value.to_string())),
        DType::Date => match value {
            Scalar::Utf8(text) if is_date_like(text.trim()) => Ok(value.clone()),
            _ => Err(invalid()),
        },
        DType::Undefined => Err(invalid()),
    }
}

// ── Array helpers ──────────────────────────────────────────────────────

/// Row-major to column-major. Rows shorter than `width` are padded with NaN.
#[must_use]
pub fn transpose(rows: &[Vec<Scalar>], width: usize) -> Vec<Vec<Scalar>> {
    let mut columns: Vec<Vec<Scalar>> = (0..width)
        .map(|_| Vec::with_capacity(rows.len()))
        .collect();
    for row in rows {
        for (idx, column) in columns.iter_mut().enumerate() {
            column.push(row.get(idx).cloned().unwrap_or_else(Scalar::nan));
        }
    }
    columns
}

/// First item that occurs more than once, in encounter order.
#[must_use]
pub fn first_duplicate<T: Eq + Hash>(items: &[T]) -> Option<&T> {
    let mut seen = HashSet::with_capacity(items.len());
    items.iter().find(|item| !seen.insert(*item))
}

/// Deduplicate while keeping first-seen order.
#[must_use]
pub fn unique_in_order<T: Eq + Hash + Clone>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

/// Separator between key cells in a composite key.
pub const KEY_SEPARATOR: &str = "_";

/// Join the display form of each key cell with [`KEY_SEPARATOR`]. Cells
/// that render alike (`5` and `"5"`) produce the same key.
#[must_use]
pub fn composite_key<'a>(cells: impl IntoIterator<Item = &'a Scalar>) -> String {
    let mut key = String::new();
    for (pos, cell) in cells.into_iter().enumerate() {
        if pos > 0 {
            key.push_str(KEY_SEPARATOR);
        }
        key.push_str(&cell.to_string());
    }
    key
}

/// `"0"`, `"1"`, ... used when a frame is built without column names.
#[must_use]
pub fn default_column_names(count: usize) -> Vec<String> {
    (0..count).map(|idx| idx.to_string()).collect()
}

// ── Missingness utilities ──────────────────────────────────────────────

/// `true` for each missing cell.
pub fn isna(values: &[Scalar]) -> Vec<bool> {
    values.iter().map(Scalar::is_missing).collect()
}

/// Replace missing cells with `fill`.
pub fn fill_na(values: &[Scalar], fill: &Scalar) -> Vec<Scalar> {
    values.iter().map(|v| v.coalesce(fill)).collect()
}
