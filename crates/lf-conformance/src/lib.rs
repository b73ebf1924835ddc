#![forbid(unsafe_code)]

//! Reference fixtures and structural invariant checks shared by the
//! scenario and property suites.

use std::collections::HashSet;

use lf_frame::{DataFrame, Frame, FrameError, FrameInput, FrameOptions};
use lf_types::{Scalar, transpose};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("index has {labels} labels for {rows} rows")]
    IndexLength { labels: usize, rows: usize },
    #[error("{columns} column names and {dtypes} dtypes for {width} columns")]
    ColumnLength {
        columns: usize,
        dtypes: usize,
        width: usize,
    },
    #[error("row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("column name '{0}' is repeated")]
    DuplicateColumn(String),
    #[error("index label '{0}' is repeated")]
    DuplicateLabel(String),
    #[error("column {column} disagrees with the row-major cells at row {row}")]
    MirrorDrift { column: usize, row: usize },
    #[error("series shape has {0} columns")]
    SeriesWidth(usize),
}

/// Check every structural invariant a constructed frame must hold: label
/// and name counts, rectangular rows, uniqueness, and agreement between
/// column reads and the row-major cells.
pub fn check_frame_invariants(frame: &dyn Frame) -> Result<(), InvariantViolation> {
    let (rows, width) = frame.shape();
    if frame.index().len() != rows {
        return Err(InvariantViolation::IndexLength {
            labels: frame.index().len(),
            rows,
        });
    }
    if frame.columns().len() != width || frame.dtypes().len() != width {
        return Err(InvariantViolation::ColumnLength {
            columns: frame.columns().len(),
            dtypes: frame.dtypes().len(),
            width,
        });
    }
    if frame.ndim() == 1 && width != 1 {
        return Err(InvariantViolation::SeriesWidth(width));
    }
    for (row, cells) in frame.values().iter().enumerate() {
        if cells.len() != width {
            return Err(InvariantViolation::RaggedRow {
                row,
                expected: width,
                actual: cells.len(),
            });
        }
    }

    let mut names = HashSet::new();
    if let Some(name) = frame.columns().iter().find(|name| !names.insert(name.as_str())) {
        return Err(InvariantViolation::DuplicateColumn(name.clone()));
    }
    let mut labels = HashSet::new();
    if let Some(label) = frame.index().labels().iter().find(|label| !labels.insert(*label)) {
        return Err(InvariantViolation::DuplicateLabel(label.to_string()));
    }

    let expected = transpose(frame.values(), width);
    for (column, cells) in expected.iter().enumerate() {
        let Ok(actual) = frame.ndframe().column_values(column) else {
            return Err(InvariantViolation::MirrorDrift { column, row: 0 });
        };
        if actual.len() != cells.len() {
            return Err(InvariantViolation::MirrorDrift {
                column,
                row: actual.len().min(cells.len()),
            });
        }
        if let Some(row) = actual
            .iter()
            .zip(cells)
            .position(|(a, b)| !a.semantic_eq(b))
        {
            return Err(InvariantViolation::MirrorDrift { column, row });
        }
    }
    Ok(())
}

fn text_frame(columns: [&str; 4], rows: [[&str; 4]; 4]) -> Result<DataFrame, FrameError> {
    let rows = rows
        .iter()
        .map(|row| row.iter().map(|&cell| Scalar::from(cell)).collect())
        .collect();
    DataFrame::new(FrameInput::Rows(rows), FrameOptions::new().with_columns(columns))
}

/// Left side of the two-key merge fixture (`Key1, Key2, A, B`).
pub fn merge_left_fixture() -> Result<DataFrame, FrameError> {
    text_frame(
        ["Key1", "Key2", "A", "B"],
        [
            ["K0", "k0", "A0", "B0"],
            ["k0", "K1", "A1", "B1"],
            ["K1", "K0", "A2", "B2"],
            ["K2", "K2", "A3", "B3"],
        ],
    )
}

/// Right side of the two-key merge fixture (`Key1, Key2, A, D`).
pub fn merge_right_fixture() -> Result<DataFrame, FrameError> {
    text_frame(
        ["Key1", "Key2", "A", "D"],
        [
            ["K0", "k0", "C0", "D0"],
            ["K1", "K0", "C1", "D1"],
            ["K1", "K0", "C2", "D2"],
            ["K2", "K0", "C3", "D3"],
        ],
    )
}

/// Row-oriented records `[{a:1,b:2},{a:3,b:4}]`.
#[must_use]
pub fn records_fixture() -> Value {
    json!([{ "a": 1, "b": 2 }, { "a": 3, "b": 4 }])
}

/// Column-oriented object of parallel arrays.
#[must_use]
pub fn column_map_fixture() -> Value {
    json!({ "name": ["Alice", "Boy", "39"], "age": [30, 12, 39], "score": [1.5, 2.0, 3.25] })
}

/// Three frames for row-wise concat: `(a, b)`, then `(c)`, then `(a, b)`
/// again, with 2, 1 and 2 rows.
pub fn concat_backfill_fixtures() -> Result<[DataFrame; 3], FrameError> {
    let frame = |columns: Vec<(&str, Vec<i64>)>| {
        DataFrame::from_columns(
            columns
                .into_iter()
                .map(|(name, cells)| (name.to_owned(), cells.into_iter().map(Scalar::Int64).collect()))
                .collect(),
        )
    };
    Ok([
        frame(vec![("a", vec![1, 2]), ("b", vec![3, 4])])?,
        frame(vec![("c", vec![5])])?,
        frame(vec![("a", vec![6, 7]), ("b", vec![8, 9])])?,
    ])
}
