use std::borrow::Cow;
use std::fmt;

use lf_config::FrameConfig;
use lf_index::{Index, IndexLabel};
use lf_types::{
    DType, Scalar, TypeError, default_column_names, first_duplicate, infer_dtype,
    infer_row_dtypes,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::FrameError;
use crate::storage::{FrameStorage, StorageLayout};

/// Which concrete frame an [`NDFrame`] backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    Series,
    DataFrame,
}

impl FrameKind {
    #[must_use]
    pub fn ndim(self) -> usize {
        match self {
            Self::Series => 1,
            Self::DataFrame => 2,
        }
    }
}

/// Accepted construction shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameInput {
    Empty,
    /// One column.
    Flat(Vec<Scalar>),
    /// Rows of equal width.
    Rows(Vec<Vec<Scalar>>),
    /// One record per row; names come from the first record.
    Records(Vec<Vec<(String, Scalar)>>),
    /// Named columns of equal length.
    ColumnMap(Vec<(String, Vec<Scalar>)>),
}

impl From<Vec<Scalar>> for FrameInput {
    fn from(values: Vec<Scalar>) -> Self {
        Self::Flat(values)
    }
}

impl From<Vec<Vec<Scalar>>> for FrameInput {
    fn from(rows: Vec<Vec<Scalar>>) -> Self {
        Self::Rows(rows)
    }
}

fn json_cell(value: &Value) -> Option<Scalar> {
    match value {
        Value::Null => Some(Scalar::nan()),
        Value::Bool(v) => Some(Scalar::Bool(*v)),
        Value::Number(n) => Some(match n.as_i64() {
            Some(v) => Scalar::Int64(v),
            None => Scalar::Float64(n.as_f64().unwrap_or(f64::NAN)),
        }),
        Value::String(text) => Some(Scalar::Utf8(text.clone())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn json_cells(items: &[Value]) -> Option<Vec<Scalar>> {
    items.iter().map(json_cell).collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl FrameInput {
    /// Recognize the construction shape of a JSON document.
    ///
    /// `null` and `[]` are empty; an array of scalars is one column; an array
    /// of arrays is rows; an array of objects is records; an object of arrays
    /// is a column map. JSON `null` cells become NaN.
    pub fn from_json(value: &Value) -> Result<Self, FrameError> {
        match value {
            Value::Null => Ok(Self::Empty),
            Value::Array(items) if items.is_empty() => Ok(Self::Empty),
            Value::Array(items) => {
                if let Some(cells) = json_cells(items) {
                    return Ok(Self::Flat(cells));
                }
                if items.iter().all(Value::is_array) {
                    let rows = items
                        .iter()
                        .map(|item| item.as_array().and_then(|cells| json_cells(cells)))
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| {
                            FrameError::UnsupportedFormat(
                                "nested arrays must hold scalar cells".to_owned(),
                            )
                        })?;
                    return Ok(Self::Rows(rows));
                }
                if items.iter().all(Value::is_object) {
                    let records = items
                        .iter()
                        .map(|item| {
                            item.as_object().and_then(|fields| {
                                fields
                                    .iter()
                                    .map(|(name, cell)| json_cell(cell).map(|c| (name.clone(), c)))
                                    .collect::<Option<Vec<_>>>()
                            })
                        })
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| {
                            FrameError::UnsupportedFormat(
                                "record fields must be scalars".to_owned(),
                            )
                        })?;
                    return Ok(Self::Records(records));
                }
                Err(FrameError::UnsupportedFormat(
                    "array elements must be all scalars, all arrays or all objects".to_owned(),
                ))
            }
            Value::Object(fields) => {
                let columns = fields
                    .iter()
                    .map(|(name, column)| {
                        column
                            .as_array()
                            .and_then(|cells| json_cells(cells))
                            .map(|cells| (name.clone(), cells))
                    })
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| {
                        FrameError::UnsupportedFormat(
                            "object input must map column names to arrays of scalars".to_owned(),
                        )
                    })?;
                Ok(Self::ColumnMap(columns))
            }
            other => Err(FrameError::UnsupportedFormat(format!(
                "expected an array or an object of arrays, got {}",
                json_kind(other)
            ))),
        }
    }

    fn normalize(self) -> Result<Normalized, FrameError> {
        match self {
            Self::Empty => Ok(Normalized::default()),
            Self::Flat(values) if values.is_empty() => Ok(Normalized::default()),
            Self::Flat(values) => Ok(Normalized {
                rows: values.into_iter().map(|value| vec![value]).collect(),
                width: 1,
                names: None,
            }),
            Self::Rows(rows) => {
                let width = rows.first().map_or(0, Vec::len);
                check_row_widths(&rows, width)?;
                Ok(Normalized {
                    rows,
                    width,
                    names: None,
                })
            }
            Self::Records(records) => {
                let Some(first) = records.first() else {
                    return Ok(Normalized::default());
                };
                let names: Vec<String> = first.iter().map(|(name, _)| name.clone()).collect();
                let width = names.len();
                let mut rows = Vec::with_capacity(records.len());
                for record in records {
                    if record.len() != width {
                        return Err(FrameError::LengthMismatch {
                            what: "record field",
                            expected: width,
                            actual: record.len(),
                        });
                    }
                    rows.push(flatten_record(record, &names)?);
                }
                Ok(Normalized {
                    rows,
                    width,
                    names: Some(names),
                })
            }
            Self::ColumnMap(columns) => {
                let len = columns.first().map_or(0, |(_, cells)| cells.len());
                if let Some((_, cells)) = columns.iter().find(|(_, cells)| cells.len() != len) {
                    return Err(FrameError::LengthMismatch {
                        what: "column",
                        expected: len,
                        actual: cells.len(),
                    });
                }
                let width = columns.len();
                let mut rows = vec![Vec::with_capacity(width); len];
                let mut names = Vec::with_capacity(width);
                for (name, cells) in columns {
                    names.push(name);
                    for (row, cell) in rows.iter_mut().zip(cells) {
                        row.push(cell);
                    }
                }
                Ok(Normalized {
                    rows,
                    width,
                    names: Some(names),
                })
            }
        }
    }
}

#[derive(Debug, Default)]
struct Normalized {
    rows: Vec<Vec<Scalar>>,
    width: usize,
    names: Option<Vec<String>>,
}

fn check_row_widths(rows: &[Vec<Scalar>], width: usize) -> Result<(), FrameError> {
    match rows.iter().find(|row| row.len() != width) {
        Some(row) => Err(FrameError::LengthMismatch {
            what: "row",
            expected: width,
            actual: row.len(),
        }),
        None => Ok(()),
    }
}

/// Cells of `record` in the order of `names`. A record that lacks one of
/// the names fails with `ColumnNotFound`.
fn flatten_record(
    mut record: Vec<(String, Scalar)>,
    names: &[String],
) -> Result<Vec<Scalar>, FrameError> {
    names
        .iter()
        .map(|name| {
            let pos = record
                .iter()
                .position(|(key, _)| key == name)
                .ok_or_else(|| FrameError::ColumnNotFound(name.clone()))?;
            Ok(std::mem::replace(&mut record[pos].1, Scalar::nan()))
        })
        .collect()
}

fn check_unique_columns(columns: &[String]) -> Result<(), FrameError> {
    match first_duplicate(columns) {
        Some(name) => Err(FrameError::DuplicateColumn(name.clone())),
        None => Ok(()),
    }
}

/// Optional overrides applied at construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOptions {
    pub index: Option<Vec<IndexLabel>>,
    pub columns: Option<Vec<String>>,
    pub dtypes: Option<Vec<DType>>,
    pub config: Option<FrameConfig>,
}

impl FrameOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_index<L: Into<IndexLabel>>(mut self, labels: impl IntoIterator<Item = L>) -> Self {
        self.index = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_columns<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.columns = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_dtypes(mut self, dtypes: Vec<DType>) -> Self {
        self.dtypes = Some(dtypes);
        self
    }

    /// Parse dtype tags such as `"int32"` or `"string"`.
    pub fn with_dtype_tags(mut self, tags: &[&str]) -> Result<Self, FrameError> {
        let dtypes = tags
            .iter()
            .map(|tag| {
                tag.parse::<DType>().map_err(|err| match err {
                    TypeError::UnknownDtype { tag } => FrameError::UnsupportedDtype(tag),
                    other => FrameError::Type(other),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.dtypes = Some(dtypes);
        Ok(self)
    }

    #[must_use]
    pub fn with_config(mut self, config: FrameConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// Checks applied by [`NDFrame::set_values`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetValuesOptions {
    /// Reject a different row count. When off, a changed row count resets
    /// the index to `0..rows`.
    pub check_length: bool,
    /// Reject a different column count. When off, a changed column count
    /// resets column names to `"0".."n-1"`.
    pub check_column_count: bool,
}

impl Default for SetValuesOptions {
    fn default() -> Self {
        Self {
            check_length: true,
            check_column_count: true,
        }
    }
}

/// Both axes of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameAxes<'a> {
    pub index: &'a Index,
    pub columns: &'a [String],
}

/// The generic frame behind [`crate::Series`] and [`crate::DataFrame`].
///
/// Holds row-major cells (plus the column mirror when low-memory mode is
/// off), a unique index with one label per row, unique column names and one
/// dtype tag per column.
#[derive(Debug, Clone, PartialEq)]
pub struct NDFrame {
    storage: FrameStorage,
    index: Index,
    columns: Vec<String>,
    dtypes: Vec<DType>,
    config: FrameConfig,
    kind: FrameKind,
}

impl NDFrame {
    pub fn new(input: FrameInput, options: FrameOptions, kind: FrameKind) -> Result<Self, FrameError> {
        let FrameOptions {
            index,
            columns,
            dtypes,
            config,
        } = options;
        let config = config.unwrap_or_else(FrameConfig::global);
        let Normalized {
            rows,
            mut width,
            names,
        } = input.normalize()?;

        if rows.is_empty() && width == 0 {
            width = match (&columns, kind) {
                (Some(names), _) => names.len(),
                (None, FrameKind::Series) => 1,
                (None, FrameKind::DataFrame) => 0,
            };
        }
        if kind == FrameKind::Series && width != 1 {
            return Err(FrameError::LengthMismatch {
                what: "series column",
                expected: 1,
                actual: width,
            });
        }

        let columns = columns
            .or(names)
            .unwrap_or_else(|| default_column_names(width));
        if columns.len() != width {
            return Err(FrameError::LengthMismatch {
                what: "columns",
                expected: width,
                actual: columns.len(),
            });
        }
        let index = match index {
            Some(labels) => {
                if labels.len() != rows.len() {
                    return Err(FrameError::LengthMismatch {
                        what: "index",
                        expected: rows.len(),
                        actual: labels.len(),
                    });
                }
                Index::new(labels)?
            }
            None => Index::range(rows.len()),
        };
        Self::from_parts(rows, index, columns, dtypes, config, kind)
    }

    /// Assemble from already-shaped parts. Dtypes are inferred when `None`.
    pub(crate) fn from_parts(
        rows: Vec<Vec<Scalar>>,
        index: Index,
        columns: Vec<String>,
        dtypes: Option<Vec<DType>>,
        config: FrameConfig,
        kind: FrameKind,
    ) -> Result<Self, FrameError> {
        let width = columns.len();
        check_row_widths(&rows, width)?;
        check_unique_columns(&columns)?;
        if index.len() != rows.len() {
            return Err(FrameError::LengthMismatch {
                what: "index",
                expected: rows.len(),
                actual: index.len(),
            });
        }
        let dtypes = match dtypes {
            Some(dtypes) if dtypes.len() != width => {
                return Err(FrameError::LengthMismatch {
                    what: "dtypes",
                    expected: width,
                    actual: dtypes.len(),
                });
            }
            Some(dtypes) => dtypes,
            None => infer_row_dtypes(&rows, width, config.dtype_test_lim),
        };

        let layout = StorageLayout::for_config(&config);
        trace!(rows = rows.len(), columns = width, ?layout, ?kind, "building frame");
        Ok(Self {
            storage: FrameStorage::new(rows, width, layout),
            index,
            columns,
            dtypes,
            config,
            kind,
        })
    }

    // ── Accessors ──────────────────────────────────────────────────────

    /// `(rows, columns)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.storage.len(), self.storage.width())
    }

    #[must_use]
    pub fn nrows(&self) -> usize {
        self.storage.len()
    }

    #[must_use]
    pub fn ncols(&self) -> usize {
        self.storage.width()
    }

    #[must_use]
    pub fn values(&self) -> &[Vec<Scalar>] {
        self.storage.rows()
    }

    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn dtypes(&self) -> &[DType] {
        &self.dtypes
    }

    #[must_use]
    pub fn axis(&self) -> FrameAxes<'_> {
        FrameAxes {
            index: &self.index,
            columns: &self.columns,
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.nrows() * self.ncols()
    }

    #[must_use]
    pub fn ndim(&self) -> usize {
        self.kind.ndim()
    }

    #[must_use]
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    #[must_use]
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    #[must_use]
    pub fn layout(&self) -> StorageLayout {
        self.storage.layout()
    }

    /// Cells of the column at `pos`, borrowed from the mirror when present.
    pub fn column_values(&self, pos: usize) -> Result<Cow<'_, [Scalar]>, FrameError> {
        self.check_column_position(pos)?;
        Ok(self.storage.column(pos))
    }

    /// Column cells for a position already known to be in bounds.
    pub(crate) fn column_cells(&self, pos: usize) -> Cow<'_, [Scalar]> {
        self.storage.column(pos)
    }

    pub fn column_position(&self, name: &str) -> Result<usize, FrameError> {
        self.columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| FrameError::ColumnNotFound(name.to_owned()))
    }

    pub fn into_values(self) -> Vec<Vec<Scalar>> {
        self.storage.into_rows()
    }

    fn check_column_position(&self, pos: usize) -> Result<(), FrameError> {
        if pos >= self.ncols() {
            return Err(FrameError::PositionOutOfBounds {
                position: pos,
                len: self.ncols(),
            });
        }
        Ok(())
    }

    // ── Mutators ───────────────────────────────────────────────────────

    pub fn set_index(&mut self, labels: Vec<IndexLabel>) -> Result<(), FrameError> {
        if labels.len() != self.nrows() {
            return Err(FrameError::LengthMismatch {
                what: "index",
                expected: self.nrows(),
                actual: labels.len(),
            });
        }
        self.index = Index::new(labels)?;
        Ok(())
    }

    pub fn reset_index(&mut self) {
        self.index = Index::range(self.nrows());
    }

    pub fn set_column_names(&mut self, names: Vec<String>) -> Result<(), FrameError> {
        if names.len() != self.ncols() {
            return Err(FrameError::LengthMismatch {
                what: "columns",
                expected: self.ncols(),
                actual: names.len(),
            });
        }
        check_unique_columns(&names)?;
        self.columns = names;
        Ok(())
    }

    /// Replace the dtype tags without touching any cell.
    pub fn set_dtypes(&mut self, dtypes: Vec<DType>) -> Result<(), FrameError> {
        if dtypes.len() != self.ncols() {
            return Err(FrameError::LengthMismatch {
                what: "dtypes",
                expected: self.ncols(),
                actual: dtypes.len(),
            });
        }
        self.dtypes = dtypes;
        Ok(())
    }

    /// Replace every cell. Dtypes are re-inferred from the new rows.
    pub fn set_values(
        &mut self,
        rows: Vec<Vec<Scalar>>,
        options: SetValuesOptions,
    ) -> Result<(), FrameError> {
        let width = rows.first().map_or(self.ncols(), Vec::len);
        check_row_widths(&rows, width)?;
        if options.check_length && rows.len() != self.nrows() {
            return Err(FrameError::LengthMismatch {
                what: "rows",
                expected: self.nrows(),
                actual: rows.len(),
            });
        }
        if (options.check_column_count || self.kind == FrameKind::Series) && width != self.ncols()
        {
            return Err(FrameError::LengthMismatch {
                what: "columns",
                expected: self.ncols(),
                actual: width,
            });
        }

        let rows_changed = rows.len() != self.nrows();
        let width_changed = width != self.ncols();
        self.dtypes = infer_row_dtypes(&rows, width, self.config.dtype_test_lim);
        self.storage.set_rows(rows, width);
        if rows_changed {
            self.reset_index();
        }
        if width_changed {
            self.columns = default_column_names(width);
        }
        Ok(())
    }

    /// Replace the config snapshot, switching storage layout when the
    /// low-memory flag changes.
    pub fn set_config(&mut self, config: FrameConfig) {
        self.storage.set_layout(StorageLayout::for_config(&config));
        self.config = config;
    }

    /// Replace one column's cells and re-infer its dtype.
    pub fn set_column_values(&mut self, pos: usize, values: Vec<Scalar>) -> Result<(), FrameError> {
        self.check_column_position(pos)?;
        if values.len() != self.nrows() {
            return Err(FrameError::LengthMismatch {
                what: "column",
                expected: self.nrows(),
                actual: values.len(),
            });
        }
        self.dtypes[pos] = infer_dtype(&values, self.config.dtype_test_lim);
        self.storage.set_column(pos, values);
        Ok(())
    }

    /// Append a named column. A frame with neither rows nor columns adopts
    /// the column's length and a default index.
    pub(crate) fn push_column(&mut self, name: String, values: Vec<Scalar>) -> Result<(), FrameError> {
        if self.columns.contains(&name) {
            return Err(FrameError::DuplicateColumn(name));
        }
        let adopt = self.nrows() == 0 && self.ncols() == 0;
        if !adopt && values.len() != self.nrows() {
            return Err(FrameError::LengthMismatch {
                what: "column",
                expected: self.nrows(),
                actual: values.len(),
            });
        }
        self.dtypes
            .push(infer_dtype(&values, self.config.dtype_test_lim));
        self.columns.push(name);
        self.storage.push_column(values);
        if adopt {
            self.reset_index();
        }
        Ok(())
    }

    pub(crate) fn remove_column(&mut self, pos: usize) -> Result<Vec<Scalar>, FrameError> {
        self.check_column_position(pos)?;
        self.columns.remove(pos);
        self.dtypes.remove(pos);
        Ok(self.storage.remove_column(pos))
    }

    pub(crate) fn set_column_dtype(&mut self, pos: usize, dtype: DType) -> Result<(), FrameError> {
        self.check_column_position(pos)?;
        self.dtypes[pos] = dtype;
        Ok(())
    }

    // ── Subsetting ─────────────────────────────────────────────────────

    /// Rows at `positions`, keeping their labels and the column dtypes.
    pub(crate) fn take_rows(&self, positions: &[usize]) -> Result<Self, FrameError> {
        let len = self.nrows();
        let mut rows = Vec::with_capacity(positions.len());
        let mut labels = Vec::with_capacity(positions.len());
        for &pos in positions {
            let row = self
                .values()
                .get(pos)
                .ok_or(FrameError::PositionOutOfBounds { position: pos, len })?;
            rows.push(row.clone());
            labels.push(self.index.labels()[pos].clone());
        }
        Self::from_parts(
            rows,
            Index::new(labels)?,
            self.columns.clone(),
            Some(self.dtypes.clone()),
            self.config,
            self.kind,
        )
    }

    /// Columns at `positions`, in that order.
    pub(crate) fn take_columns(&self, positions: &[usize]) -> Result<Self, FrameError> {
        for &pos in positions {
            self.check_column_position(pos)?;
        }
        let rows = self
            .values()
            .iter()
            .map(|row| positions.iter().map(|&pos| row[pos].clone()).collect())
            .collect();
        let columns = positions.iter().map(|&pos| self.columns[pos].clone()).collect();
        let dtypes = positions.iter().map(|&pos| self.dtypes[pos]).collect();
        Self::from_parts(
            rows,
            self.index.clone(),
            columns,
            Some(dtypes),
            self.config,
            self.kind,
        )
    }
}

/// Plain-text table truncated to `table_max_row` rows and
/// `table_max_col_in_console` columns.
impl fmt::Display for NDFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let max_rows = self.config.table_max_row;
        let max_cols = self.config.table_max_col_in_console;
        let shown_cols = self.ncols().min(max_cols);
        let cols_truncated = self.ncols() > shown_cols;

        let mut grid: Vec<Vec<String>> = Vec::with_capacity(self.nrows().min(max_rows) + 1);
        let mut header = vec![String::new()];
        header.extend(self.columns[..shown_cols].iter().cloned());
        if cols_truncated {
            header.push("...".to_owned());
        }
        grid.push(header);
        for (label, row) in self.index.labels().iter().zip(self.values()).take(max_rows) {
            let mut line = vec![label.to_string()];
            line.extend(row[..shown_cols].iter().map(ToString::to_string));
            if cols_truncated {
                line.push("...".to_owned());
            }
            grid.push(line);
        }

        let widths: Vec<usize> = (0..grid[0].len())
            .map(|col| grid.iter().map(|line| line[col].len()).max().unwrap_or(0))
            .collect();
        for line in &grid {
            let cells: Vec<String> = line
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:>width$}"))
                .collect();
            writeln!(f, "{}", cells.join("  ").trim_end())?;
        }
        if self.nrows() > max_rows {
            writeln!(f, "...")?;
        }
        write!(f, "[{} rows x {} columns]", self.nrows(), self.ncols())
    }
}
