use std::borrow::Cow;
use std::fmt;

use lf_columnar::{
    ArithmeticOp, ColumnError, Reduction, binary_values, binary_with_scalar, compare_with_na_last,
};
use lf_config::FrameConfig;
use lf_index::{Index, IndexLabel};
use lf_types::{DType, Scalar, cast_scalar};
use serde_json::Value;

use crate::groupby::DataFrameGroupBy;
use crate::ndframe::{FrameInput, FrameKind, FrameOptions, NDFrame};
use crate::selection::{
    ColumnSelector, IColumnSelector, ILocSelector, LocSelector, resolve_columns,
    resolve_icolumns, resolve_iloc_rows, resolve_loc_rows,
};
use crate::series::Series;
use crate::{Axis, Frame, FrameError};

/// A two-dimensional labeled table.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    frame: NDFrame,
}

/// Right-hand side of a DataFrame arithmetic operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DataFrameOperand<'a> {
    Scalar(Scalar),
    /// Broadcast along the axis passed with the operation.
    Series(&'a Series),
    /// Element-wise against a frame of identical shape.
    Frame(&'a DataFrame),
}

impl From<Scalar> for DataFrameOperand<'_> {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<i64> for DataFrameOperand<'_> {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Int64(value))
    }
}

impl From<f64> for DataFrameOperand<'_> {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::Float64(value))
    }
}

impl<'a> From<&'a Series> for DataFrameOperand<'a> {
    fn from(value: &'a Series) -> Self {
        Self::Series(value)
    }
}

impl<'a> From<&'a DataFrame> for DataFrameOperand<'a> {
    fn from(value: &'a DataFrame) -> Self {
        Self::Frame(value)
    }
}

impl Frame for DataFrame {
    fn ndframe(&self) -> &NDFrame {
        &self.frame
    }

    fn ndframe_mut(&mut self) -> &mut NDFrame {
        &mut self.frame
    }
}

impl fmt::Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.frame, f)
    }
}

impl DataFrame {
    pub fn new(input: FrameInput, options: FrameOptions) -> Result<Self, FrameError> {
        NDFrame::new(input, options, FrameKind::DataFrame).map(|frame| Self { frame })
    }

    pub fn from_rows(rows: Vec<Vec<Scalar>>) -> Result<Self, FrameError> {
        Self::new(FrameInput::Rows(rows), FrameOptions::default())
    }

    pub fn from_records(records: Vec<Vec<(String, Scalar)>>) -> Result<Self, FrameError> {
        Self::new(FrameInput::Records(records), FrameOptions::default())
    }

    pub fn from_columns(columns: Vec<(String, Vec<Scalar>)>) -> Result<Self, FrameError> {
        Self::new(FrameInput::ColumnMap(columns), FrameOptions::default())
    }

    pub fn from_json(value: &Value, options: FrameOptions) -> Result<Self, FrameError> {
        Self::new(FrameInput::from_json(value)?, options)
    }

    pub(crate) fn from_parts(
        rows: Vec<Vec<Scalar>>,
        index: Index,
        columns: Vec<String>,
        dtypes: Option<Vec<DType>>,
        config: FrameConfig,
    ) -> Result<Self, FrameError> {
        NDFrame::from_parts(rows, index, columns, dtypes, config, FrameKind::DataFrame)
            .map(|frame| Self { frame })
    }

    fn from_ndframe(frame: NDFrame) -> Self {
        Self { frame }
    }

    /// Same index, columns and config; new rows with re-inferred dtypes.
    fn with_rows(&self, rows: Vec<Vec<Scalar>>) -> Result<Self, FrameError> {
        Self::from_parts(
            rows,
            self.frame.index().clone(),
            self.frame.columns().to_vec(),
            None,
            *self.frame.config(),
        )
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Vec<Scalar>> {
        self.frame.into_values()
    }

    // ── Columns ────────────────────────────────────────────────────────

    pub fn column_position(&self, name: &str) -> Result<usize, FrameError> {
        self.frame.column_position(name)
    }

    pub fn column_values(&self, name: &str) -> Result<Cow<'_, [Scalar]>, FrameError> {
        let pos = self.column_position(name)?;
        Ok(self.frame.column_cells(pos))
    }

    /// The named column as a Series sharing this frame's index.
    pub fn column(&self, name: &str) -> Result<Series, FrameError> {
        let pos = self.column_position(name)?;
        Series::from_parts(
            name.to_owned(),
            self.frame.index().clone(),
            self.frame.column_cells(pos).into_owned(),
            Some(self.frame.dtypes()[pos]),
            *self.frame.config(),
        )
    }

    /// Replace the named column or append it when absent.
    pub fn set_column(&mut self, name: &str, values: Vec<Scalar>) -> Result<(), FrameError> {
        match self.frame.column_position(name) {
            Ok(pos) => self.frame.set_column_values(pos, values),
            Err(_) => self.frame.push_column(name.to_owned(), values),
        }
    }

    pub fn with_column(&self, name: &str, values: Vec<Scalar>) -> Result<Self, FrameError> {
        let mut out = self.clone();
        out.set_column(name, values)?;
        Ok(out)
    }

    pub fn drop_column(&mut self, name: &str) -> Result<(), FrameError> {
        let pos = self.column_position(name)?;
        self.frame.remove_column(pos).map(|_| ())
    }

    pub fn without_column(&self, name: &str) -> Result<Self, FrameError> {
        let mut out = self.clone();
        out.drop_column(name)?;
        Ok(out)
    }

    /// Cast one column to `dtype`. The tag is set explicitly rather than
    /// re-inferred.
    pub fn astype(&self, name: &str, dtype: DType) -> Result<Self, FrameError> {
        let pos = self.column_position(name)?;
        let values = self
            .frame
            .column_cells(pos)
            .iter()
            .map(|value| cast_scalar(value, dtype))
            .collect::<Result<Vec<_>, _>>()?;
        let mut out = self.clone();
        out.frame.set_column_values(pos, values)?;
        out.frame.set_column_dtype(pos, dtype)?;
        Ok(out)
    }

    fn ensure_numeric(&self, op: &'static str) -> Result<(), FrameError> {
        let columns = self.frame.columns().iter().zip(self.frame.dtypes());
        for (column, &dtype) in columns {
            if !dtype.is_numeric() {
                return Err(FrameError::NonNumericColumn {
                    column: column.clone(),
                    dtype,
                    op,
                });
            }
        }
        Ok(())
    }

    // ── Arithmetic ─────────────────────────────────────────────────────

    fn binary(
        &self,
        operand: DataFrameOperand<'_>,
        axis: Axis,
        op: ArithmeticOp,
    ) -> Result<Self, FrameError> {
        self.ensure_numeric(op.name())?;
        let (nrows, ncols) = self.shape();
        let rows = self.frame.values();
        let out = match operand {
            DataFrameOperand::Scalar(scalar) => rows
                .iter()
                .map(|row| binary_with_scalar(row, &scalar, op))
                .collect::<Result<Vec<_>, ColumnError>>()?,
            DataFrameOperand::Series(series) => {
                series.ensure_numeric(op.name())?;
                let cells = series.cells();
                match axis {
                    Axis::Index => {
                        if cells.len() != nrows {
                            return Err(FrameError::LengthMismatch {
                                what: "series (axis 0)",
                                expected: nrows,
                                actual: cells.len(),
                            });
                        }
                        rows.iter()
                            .zip(cells.iter())
                            .map(|(row, value)| binary_with_scalar(row, value, op))
                            .collect::<Result<Vec<_>, ColumnError>>()?
                    }
                    Axis::Columns => {
                        if cells.len() != ncols {
                            return Err(FrameError::LengthMismatch {
                                what: "series (axis 1)",
                                expected: ncols,
                                actual: cells.len(),
                            });
                        }
                        rows.iter()
                            .map(|row| binary_values(row, &cells, op))
                            .collect::<Result<Vec<_>, ColumnError>>()?
                    }
                }
            }
            DataFrameOperand::Frame(other) => {
                other.ensure_numeric(op.name())?;
                let (other_rows, other_cols) = other.shape();
                if other_rows != nrows {
                    return Err(FrameError::LengthMismatch {
                        what: "frame rows",
                        expected: nrows,
                        actual: other_rows,
                    });
                }
                if other_cols != ncols {
                    return Err(FrameError::LengthMismatch {
                        what: "frame columns",
                        expected: ncols,
                        actual: other_cols,
                    });
                }
                rows.iter()
                    .zip(other.frame.values())
                    .map(|(left, right)| binary_values(left, right, op))
                    .collect::<Result<Vec<_>, ColumnError>>()?
            }
        };
        self.with_rows(out)
    }

    pub fn add<'a>(&self, other: impl Into<DataFrameOperand<'a>>, axis: Axis) -> Result<Self, FrameError> {
        self.binary(other.into(), axis, ArithmeticOp::Add)
    }

    pub fn sub<'a>(&self, other: impl Into<DataFrameOperand<'a>>, axis: Axis) -> Result<Self, FrameError> {
        self.binary(other.into(), axis, ArithmeticOp::Sub)
    }

    pub fn mul<'a>(&self, other: impl Into<DataFrameOperand<'a>>, axis: Axis) -> Result<Self, FrameError> {
        self.binary(other.into(), axis, ArithmeticOp::Mul)
    }

    pub fn div<'a>(&self, other: impl Into<DataFrameOperand<'a>>, axis: Axis) -> Result<Self, FrameError> {
        self.binary(other.into(), axis, ArithmeticOp::Div)
    }

    pub fn pow<'a>(&self, other: impl Into<DataFrameOperand<'a>>, axis: Axis) -> Result<Self, FrameError> {
        self.binary(other.into(), axis, ArithmeticOp::Pow)
    }

    pub fn modulo<'a>(&self, other: impl Into<DataFrameOperand<'a>>, axis: Axis) -> Result<Self, FrameError> {
        self.binary(other.into(), axis, ArithmeticOp::Mod)
    }

    // ── Reductions ─────────────────────────────────────────────────────

    /// `Axis::Index` reduces each column (result indexed by column name);
    /// `Axis::Columns` reduces each row (result keeps the frame index).
    pub fn reduce(&self, reduction: Reduction, axis: Axis) -> Result<Series, FrameError> {
        if reduction.requires_numeric() {
            self.ensure_numeric(reduction.name())?;
        }
        let config = *self.frame.config();
        match axis {
            Axis::Index => {
                let values = (0..self.frame.ncols())
                    .map(|pos| lf_columnar::reduce(&self.frame.column_cells(pos), reduction))
                    .collect();
                let labels = self
                    .frame
                    .columns()
                    .iter()
                    .map(|name| IndexLabel::from(name.as_str()))
                    .collect();
                Series::from_parts(
                    reduction.name().to_owned(),
                    Index::new(labels)?,
                    values,
                    None,
                    config,
                )
            }
            Axis::Columns => {
                let values = self
                    .frame
                    .values()
                    .iter()
                    .map(|row| lf_columnar::reduce(row, reduction))
                    .collect();
                Series::from_parts(
                    reduction.name().to_owned(),
                    self.frame.index().clone(),
                    values,
                    None,
                    config,
                )
            }
        }
    }

    pub fn sum(&self, axis: Axis) -> Result<Series, FrameError> {
        self.reduce(Reduction::Sum, axis)
    }

    pub fn mean(&self, axis: Axis) -> Result<Series, FrameError> {
        self.reduce(Reduction::Mean, axis)
    }

    pub fn median(&self, axis: Axis) -> Result<Series, FrameError> {
        self.reduce(Reduction::Median, axis)
    }

    pub fn mode(&self, axis: Axis) -> Result<Series, FrameError> {
        self.reduce(Reduction::Mode, axis)
    }

    pub fn min(&self, axis: Axis) -> Result<Series, FrameError> {
        self.reduce(Reduction::Min, axis)
    }

    pub fn max(&self, axis: Axis) -> Result<Series, FrameError> {
        self.reduce(Reduction::Max, axis)
    }

    pub fn std(&self, axis: Axis) -> Result<Series, FrameError> {
        self.reduce(Reduction::Std, axis)
    }

    pub fn var(&self, axis: Axis) -> Result<Series, FrameError> {
        self.reduce(Reduction::Var, axis)
    }

    pub fn count(&self, axis: Axis) -> Result<Series, FrameError> {
        self.reduce(Reduction::Count, axis)
    }

    // ── Missing data ───────────────────────────────────────────────────

    /// `Axis::Index` drops rows holding a missing cell; `Axis::Columns`
    /// drops such columns.
    pub fn dropna(&self, axis: Axis) -> Result<Self, FrameError> {
        match axis {
            Axis::Index => {
                let keep: Vec<usize> = self
                    .frame
                    .values()
                    .iter()
                    .enumerate()
                    .filter(|(_, row)| !row.iter().any(Scalar::is_missing))
                    .map(|(pos, _)| pos)
                    .collect();
                self.frame.take_rows(&keep).map(Self::from_ndframe)
            }
            Axis::Columns => {
                let keep: Vec<usize> = (0..self.frame.ncols())
                    .filter(|&pos| !self.frame.column_cells(pos).iter().any(Scalar::is_missing))
                    .collect();
                self.frame.take_columns(&keep).map(Self::from_ndframe)
            }
        }
    }

    pub fn fillna(&self, fill: &Scalar) -> Result<Self, FrameError> {
        let rows = self
            .frame
            .values()
            .iter()
            .map(|row| lf_types::fill_na(row, fill))
            .collect();
        self.with_rows(rows)
    }

    // ── Selection ──────────────────────────────────────────────────────

    fn select(&self, rows: &[usize], columns: &[usize]) -> Result<Self, FrameError> {
        self.frame
            .take_rows(rows)?
            .take_columns(columns)
            .map(Self::from_ndframe)
    }

    /// Label-based selection. Row slices include their end label.
    pub fn loc(&self, rows: &LocSelector, columns: &ColumnSelector) -> Result<Self, FrameError> {
        let row_positions = resolve_loc_rows(self.frame.index(), rows)?;
        let column_positions = resolve_columns(self.frame.columns(), columns)?;
        self.select(&row_positions, &column_positions)
    }

    /// Position-based selection. Slices exclude their end.
    pub fn iloc(&self, rows: &ILocSelector, columns: &IColumnSelector) -> Result<Self, FrameError> {
        let row_positions = resolve_iloc_rows(self.frame.nrows(), rows)?;
        let column_positions = resolve_icolumns(self.frame.ncols(), columns)?;
        self.select(&row_positions, &column_positions)
    }

    pub fn head(&self, n: usize) -> Result<Self, FrameError> {
        let positions: Vec<usize> = (0..n.min(self.frame.nrows())).collect();
        self.frame.take_rows(&positions).map(Self::from_ndframe)
    }

    pub fn tail(&self, n: usize) -> Result<Self, FrameError> {
        let len = self.frame.nrows();
        let positions: Vec<usize> = (len.saturating_sub(n)..len).collect();
        self.frame.take_rows(&positions).map(Self::from_ndframe)
    }

    /// Stable sort by one column with missing cells last.
    pub fn sort_values(&self, column: &str, ascending: bool) -> Result<Self, FrameError> {
        let cells = self.column_values(column)?;
        let mut order: Vec<usize> = (0..cells.len()).collect();
        order.sort_by(|&a, &b| compare_with_na_last(&cells[a], &cells[b], ascending));
        self.frame.take_rows(&order).map(Self::from_ndframe)
    }

    pub fn groupby(&self, by: &[&str]) -> Result<DataFrameGroupBy<'_>, FrameError> {
        DataFrameGroupBy::new(self, by)
    }
}
