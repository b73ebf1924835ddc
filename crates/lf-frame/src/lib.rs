#![forbid(unsafe_code)]

mod concat;
mod dataframe;
mod groupby;
mod ndframe;
mod selection;
mod series;
mod storage;

use std::fmt;

use lf_columnar::ColumnError;
use lf_config::FrameConfig;
use lf_index::{Index, IndexError, IndexLabel};
use lf_types::{DType, Scalar, TypeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use concat::{ConcatSpec, Concatenated, concat};
pub use dataframe::{DataFrame, DataFrameOperand};
pub use groupby::DataFrameGroupBy;
pub use ndframe::{FrameAxes, FrameInput, FrameKind, FrameOptions, NDFrame, SetValuesOptions};
pub use selection::{ColumnSelector, IColumnSelector, ILocSelector, LocSelector};
pub use series::{DuplicateKeep, Series, SeriesOperand};
pub use storage::StorageLayout;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameError {
    #[error("{what} length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("duplicate index label '{0}'")]
    DuplicateIndex(IndexLabel),
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
    #[error("unsupported dtype '{0}'")]
    UnsupportedDtype(String),
    #[error("column '{column}' has dtype {dtype}; {op} requires a numeric column")]
    NonNumericColumn {
        column: String,
        dtype: DType,
        op: &'static str,
    },
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),
    #[error("column '{0}' not found")]
    ColumnNotFound(String),
    #[error("index label '{0}' not found")]
    LabelNotFound(IndexLabel),
    #[error("invalid axis {0}; expected 0 (index) or 1 (columns)")]
    InvalidAxis(i64),
    #[error("invalid selector: {0}")]
    InvalidSelector(String),
    #[error("position {position} out of bounds for length {len}")]
    PositionOutOfBounds { position: usize, len: usize },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error(transparent)]
    Column(#[from] ColumnError),
    #[error(transparent)]
    Type(#[from] TypeError),
}

impl From<IndexError> for FrameError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DuplicateLabel { label } => Self::DuplicateIndex(label),
            IndexError::LabelNotFound { label } => Self::LabelNotFound(label),
        }
    }
}

/// Axis selector for reductions, broadcasting, `dropna` and concat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Axis 0: down the rows.
    Index,
    /// Axis 1: across the columns.
    Columns,
}

impl Axis {
    #[must_use]
    pub fn number(self) -> i64 {
        match self {
            Self::Index => 0,
            Self::Columns => 1,
        }
    }
}

impl TryFrom<i64> for Axis {
    type Error = FrameError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Index),
            1 => Ok(Self::Columns),
            other => Err(FrameError::InvalidAxis(other)),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Shared surface of [`Series`] and [`DataFrame`].
///
/// Accessors read through the underlying [`NDFrame`]; the provided mutators
/// validate before touching anything, so a failed call leaves the frame
/// unchanged. The `with_*` variants return a modified deep copy.
pub trait Frame {
    fn ndframe(&self) -> &NDFrame;

    fn ndframe_mut(&mut self) -> &mut NDFrame;

    fn shape(&self) -> (usize, usize) {
        self.ndframe().shape()
    }

    fn index(&self) -> &Index {
        self.ndframe().index()
    }

    fn columns(&self) -> &[String] {
        self.ndframe().columns()
    }

    fn dtypes(&self) -> &[DType] {
        self.ndframe().dtypes()
    }

    /// Row-major cells. A Series row holds exactly one cell.
    fn values(&self) -> &[Vec<Scalar>] {
        self.ndframe().values()
    }

    fn size(&self) -> usize {
        self.ndframe().size()
    }

    fn ndim(&self) -> usize {
        self.ndframe().ndim()
    }

    fn axis(&self) -> FrameAxes<'_> {
        self.ndframe().axis()
    }

    fn config(&self) -> &FrameConfig {
        self.ndframe().config()
    }

    fn layout(&self) -> StorageLayout {
        self.ndframe().layout()
    }

    fn set_index(&mut self, labels: Vec<IndexLabel>) -> Result<(), FrameError> {
        self.ndframe_mut().set_index(labels)
    }

    fn with_index(&self, labels: Vec<IndexLabel>) -> Result<Self, FrameError>
    where
        Self: Sized + Clone,
    {
        let mut out = self.clone();
        out.set_index(labels)?;
        Ok(out)
    }

    fn reset_index(&mut self) {
        self.ndframe_mut().reset_index();
    }

    fn with_reset_index(&self) -> Self
    where
        Self: Sized + Clone,
    {
        let mut out = self.clone();
        out.reset_index();
        out
    }

    fn set_column_names(&mut self, names: Vec<String>) -> Result<(), FrameError> {
        self.ndframe_mut().set_column_names(names)
    }

    fn with_column_names(&self, names: Vec<String>) -> Result<Self, FrameError>
    where
        Self: Sized + Clone,
    {
        let mut out = self.clone();
        out.set_column_names(names)?;
        Ok(out)
    }

    fn set_dtypes(&mut self, dtypes: Vec<DType>) -> Result<(), FrameError> {
        self.ndframe_mut().set_dtypes(dtypes)
    }

    fn with_dtypes(&self, dtypes: Vec<DType>) -> Result<Self, FrameError>
    where
        Self: Sized + Clone,
    {
        let mut out = self.clone();
        out.set_dtypes(dtypes)?;
        Ok(out)
    }

    fn set_values(
        &mut self,
        rows: Vec<Vec<Scalar>>,
        options: SetValuesOptions,
    ) -> Result<(), FrameError> {
        self.ndframe_mut().set_values(rows, options)
    }

    fn with_values(
        &self,
        rows: Vec<Vec<Scalar>>,
        options: SetValuesOptions,
    ) -> Result<Self, FrameError>
    where
        Self: Sized + Clone,
    {
        let mut out = self.clone();
        out.set_values(rows, options)?;
        Ok(out)
    }

    fn set_config(&mut self, config: FrameConfig) {
        self.ndframe_mut().set_config(config);
    }

    fn with_config(&self, config: FrameConfig) -> Self
    where
        Self: Sized + Clone,
    {
        let mut out = self.clone();
        out.set_config(config);
        out
    }
}
