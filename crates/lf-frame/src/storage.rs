use std::borrow::Cow;

use lf_config::FrameConfig;
use lf_types::{Scalar, transpose};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// How a frame's cells are held in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageLayout {
    /// Row-major only; column reads transpose on demand.
    RowMajor,
    /// Row-major plus an eagerly maintained column-major mirror.
    Dual,
}

impl StorageLayout {
    #[must_use]
    pub fn for_config(config: &FrameConfig) -> Self {
        if config.low_memory_mode {
            Self::RowMajor
        } else {
            Self::Dual
        }
    }
}

/// Row-major cells with an optional column-major mirror. When the mirror is
/// present it is the exact transpose of `rows` after every operation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FrameStorage {
    rows: Vec<Vec<Scalar>>,
    mirror: Option<Vec<Vec<Scalar>>>,
    width: usize,
}

impl FrameStorage {
    /// Rows must already be `width` cells wide.
    pub(crate) fn new(rows: Vec<Vec<Scalar>>, width: usize, layout: StorageLayout) -> Self {
        let mirror = match layout {
            StorageLayout::Dual => Some(transpose(&rows, width)),
            StorageLayout::RowMajor => None,
        };
        Self {
            rows,
            mirror,
            width,
        }
    }

    pub(crate) fn layout(&self) -> StorageLayout {
        if self.mirror.is_some() {
            StorageLayout::Dual
        } else {
            StorageLayout::RowMajor
        }
    }

    pub(crate) fn rows(&self) -> &[Vec<Scalar>] {
        &self.rows
    }

    pub(crate) fn width(&self) -> usize {
        self.width
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    /// Cells of column `pos`; callers bound-check `pos`.
    pub(crate) fn column(&self, pos: usize) -> Cow<'_, [Scalar]> {
        match &self.mirror {
            Some(columns) => Cow::Borrowed(&columns[pos]),
            None => Cow::Owned(self.rows.iter().map(|row| row[pos].clone()).collect()),
        }
    }

    pub(crate) fn set_rows(&mut self, rows: Vec<Vec<Scalar>>, width: usize) {
        if self.mirror.is_some() {
            self.mirror = Some(transpose(&rows, width));
        }
        self.rows = rows;
        self.width = width;
    }

    /// Replace column `pos`; `values` must have one cell per row.
    pub(crate) fn set_column(&mut self, pos: usize, values: Vec<Scalar>) {
        for (row, value) in self.rows.iter_mut().zip(&values) {
            row[pos] = value.clone();
        }
        if let Some(columns) = &mut self.mirror {
            columns[pos] = values;
        }
    }

    /// Append a column. An empty storage adopts the column's length.
    pub(crate) fn push_column(&mut self, values: Vec<Scalar>) {
        if self.width == 0 && self.rows.is_empty() {
            self.rows = vec![Vec::with_capacity(1); values.len()];
        }
        for (row, value) in self.rows.iter_mut().zip(&values) {
            row.push(value.clone());
        }
        if let Some(columns) = &mut self.mirror {
            columns.push(values);
        }
        self.width += 1;
    }

    pub(crate) fn remove_column(&mut self, pos: usize) -> Vec<Scalar> {
        let removed = self.rows.iter_mut().map(|row| row.remove(pos)).collect();
        if let Some(columns) = &mut self.mirror {
            columns.remove(pos);
        }
        self.width -= 1;
        removed
    }

    pub(crate) fn set_layout(&mut self, layout: StorageLayout) {
        if layout == self.layout() {
            return;
        }
        trace!(?layout, rows = self.rows.len(), "switching storage layout");
        self.mirror = match layout {
            StorageLayout::Dual => Some(transpose(&self.rows, self.width)),
            StorageLayout::RowMajor => None,
        };
    }

    pub(crate) fn into_rows(self) -> Vec<Vec<Scalar>> {
        self.rows
    }
}
