use std::collections::HashMap;

use lf_columnar::Reduction;
use lf_index::Index;
use lf_types::{DType, Scalar, composite_key, first_duplicate};
use tracing::debug;

use crate::dataframe::DataFrame;
use crate::{Frame, FrameError};

/// Rows sharing one composite key, in encounter order.
#[derive(Debug, Clone)]
struct Group {
    key: Vec<Scalar>,
    rows: Vec<usize>,
}

/// A frame split by the values of one or more key columns.
///
/// Groups are keyed the same way merge keys are: key cells rendered and
/// joined with `_`, so `5` and `"5"` fall into one group. Groups keep the
/// order in which their first row appears.
#[derive(Debug, Clone)]
pub struct DataFrameGroupBy<'a> {
    frame: &'a DataFrame,
    by: Vec<usize>,
    groups: Vec<Group>,
    slots: HashMap<String, usize>,
}

impl<'a> DataFrameGroupBy<'a> {
    pub(crate) fn new(frame: &'a DataFrame, by: &[&str]) -> Result<Self, FrameError> {
        if by.is_empty() {
            return Err(FrameError::InvalidParameter(
                "group-by needs at least one key column".to_owned(),
            ));
        }
        if let Some(name) = first_duplicate(by) {
            return Err(FrameError::InvalidParameter(format!(
                "group-by key '{name}' listed more than once"
            )));
        }
        let by = by
            .iter()
            .map(|name| frame.column_position(name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut groups: Vec<Group> = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();
        for (row_pos, row) in frame.values().iter().enumerate() {
            let key = composite_key(by.iter().map(|&pos| &row[pos]));
            match slots.get(&key) {
                Some(&slot) => groups[slot].rows.push(row_pos),
                None => {
                    slots.insert(key, groups.len());
                    groups.push(Group {
                        key: by.iter().map(|&pos| row[pos].clone()).collect(),
                        rows: vec![row_pos],
                    });
                }
            }
        }
        debug!(groups = groups.len(), rows = frame.shape().0, "grouped frame");
        Ok(Self {
            frame,
            by,
            groups,
            slots,
        })
    }

    #[must_use]
    pub fn ngroups(&self) -> usize {
        self.groups.len()
    }

    /// Key cells of every group, in group order.
    #[must_use]
    pub fn keys(&self) -> Vec<Vec<Scalar>> {
        self.groups.iter().map(|group| group.key.clone()).collect()
    }

    /// Rows of the group whose key cells are `key`, with their labels.
    pub fn get_group(&self, key: &[Scalar]) -> Result<DataFrame, FrameError> {
        let slot = self
            .slots
            .get(&composite_key(key))
            .copied()
            .ok_or_else(|| {
                FrameError::InvalidParameter(format!("no group for key {}", composite_key(key)))
            })?;
        let rows = &self.groups[slot].rows;
        self.frame.iloc(
            &crate::ILocSelector::Positions(rows.clone()),
            &crate::IColumnSelector::All,
        )
    }

    /// Key names, then `generated`. A generated name already taken gets
    /// `_1`, `_2`, ... appended until it is free.
    fn output_names(&self, generated: impl Iterator<Item = String>) -> Vec<String> {
        let names = self.frame.columns();
        let mut columns: Vec<String> = self.by.iter().map(|&pos| names[pos].clone()).collect();
        for name in generated {
            let mut out = name.clone();
            let mut counter = 0;
            while columns.contains(&out) {
                counter += 1;
                out = format!("{name}_{counter}");
            }
            columns.push(out);
        }
        columns
    }

    fn value_columns(&self) -> Vec<usize> {
        (0..self.frame.shape().1)
            .filter(|pos| !self.by.contains(pos))
            .collect()
    }

    /// One output row per group: the key cells, then `agg` of each value
    /// column named `<column>_<suffix>`.
    fn aggregate<F>(&self, suffix: &str, mut agg: F) -> Result<DataFrame, FrameError>
    where
        F: FnMut(&[Scalar]) -> Scalar,
    {
        let names = self.frame.columns();
        let value_columns = self.value_columns();
        let columns = self.output_names(
            value_columns
                .iter()
                .map(|&pos| format!("{}_{suffix}", names[pos])),
        );

        let values = self.frame.values();
        let mut rows = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let mut row = group.key.clone();
            for &col in &value_columns {
                let cells: Vec<Scalar> = group
                    .rows
                    .iter()
                    .map(|&row_pos| values[row_pos][col].clone())
                    .collect();
                row.push(agg(&cells));
            }
            rows.push(row);
        }
        DataFrame::from_parts(
            rows,
            Index::range(self.groups.len()),
            columns,
            None,
            *self.frame.config(),
        )
    }

    fn reduce(&self, reduction: Reduction) -> Result<DataFrame, FrameError> {
        if reduction.requires_numeric() {
            let dtypes = self.frame.dtypes();
            for pos in self.value_columns() {
                let dtype: DType = dtypes[pos];
                if !dtype.is_numeric() {
                    return Err(FrameError::NonNumericColumn {
                        column: self.frame.columns()[pos].clone(),
                        dtype,
                        op: reduction.name(),
                    });
                }
            }
        }
        self.aggregate(reduction.name(), |cells| lf_columnar::reduce(cells, reduction))
    }

    pub fn sum(&self) -> Result<DataFrame, FrameError> {
        self.reduce(Reduction::Sum)
    }

    pub fn mean(&self) -> Result<DataFrame, FrameError> {
        self.reduce(Reduction::Mean)
    }

    pub fn count(&self) -> Result<DataFrame, FrameError> {
        self.reduce(Reduction::Count)
    }

    pub fn min(&self) -> Result<DataFrame, FrameError> {
        self.reduce(Reduction::Min)
    }

    pub fn max(&self) -> Result<DataFrame, FrameError> {
        self.reduce(Reduction::Max)
    }

    pub fn std(&self) -> Result<DataFrame, FrameError> {
        self.reduce(Reduction::Std)
    }

    pub fn var(&self) -> Result<DataFrame, FrameError> {
        self.reduce(Reduction::Var)
    }

    pub fn median(&self) -> Result<DataFrame, FrameError> {
        self.reduce(Reduction::Median)
    }

    /// First non-missing cell per group and column.
    pub fn first(&self) -> Result<DataFrame, FrameError> {
        self.aggregate("first", |cells| {
            cells
                .iter()
                .find(|cell| !cell.is_missing())
                .cloned()
                .unwrap_or_else(Scalar::nan)
        })
    }

    /// Last non-missing cell per group and column.
    pub fn last(&self) -> Result<DataFrame, FrameError> {
        self.aggregate("last", |cells| {
            cells
                .iter()
                .rev()
                .find(|cell| !cell.is_missing())
                .cloned()
                .unwrap_or_else(Scalar::nan)
        })
    }

    /// Row count per group in a single `size` column.
    pub fn size(&self) -> Result<DataFrame, FrameError> {
        let columns = self.output_names(std::iter::once("size".to_owned()));
        let rows = self
            .groups
            .iter()
            .map(|group| {
                let mut row = group.key.clone();
                row.push(Scalar::Int64(i64::try_from(group.rows.len()).unwrap_or(i64::MAX)));
                row
            })
            .collect();
        DataFrame::from_parts(
            rows,
            Index::range(self.groups.len()),
            columns,
            None,
            *self.frame.config(),
        )
    }
}
