use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;

use lf_columnar::{
    ArithmeticOp, ComparisonOp, Cumulative, Reduction, binary_values, binary_with_scalar,
    compare_with_na_last, compare_with_scalar, cumulative,
};
use lf_config::FrameConfig;
use lf_index::{Index, IndexLabel};
use lf_types::{DType, Scalar, cast_scalar};
use serde_json::Value;

use crate::dataframe::DataFrame;
use crate::ndframe::{FrameInput, FrameKind, FrameOptions, NDFrame, SetValuesOptions};
use crate::selection::{ILocSelector, LocSelector, resolve_iloc_rows, resolve_loc_rows};
use crate::{Frame, FrameError};

/// A single labeled column.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    frame: NDFrame,
}

/// Right-hand side of a Series arithmetic operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesOperand<'a> {
    Scalar(Scalar),
    Series(&'a Series),
}

impl From<Scalar> for SeriesOperand<'_> {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<i64> for SeriesOperand<'_> {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Int64(value))
    }
}

impl From<f64> for SeriesOperand<'_> {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::Float64(value))
    }
}

impl<'a> From<&'a Series> for SeriesOperand<'a> {
    fn from(value: &'a Series) -> Self {
        Self::Series(value)
    }
}

/// Which occurrence `drop_duplicates` keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateKeep {
    #[default]
    First,
    Last,
}

impl Frame for Series {
    fn ndframe(&self) -> &NDFrame {
        &self.frame
    }

    fn ndframe_mut(&mut self) -> &mut NDFrame {
        &mut self.frame
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.frame, f)
    }
}

/// Index label used for a value in `value_counts` output.
fn value_label(value: &Scalar) -> IndexLabel {
    match value {
        Scalar::Int64(v) => IndexLabel::Int64(*v),
        other => IndexLabel::Utf8(other.to_string()),
    }
}

impl Series {
    pub fn new(values: Vec<Scalar>) -> Result<Self, FrameError> {
        Self::with_options(values, FrameOptions::default())
    }

    pub fn named(name: impl Into<String>, values: Vec<Scalar>) -> Result<Self, FrameError> {
        Self::with_options(values, FrameOptions::new().with_columns([name.into()]))
    }

    pub fn with_options(values: Vec<Scalar>, options: FrameOptions) -> Result<Self, FrameError> {
        Self::from_input(FrameInput::Flat(values), options)
    }

    pub fn from_input(input: FrameInput, options: FrameOptions) -> Result<Self, FrameError> {
        NDFrame::new(input, options, FrameKind::Series).map(|frame| Self { frame })
    }

    pub fn from_json(value: &Value, options: FrameOptions) -> Result<Self, FrameError> {
        Self::from_input(FrameInput::from_json(value)?, options)
    }

    pub(crate) fn from_parts(
        name: String,
        index: Index,
        values: Vec<Scalar>,
        dtype: Option<DType>,
        config: FrameConfig,
    ) -> Result<Self, FrameError> {
        let rows = values.into_iter().map(|value| vec![value]).collect();
        NDFrame::from_parts(
            rows,
            index,
            vec![name],
            dtype.map(|dtype| vec![dtype]),
            config,
            FrameKind::Series,
        )
        .map(|frame| Self { frame })
    }

    /// Same name, index and config; new cells with a re-inferred dtype.
    fn with_cells(&self, values: Vec<Scalar>) -> Result<Self, FrameError> {
        Self::from_parts(
            self.name().to_owned(),
            self.frame.index().clone(),
            values,
            None,
            *self.frame.config(),
        )
    }

    fn take(&self, positions: &[usize]) -> Result<Self, FrameError> {
        self.frame.take_rows(positions).map(|frame| Self { frame })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.frame.columns()[0]
    }

    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), FrameError> {
        self.frame.set_column_names(vec![name.into()])
    }

    #[must_use]
    pub fn dtype(&self) -> DType {
        self.frame.dtypes()[0]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frame.nrows()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The cells in row order.
    #[must_use]
    pub fn cells(&self) -> Cow<'_, [Scalar]> {
        self.frame.column_cells(0)
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Scalar> {
        self.cells().into_owned()
    }

    pub fn get(&self, label: &IndexLabel) -> Result<&Scalar, FrameError> {
        let pos = self.frame.index().position_of(label)?;
        Ok(&self.frame.values()[pos][0])
    }

    pub fn iget(&self, pos: usize) -> Result<&Scalar, FrameError> {
        self.frame
            .values()
            .get(pos)
            .map(|row| &row[0])
            .ok_or(FrameError::PositionOutOfBounds {
                position: pos,
                len: self.len(),
            })
    }

    /// Replace the cells. With `check_length` off a new length resets the
    /// index.
    pub fn replace_values(
        &mut self,
        values: Vec<Scalar>,
        options: SetValuesOptions,
    ) -> Result<(), FrameError> {
        let rows = values.into_iter().map(|value| vec![value]).collect();
        self.frame.set_values(
            rows,
            SetValuesOptions {
                check_column_count: true,
                ..options
            },
        )
    }

    /// Boolean cells as a selection mask; missing counts as `false`.
    pub fn to_mask(&self) -> Result<Vec<bool>, FrameError> {
        self.cells()
            .iter()
            .map(|cell| match cell {
                Scalar::Bool(v) => Ok(*v),
                other if other.is_missing() => Ok(false),
                other => Err(FrameError::InvalidSelector(format!(
                    "mask value {other} is not boolean"
                ))),
            })
            .collect()
    }

    pub fn to_frame(&self) -> Result<DataFrame, FrameError> {
        DataFrame::from_parts(
            self.frame.values().to_vec(),
            self.frame.index().clone(),
            vec![self.name().to_owned()],
            Some(vec![self.dtype()]),
            *self.frame.config(),
        )
    }

    pub(crate) fn ensure_numeric(&self, op: &'static str) -> Result<(), FrameError> {
        let dtype = self.dtype();
        if dtype.is_numeric() {
            Ok(())
        } else {
            Err(FrameError::NonNumericColumn {
                column: self.name().to_owned(),
                dtype,
                op,
            })
        }
    }

    // ── Arithmetic ─────────────────────────────────────────────────────

    fn binary(&self, operand: SeriesOperand<'_>, op: ArithmeticOp) -> Result<Self, FrameError> {
        self.ensure_numeric(op.name())?;
        let values = match operand {
            SeriesOperand::Scalar(scalar) => binary_with_scalar(&self.cells(), &scalar, op)?,
            SeriesOperand::Series(other) => {
                other.ensure_numeric(op.name())?;
                if other.len() != self.len() {
                    return Err(FrameError::LengthMismatch {
                        what: "series",
                        expected: self.len(),
                        actual: other.len(),
                    });
                }
                binary_values(&self.cells(), &other.cells(), op)?
            }
        };
        self.with_cells(values)
    }

    pub fn add<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.binary(other.into(), ArithmeticOp::Add)
    }

    pub fn sub<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.binary(other.into(), ArithmeticOp::Sub)
    }

    pub fn mul<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.binary(other.into(), ArithmeticOp::Mul)
    }

    pub fn div<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.binary(other.into(), ArithmeticOp::Div)
    }

    pub fn pow<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.binary(other.into(), ArithmeticOp::Pow)
    }

    pub fn modulo<'a>(&self, other: impl Into<SeriesOperand<'a>>) -> Result<Self, FrameError> {
        self.binary(other.into(), ArithmeticOp::Mod)
    }

    /// Compare every cell against `scalar`; missing cells stay NaN.
    pub fn compare(&self, scalar: &Scalar, op: ComparisonOp) -> Result<Self, FrameError> {
        let values = compare_with_scalar(&self.cells(), scalar, op)?;
        self.with_cells(values)
    }

    // ── Reductions ─────────────────────────────────────────────────────

    /// Reduce to one cell, skipping missing values.
    pub fn reduce(&self, reduction: Reduction) -> Result<Scalar, FrameError> {
        if reduction.requires_numeric() {
            self.ensure_numeric(reduction.name())?;
        }
        Ok(lf_columnar::reduce(&self.cells(), reduction))
    }

    pub fn sum(&self) -> Result<Scalar, FrameError> {
        self.reduce(Reduction::Sum)
    }

    pub fn mean(&self) -> Result<Scalar, FrameError> {
        self.reduce(Reduction::Mean)
    }

    pub fn median(&self) -> Result<Scalar, FrameError> {
        self.reduce(Reduction::Median)
    }

    pub fn mode(&self) -> Result<Scalar, FrameError> {
        self.reduce(Reduction::Mode)
    }

    pub fn min(&self) -> Result<Scalar, FrameError> {
        self.reduce(Reduction::Min)
    }

    pub fn max(&self) -> Result<Scalar, FrameError> {
        self.reduce(Reduction::Max)
    }

    pub fn std(&self) -> Result<Scalar, FrameError> {
        self.reduce(Reduction::Std)
    }

    pub fn var(&self) -> Result<Scalar, FrameError> {
        self.reduce(Reduction::Var)
    }

    pub fn count(&self) -> Result<Scalar, FrameError> {
        self.reduce(Reduction::Count)
    }

    fn accumulate(&self, kind: Cumulative, op: &'static str) -> Result<Self, FrameError> {
        self.ensure_numeric(op)?;
        let values = cumulative(&self.cells(), kind)?;
        self.with_cells(values)
    }

    pub fn cumsum(&self) -> Result<Self, FrameError> {
        self.accumulate(Cumulative::Sum, "cumsum")
    }

    pub fn cumprod(&self) -> Result<Self, FrameError> {
        self.accumulate(Cumulative::Prod, "cumprod")
    }

    pub fn cummin(&self) -> Result<Self, FrameError> {
        self.accumulate(Cumulative::Min, "cummin")
    }

    pub fn cummax(&self) -> Result<Self, FrameError> {
        self.accumulate(Cumulative::Max, "cummax")
    }

    // ── Transforms ─────────────────────────────────────────────────────

    /// Apply `func` to every cell, re-inferring the dtype.
    pub fn apply<F>(&self, mut func: F) -> Result<Self, FrameError>
    where
        F: FnMut(&Scalar) -> Scalar,
    {
        let values = self.cells().iter().map(&mut func).collect();
        self.with_cells(values)
    }

    /// Look every cell up in `mapping`. Unmapped and missing cells become NaN.
    pub fn map(&self, mapping: &[(Scalar, Scalar)]) -> Result<Self, FrameError> {
        let values = self
            .cells()
            .iter()
            .map(|value| {
                if value.is_missing() {
                    return Scalar::nan();
                }
                mapping
                    .iter()
                    .find(|(from, _)| from.semantic_eq(value))
                    .map_or_else(Scalar::nan, |(_, to)| to.clone())
            })
            .collect();
        self.with_cells(values)
    }

    pub fn astype(&self, dtype: DType) -> Result<Self, FrameError> {
        let values = self
            .cells()
            .iter()
            .map(|value| cast_scalar(value, dtype))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_parts(
            self.name().to_owned(),
            self.frame.index().clone(),
            values,
            Some(dtype),
            *self.frame.config(),
        )
    }

    pub fn fillna(&self, fill: &Scalar) -> Result<Self, FrameError> {
        self.with_cells(lf_types::fill_na(&self.cells(), fill))
    }

    /// Drop missing cells; surviving cells keep their labels.
    pub fn dropna(&self) -> Result<Self, FrameError> {
        let keep: Vec<usize> = self
            .cells()
            .iter()
            .enumerate()
            .filter_map(|(pos, value)| (!value.is_missing()).then_some(pos))
            .collect();
        self.take(&keep)
    }

    pub fn isna(&self) -> Result<Self, FrameError> {
        let values = lf_types::isna(&self.cells())
            .into_iter()
            .map(Scalar::Bool)
            .collect();
        self.with_cells(values)
    }

    /// Stable sort with missing cells last; labels travel with their cells.
    pub fn sort_values(&self, ascending: bool) -> Result<Self, FrameError> {
        let cells = self.cells();
        let mut order: Vec<usize> = (0..cells.len()).collect();
        order.sort_by(|&a, &b| compare_with_na_last(&cells[a], &cells[b], ascending));
        self.take(&order)
    }

    /// Remove repeated cells. Cells that render alike count as repeats.
    pub fn drop_duplicates(&self, keep: DuplicateKeep) -> Result<Self, FrameError> {
        let cells = self.cells();
        let mut chosen: HashMap<String, usize> = HashMap::with_capacity(cells.len());
        for (pos, value) in cells.iter().enumerate() {
            let slot = chosen.entry(value.to_string()).or_insert(pos);
            if keep == DuplicateKeep::Last {
                *slot = pos;
            }
        }
        let mut positions: Vec<usize> = chosen.into_values().collect();
        positions.sort_unstable();
        self.take(&positions)
    }

    /// Distinct non-missing cells in first-seen order.
    #[must_use]
    pub fn unique(&self) -> Vec<Scalar> {
        let mut seen = HashSet::new();
        self.cells()
            .iter()
            .filter(|value| !value.is_missing() && seen.insert(value.to_string()))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn nunique(&self) -> usize {
        self.unique().len()
    }

    /// Occurrences of each distinct non-missing cell, most frequent first;
    /// ties keep first-seen order.
    pub fn value_counts(&self) -> Result<Self, FrameError> {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<(Scalar, i64)> = Vec::new();
        for value in self.cells().iter().filter(|value| !value.is_missing()) {
            let key = value.to_string();
            if let Some(&slot) = slots.get(&key) {
                counts[slot].1 += 1;
                continue;
            }
            slots.insert(key, counts.len());
            counts.push((value.clone(), 1));
        }
        counts.sort_by(|(_, left), (_, right)| right.cmp(left));

        let labels = counts.iter().map(|(value, _)| value_label(value)).collect();
        let values = counts.into_iter().map(|(_, n)| Scalar::Int64(n)).collect();
        Self::from_parts(
            "count".to_owned(),
            Index::new(labels)?,
            values,
            Some(DType::Int64),
            *self.frame.config(),
        )
    }

    // ── Selection ──────────────────────────────────────────────────────

    pub fn head(&self, n: usize) -> Result<Self, FrameError> {
        let positions: Vec<usize> = (0..n.min(self.len())).collect();
        self.take(&positions)
    }

    pub fn tail(&self, n: usize) -> Result<Self, FrameError> {
        let positions: Vec<usize> = (self.len().saturating_sub(n)..self.len()).collect();
        self.take(&positions)
    }

    pub fn loc(&self, rows: &LocSelector) -> Result<Self, FrameError> {
        let positions = resolve_loc_rows(self.frame.index(), rows)?;
        self.take(&positions)
    }

    pub fn iloc(&self, rows: &ILocSelector) -> Result<Self, FrameError> {
        let positions = resolve_iloc_rows(self.len(), rows)?;
        self.take(&positions)
    }
}

#[cfg(test)]
mod tests {
    use lf_columnar::ComparisonOp;
    use lf_index::IndexLabel;
    use lf_types::{DType, Scalar};

    use super::{DuplicateKeep, Series};
    use crate::{Frame, FrameError, FrameOptions, ILocSelector, LocSelector, SetValuesOptions};

    fn ints(values: &[i64]) -> Series {
        Series::new(values.iter().copied().map(Scalar::Int64).collect()).expect("int series")
    }

    #[test]
    fn series_has_one_named_column() {
        let series = Series::named("price", vec![Scalar::Float64(1.5), Scalar::Int64(2)])
            .expect("series");
        assert_eq!(series.shape(), (2, 1));
        assert_eq!(series.name(), "price");
        assert_eq!(series.dtype(), DType::Float64);
        assert_eq!(series.ndim(), 1);
        assert_eq!(series.columns(), &["price"]);
    }

    #[test]
    fn arithmetic_with_scalar_and_series() {
        let left = ints(&[1, 2, 3]);
        let right = ints(&[10, 20, 30]);
        assert_eq!(
            left.add(&right).expect("add").to_vec(),
            vec![Scalar::Int64(11), Scalar::Int64(22), Scalar::Int64(33)]
        );
        assert_eq!(
            left.mul(2_i64).expect("mul").to_vec(),
            vec![Scalar::Int64(2), Scalar::Int64(4), Scalar::Int64(6)]
        );
        assert_eq!(
            left.div(2_i64).expect("div").to_vec()[0],
            Scalar::Float64(0.5)
        );
        assert_eq!(
            left.modulo(2_i64).expect("mod").to_vec(),
            vec![Scalar::Int64(1), Scalar::Int64(0), Scalar::Int64(1)]
        );
    }

    #[test]
    fn arithmetic_length_mismatch_fails() {
        let err = ints(&[1, 2, 3]).sub(&ints(&[1])).expect_err("mismatch");
        assert_eq!(
            err,
            FrameError::LengthMismatch {
                what: "series",
                expected: 3,
                actual: 1
            }
        );
    }

    #[test]
    fn text_series_rejects_numeric_ops() {
        let text = Series::named("tag", vec!["a".into(), "b".into()]).expect("text");
        assert!(matches!(
            text.add(1_i64),
            Err(FrameError::NonNumericColumn { op: "add", .. })
        ));
        assert!(matches!(
            text.mean(),
            Err(FrameError::NonNumericColumn { op: "mean", .. })
        ));
        assert_eq!(text.count(), Ok(Scalar::Int64(2)));
        assert_eq!(text.mode(), Ok(Scalar::from("a")));
    }

    #[test]
    fn reductions_skip_missing() {
        let series = Series::new(vec![Scalar::Int64(1), Scalar::nan(), Scalar::Int64(3)])
            .expect("series");
        assert_eq!(series.sum(), Ok(Scalar::Int64(4)));
        assert_eq!(series.mean(), Ok(Scalar::Float64(2.0)));
        assert_eq!(series.count(), Ok(Scalar::Int64(2)));
        assert_eq!(series.min(), Ok(Scalar::Int64(1)));
    }

    #[test]
    fn cumulative_ops_keep_missing_in_place() {
        let series = Series::new(vec![Scalar::Int64(2), Scalar::nan(), Scalar::Int64(3)])
            .expect("series");
        assert_eq!(
            series.cumsum().expect("cumsum").to_vec(),
            vec![Scalar::Int64(2), Scalar::nan(), Scalar::Int64(5)]
        );
        assert_eq!(
            series.cumprod().expect("cumprod").to_vec(),
            vec![Scalar::Int64(2), Scalar::nan(), Scalar::Int64(6)]
        );
    }

    #[test]
    fn sort_values_puts_missing_last_and_moves_labels() {
        let series = Series::with_options(
            vec![Scalar::Int64(3), Scalar::nan(), Scalar::Int64(1)],
            FrameOptions::new().with_index(["a", "b", "c"]),
        )
        .expect("labeled");
        let sorted = series.sort_values(true).expect("sorted");
        assert_eq!(
            sorted.index().labels(),
            &[IndexLabel::from("c"), IndexLabel::from("a"), IndexLabel::from("b")]
        );
        let descending = series.sort_values(false).expect("sorted");
        assert_eq!(descending.iget(0), Ok(&Scalar::Int64(3)));
        assert!(descending.iget(2).expect("last").is_missing());
    }

    #[test]
    fn drop_duplicates_keeps_requested_occurrence() {
        let series = ints(&[1, 2, 1, 3, 2]);
        let first = series.drop_duplicates(DuplicateKeep::First).expect("first");
        assert_eq!(
            first.index().labels(),
            &[IndexLabel::Int64(0), IndexLabel::Int64(1), IndexLabel::Int64(3)]
        );
        let last = series.drop_duplicates(DuplicateKeep::Last).expect("last");
        assert_eq!(
            last.to_vec(),
            vec![Scalar::Int64(1), Scalar::Int64(3), Scalar::Int64(2)]
        );
    }

    #[test]
    fn unique_and_value_counts() {
        let series = Series::new(vec![
            "b".into(),
            "a".into(),
            "b".into(),
            Scalar::nan(),
            "c".into(),
            "a".into(),
            "b".into(),
        ])
        .expect("series");
        assert_eq!(
            series.unique(),
            vec![Scalar::from("b"), Scalar::from("a"), Scalar::from("c")]
        );
        assert_eq!(series.nunique(), 3);

        let counts = series.value_counts().expect("counts");
        assert_eq!(counts.name(), "count");
        assert_eq!(
            counts.index().labels(),
            &[IndexLabel::from("b"), IndexLabel::from("a"), IndexLabel::from("c")]
        );
        assert_eq!(
            counts.to_vec(),
            vec![Scalar::Int64(3), Scalar::Int64(2), Scalar::Int64(1)]
        );
    }

    #[test]
    fn map_apply_and_fillna() {
        let series = Series::new(vec![Scalar::Int64(1), Scalar::Int64(2), Scalar::nan()])
            .expect("series");
        let mapped = series
            .map(&[(Scalar::Int64(1), "one".into())])
            .expect("mapped");
        assert_eq!(mapped.iget(0), Ok(&Scalar::from("one")));
        assert!(mapped.iget(1).expect("unmapped").is_missing());

        let doubled = series
            .apply(|value| match value {
                Scalar::Int64(v) => Scalar::Int64(v * 2),
                other => other.clone(),
            })
            .expect("applied");
        assert_eq!(doubled.iget(1), Ok(&Scalar::Int64(4)));

        let filled = series.fillna(&Scalar::Int64(0)).expect("filled");
        assert_eq!(filled.iget(2), Ok(&Scalar::Int64(0)));
        assert_eq!(filled.dtype(), DType::Int64);
        assert_eq!(series.dropna().expect("dropped").len(), 2);
    }

    #[test]
    fn compare_builds_usable_mask() {
        let series = Series::new(vec![Scalar::Int64(5), Scalar::nan(), Scalar::Int64(9)])
            .expect("series");
        let mask = series
            .compare(&Scalar::Int64(6), ComparisonOp::Gt)
            .expect("mask");
        assert_eq!(mask.to_mask(), Ok(vec![false, false, true]));
        let picked = series
            .iloc(&ILocSelector::Mask(mask.to_mask().expect("bools")))
            .expect("selected");
        assert_eq!(picked.to_vec(), vec![Scalar::Int64(9)]);
    }

    #[test]
    fn label_and_position_lookup() {
        let series = Series::with_options(
            vec![Scalar::Int64(10), Scalar::Int64(20), Scalar::Int64(30)],
            FrameOptions::new().with_index(["x", "y", "z"]),
        )
        .expect("labeled");
        assert_eq!(series.get(&"y".into()), Ok(&Scalar::Int64(20)));
        assert_eq!(
            series.get(&"q".into()),
            Err(FrameError::LabelNotFound("q".into()))
        );
        assert_eq!(
            series.loc(&LocSelector::Slice("y:z".into())).expect("slice").len(),
            2
        );
        assert_eq!(series.head(2).expect("head").len(), 2);
        assert_eq!(series.tail(1).expect("tail").to_vec(), vec![Scalar::Int64(30)]);
    }

    #[test]
    fn replace_values_and_index_mutators() {
        let mut series = ints(&[1, 2]);
        series
            .set_index(vec!["p".into(), "q".into()])
            .expect("relabel");
        let relabeled = series.with_reset_index();
        assert!(relabeled.index().is_default_range());
        assert_eq!(series.index().labels()[0], IndexLabel::from("p"));

        series
            .replace_values(
                vec![Scalar::Float64(0.5); 3],
                SetValuesOptions {
                    check_length: false,
                    ..SetValuesOptions::default()
                },
            )
            .expect("grow");
        assert_eq!(series.len(), 3);
        assert!(series.index().is_default_range());
        assert_eq!(series.dtype(), DType::Float64);
    }

    #[test]
    fn astype_casts_and_sets_dtype() {
        let series = Series::new(vec!["1".into(), "2".into()]).expect("numeric text");
        let cast = series.astype(DType::Int64).expect("cast");
        assert_eq!(cast.to_vec(), vec![Scalar::Int64(1), Scalar::Int64(2)]);
        assert!(Series::new(vec!["x".into()])
            .expect("text")
            .astype(DType::Int64)
            .is_err());
    }
}
