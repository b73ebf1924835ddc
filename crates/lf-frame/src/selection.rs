//! Label and position based row/column selection.
//!
//! Slice selectors are strings of the form `"start:end"` with either bound
//! optional. Position slices (`iloc`) exclude `end` and accept negative
//! bounds counted from the end. Label slices (`loc`) include `end`.

use std::collections::HashSet;

use lf_index::{Index, IndexLabel};

use crate::FrameError;

#[derive(Debug, Clone, PartialEq)]
pub enum LocSelector {
    All,
    Label(IndexLabel),
    Labels(Vec<IndexLabel>),
    /// `"start:end"` over labels, end inclusive.
    Slice(String),
    Mask(Vec<bool>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ILocSelector {
    All,
    Position(usize),
    Positions(Vec<usize>),
    /// `"start:end"` over positions, end exclusive.
    Slice(String),
    Mask(Vec<bool>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    All,
    Names(Vec<String>),
    /// `"first:last"` over column names, last inclusive.
    Slice(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IColumnSelector {
    All,
    Positions(Vec<usize>),
    /// `"start:end"` over column positions, end exclusive.
    Slice(String),
}

fn split_slice(spec: &str) -> Result<(Option<&str>, Option<&str>), FrameError> {
    let mut parts = spec.split(':');
    let (Some(start), Some(end), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FrameError::InvalidSelector(format!(
            "slice '{spec}' must have the form 'start:end'"
        )));
    };
    Ok((slice_bound(start), slice_bound(end)))
}

fn slice_bound(text: &str) -> Option<&str> {
    let text = text.trim();
    (!text.is_empty()).then_some(text)
}

fn parse_position_bound(text: &str, len: usize) -> Result<usize, FrameError> {
    let value = text.parse::<i64>().map_err(|_| {
        FrameError::InvalidSelector(format!("slice bound '{text}' is not an integer"))
    })?;
    let len_i64 = i64::try_from(len).unwrap_or(i64::MAX);
    let normalized = if value < 0 { len_i64 + value } else { value };
    Ok(usize::try_from(normalized.clamp(0, len_i64)).unwrap_or(0))
}

/// Half-open position range for an `iloc`-style slice over `len` items.
fn position_slice(spec: &str, len: usize) -> Result<Vec<usize>, FrameError> {
    let (start, end) = split_slice(spec)?;
    let start = start.map_or(Ok(0), |text| parse_position_bound(text, len))?;
    let end = end.map_or(Ok(len), |text| parse_position_bound(text, len))?;
    Ok((start..end.max(start)).collect())
}

/// Resolve a label written in a slice string: an existing text label wins,
/// otherwise the text is read as an integer label.
fn resolve_slice_label(index: &Index, text: &str) -> Result<usize, FrameError> {
    let as_text = IndexLabel::from(text);
    if let Some(pos) = index.position(&as_text) {
        return Ok(pos);
    }
    let as_int = text.parse::<i64>().map(IndexLabel::Int64);
    match as_int {
        Ok(label) => Ok(index.position_of(&label)?),
        Err(_) => Err(FrameError::LabelNotFound(as_text)),
    }
}

fn inclusive_range(start: usize, end: usize) -> Vec<usize> {
    if start > end {
        Vec::new()
    } else {
        (start..=end).collect()
    }
}

fn mask_positions(mask: &[bool], len: usize, what: &'static str) -> Result<Vec<usize>, FrameError> {
    if mask.len() != len {
        return Err(FrameError::LengthMismatch {
            what,
            expected: len,
            actual: mask.len(),
        });
    }
    Ok(mask
        .iter()
        .enumerate()
        .filter_map(|(pos, keep)| keep.then_some(pos))
        .collect())
}

fn check_positions(positions: &[usize], len: usize, what: &str) -> Result<(), FrameError> {
    let mut seen = HashSet::with_capacity(positions.len());
    for &pos in positions {
        if pos >= len {
            return Err(FrameError::PositionOutOfBounds { position: pos, len });
        }
        if !seen.insert(pos) {
            return Err(FrameError::InvalidSelector(format!(
                "{what} position {pos} selected more than once"
            )));
        }
    }
    Ok(())
}

pub(crate) fn resolve_loc_rows(index: &Index, selector: &LocSelector) -> Result<Vec<usize>, FrameError> {
    let len = index.len();
    let positions = match selector {
        LocSelector::All => (0..len).collect(),
        LocSelector::Label(label) => vec![index.position_of(label)?],
        LocSelector::Labels(labels) => {
            let lookup = index.position_map();
            labels
                .iter()
                .map(|label| {
                    lookup
                        .get(label)
                        .copied()
                        .ok_or_else(|| FrameError::LabelNotFound(label.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?
        }
        LocSelector::Slice(spec) => {
            if len == 0 {
                return Ok(Vec::new());
            }
            let (start, end) = split_slice(spec)?;
            let start = start.map_or(Ok(0), |text| resolve_slice_label(index, text))?;
            let end = end.map_or(Ok(len - 1), |text| resolve_slice_label(index, text))?;
            inclusive_range(start, end)
        }
        LocSelector::Mask(mask) => mask_positions(mask, len, "row mask")?,
    };
    check_positions(&positions, len, "row")?;
    Ok(positions)
}

pub(crate) fn resolve_iloc_rows(len: usize, selector: &ILocSelector) -> Result<Vec<usize>, FrameError> {
    let positions = match selector {
        ILocSelector::All => (0..len).collect(),
        ILocSelector::Position(pos) => vec![*pos],
        ILocSelector::Positions(positions) => positions.clone(),
        ILocSelector::Slice(spec) => position_slice(spec, len)?,
        ILocSelector::Mask(mask) => mask_positions(mask, len, "row mask")?,
    };
    check_positions(&positions, len, "row")?;
    Ok(positions)
}

pub(crate) fn resolve_columns(
    columns: &[String],
    selector: &ColumnSelector,
) -> Result<Vec<usize>, FrameError> {
    let find = |name: &str| {
        columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| FrameError::ColumnNotFound(name.to_owned()))
    };
    let positions = match selector {
        ColumnSelector::All => (0..columns.len()).collect(),
        ColumnSelector::Names(names) => names
            .iter()
            .map(|name| find(name))
            .collect::<Result<Vec<_>, _>>()?,
        ColumnSelector::Slice(spec) => {
            if columns.is_empty() {
                return Ok(Vec::new());
            }
            let (start, end) = split_slice(spec)?;
            let start = start.map_or(Ok(0), &find)?;
            let end = end.map_or(Ok(columns.len() - 1), &find)?;
            inclusive_range(start, end)
        }
    };
    check_positions(&positions, columns.len(), "column")?;
    Ok(positions)
}

pub(crate) fn resolve_icolumns(
    len: usize,
    selector: &IColumnSelector,
) -> Result<Vec<usize>, FrameError> {
    let positions = match selector {
        IColumnSelector::All => (0..len).collect(),
        IColumnSelector::Positions(positions) => positions.clone(),
        IColumnSelector::Slice(spec) => position_slice(spec, len)?,
    };
    check_positions(&positions, len, "column")?;
    Ok(positions)
}

#[cfg(test)]
mod tests {
    use lf_index::{Index, IndexLabel};

    use super::{
        ColumnSelector, IColumnSelector, ILocSelector, LocSelector, resolve_columns,
        resolve_icolumns, resolve_iloc_rows, resolve_loc_rows,
    };
    use crate::FrameError;

    fn names() -> Vec<String> {
        ["a", "b", "c", "d"].map(String::from).to_vec()
    }

    #[test]
    fn iloc_slices_exclude_end() {
        assert_eq!(
            resolve_iloc_rows(5, &ILocSelector::Slice("1:3".into())),
            Ok(vec![1, 2])
        );
        assert_eq!(
            resolve_iloc_rows(5, &ILocSelector::Slice(":2".into())),
            Ok(vec![0, 1])
        );
        assert_eq!(
            resolve_iloc_rows(5, &ILocSelector::Slice("3:".into())),
            Ok(vec![3, 4])
        );
        assert_eq!(
            resolve_iloc_rows(5, &ILocSelector::Slice("-2:".into())),
            Ok(vec![3, 4])
        );
        assert_eq!(
            resolve_iloc_rows(5, &ILocSelector::Slice("4:1".into())),
            Ok(vec![])
        );
        assert_eq!(
            resolve_iloc_rows(3, &ILocSelector::Slice("0:99".into())),
            Ok(vec![0, 1, 2])
        );
    }

    #[test]
    fn malformed_slices_are_rejected() {
        assert!(matches!(
            resolve_iloc_rows(5, &ILocSelector::Slice("1".into())),
            Err(FrameError::InvalidSelector(_))
        ));
        assert!(matches!(
            resolve_iloc_rows(5, &ILocSelector::Slice("a:b".into())),
            Err(FrameError::InvalidSelector(_))
        ));
        assert!(matches!(
            resolve_icolumns(4, &IColumnSelector::Slice("0:1:2".into())),
            Err(FrameError::InvalidSelector(_))
        ));
    }

    #[test]
    fn loc_slices_include_end() {
        let index = Index::new(vec!["w".into(), "x".into(), "y".into(), "z".into()]).expect("unique");
        assert_eq!(
            resolve_loc_rows(&index, &LocSelector::Slice("x:y".into())),
            Ok(vec![1, 2])
        );
        assert_eq!(
            resolve_loc_rows(&index, &LocSelector::Slice(":x".into())),
            Ok(vec![0, 1])
        );

        let numeric = Index::range(4);
        assert_eq!(
            resolve_loc_rows(&numeric, &LocSelector::Slice("1:2".into())),
            Ok(vec![1, 2])
        );
        assert_eq!(
            resolve_loc_rows(&numeric, &LocSelector::Slice("1:9".into())),
            Err(FrameError::LabelNotFound(IndexLabel::Int64(9)))
        );
    }

    #[test]
    fn loc_labels_resolve_in_request_order() {
        let index = Index::new(vec!["w".into(), "x".into(), "y".into()]).expect("unique");
        assert_eq!(
            resolve_loc_rows(&index, &LocSelector::Labels(vec!["y".into(), "w".into()])),
            Ok(vec![2, 0])
        );
        assert_eq!(
            resolve_loc_rows(&index, &LocSelector::Label("q".into())),
            Err(FrameError::LabelNotFound("q".into()))
        );
    }

    #[test]
    fn masks_must_match_axis_length() {
        assert_eq!(
            resolve_iloc_rows(3, &ILocSelector::Mask(vec![true, false, true])),
            Ok(vec![0, 2])
        );
        assert_eq!(
            resolve_iloc_rows(3, &ILocSelector::Mask(vec![true])),
            Err(FrameError::LengthMismatch {
                what: "row mask",
                expected: 3,
                actual: 1
            })
        );
    }

    #[test]
    fn repeated_and_out_of_range_positions_fail() {
        assert!(matches!(
            resolve_iloc_rows(3, &ILocSelector::Positions(vec![0, 0])),
            Err(FrameError::InvalidSelector(_))
        ));
        assert_eq!(
            resolve_iloc_rows(3, &ILocSelector::Position(3)),
            Err(FrameError::PositionOutOfBounds { position: 3, len: 3 })
        );
    }

    #[test]
    fn column_selectors_resolve_names_and_slices() {
        assert_eq!(
            resolve_columns(&names(), &ColumnSelector::Names(vec!["c".into(), "a".into()])),
            Ok(vec![2, 0])
        );
        assert_eq!(
            resolve_columns(&names(), &ColumnSelector::Slice("b:c".into())),
            Ok(vec![1, 2])
        );
        assert_eq!(
            resolve_columns(&names(), &ColumnSelector::Names(vec!["zz".into()])),
            Err(FrameError::ColumnNotFound("zz".into()))
        );
        assert_eq!(
            resolve_icolumns(4, &IColumnSelector::Slice("1:3".into())),
            Ok(vec![1, 2])
        );
    }
}
