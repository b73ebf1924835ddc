#![forbid(unsafe_code)]

use std::{collections::HashMap, fmt, mem::size_of, str::FromStr};

use bumpalo::{Bump, collections::Vec as BumpVec};
use lf_frame::{DataFrame, Frame, FrameError, FrameInput, FrameOptions};
use lf_types::{Scalar, composite_key, first_duplicate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Outer,
}

impl JoinType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::Left => "left",
            Self::Right => "right",
            Self::Outer => "outer",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinType {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inner" => Ok(Self::Inner),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "outer" => Ok(Self::Outer),
            other => Err(MergeError::UnknownJoinType(other.to_owned())),
        }
    }
}

/// Which input frame a key column was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MergeError {
    #[error("merge requires at least one key column")]
    EmptyKeys,
    #[error("key column '{0}' listed more than once")]
    DuplicateKey(String),
    #[error("key column '{column}' not found in {side} frame")]
    KeyNotFound { column: String, side: Side },
    #[error("unknown join type '{0}'; expected inner, left, right or outer")]
    UnknownJoinType(String),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Both frames, the key columns to join on and the join semantics.
#[derive(Debug, Clone)]
pub struct MergeSpec<'a> {
    pub left: &'a DataFrame,
    pub right: &'a DataFrame,
    pub on: Vec<String>,
    pub how: JoinType,
}

impl<'a> MergeSpec<'a> {
    pub fn new<S: Into<String>>(
        left: &'a DataFrame,
        right: &'a DataFrame,
        on: impl IntoIterator<Item = S>,
        how: JoinType,
    ) -> Self {
        Self {
            left,
            right,
            on: on.into_iter().map(Into::into).collect(),
            how,
        }
    }
}

pub const DEFAULT_ARENA_BUDGET_BYTES: usize = 256 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeExecutionOptions {
    pub use_arena: bool,
    pub arena_budget_bytes: usize,
}

impl Default for MergeExecutionOptions {
    fn default() -> Self {
        Self {
            use_arena: true,
            arena_budget_bytes: DEFAULT_ARENA_BUDGET_BYTES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MergeExecutionTrace {
    used_arena: bool,
    output_rows: usize,
    estimated_bytes: usize,
}

/// Rows of one frame that share a composite key, in encounter order.
#[derive(Debug)]
struct KeyGroup {
    key: String,
    rows: Vec<usize>,
}

/// Composite key -> row positions for one side of the merge.
#[derive(Debug)]
struct KeyIndex {
    groups: Vec<KeyGroup>,
    slots: HashMap<String, usize>,
}

impl KeyIndex {
    fn build(frame: &DataFrame, key_positions: &[usize]) -> Self {
        let mut groups: Vec<KeyGroup> = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();
        for (row_pos, row) in frame.values().iter().enumerate() {
            let key = composite_key(key_positions.iter().map(|&pos| &row[pos]));
            if let Some(&slot) = slots.get(&key) {
                groups[slot].rows.push(row_pos);
                continue;
            }
            slots.insert(key.clone(), groups.len());
            groups.push(KeyGroup {
                key,
                rows: vec![row_pos],
            });
        }
        Self { groups, slots }
    }

    fn rows(&self, key: &str) -> Option<&[usize]> {
        self.slots
            .get(key)
            .map(|&slot| self.groups[slot].rows.as_slice())
    }

    fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.key.as_str())
    }
}

/// Column positions of a merge side: the `on` columns and everything else.
struct SideLayout {
    keys: Vec<usize>,
    rest: Vec<usize>,
}

impl SideLayout {
    fn resolve(frame: &DataFrame, on: &[String], side: Side) -> Result<Self, MergeError> {
        let keys = on
            .iter()
            .map(|column| {
                frame
                    .column_position(column)
                    .map_err(|_| MergeError::KeyNotFound {
                        column: column.clone(),
                        side,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let rest = (0..frame.shape().1)
            .filter(|pos| !keys.contains(pos))
            .collect();
        Ok(Self { keys, rest })
    }
}

/// Keys that drive output order for `how`.
fn driving_keys<'k>(how: JoinType, left: &'k KeyIndex, right: &'k KeyIndex) -> Vec<&'k str> {
    match how {
        JoinType::Inner => left
            .keys()
            .filter(|key| right.rows(key).is_some())
            .collect(),
        JoinType::Left => left.keys().collect(),
        JoinType::Right => right.keys().collect(),
        JoinType::Outer => left
            .keys()
            .chain(right.keys().filter(|key| left.rows(key).is_none()))
            .collect(),
    }
}

fn estimate_output_rows(keys: &[&str], left: &KeyIndex, right: &KeyIndex) -> usize {
    keys.iter()
        .map(|key| match (left.rows(key), right.rows(key)) {
            (Some(l), Some(r)) => l.len().saturating_mul(r.len()),
            (Some(rows), None) | (None, Some(rows)) => rows.len(),
            (None, None) => 0,
        })
        .sum()
}

fn estimate_intermediate_bytes(output_rows: usize) -> usize {
    output_rows.saturating_mul(size_of::<Option<usize>>().saturating_mul(2))
}

/// Emit `(left_row, right_row)` pairs in output order: cross product for
/// keys on both sides (left-major), one-sided rows otherwise.
fn plan_positions(
    keys: &[&str],
    left: &KeyIndex,
    right: &KeyIndex,
    mut emit: impl FnMut(Option<usize>, Option<usize>),
) {
    for key in keys {
        match (left.rows(key), right.rows(key)) {
            (Some(left_rows), Some(right_rows)) => {
                for &l in left_rows {
                    for &r in right_rows {
                        emit(Some(l), Some(r));
                    }
                }
            }
            (Some(left_rows), None) => left_rows.iter().for_each(|&l| emit(Some(l), None)),
            (None, Some(right_rows)) => right_rows.iter().for_each(|&r| emit(None, Some(r))),
            (None, None) => {}
        }
    }
}

/// `on` columns, then left non-key, then right non-key columns. A repeated
/// name becomes `name_1`, `name_2`, ... in first-seen order.
fn output_columns(
    on: &[String],
    left: &DataFrame,
    left_layout: &SideLayout,
    right: &DataFrame,
    right_layout: &SideLayout,
) -> Vec<String> {
    let candidates = on
        .iter()
        .chain(left_layout.rest.iter().map(|&pos| &left.columns()[pos]))
        .chain(right_layout.rest.iter().map(|&pos| &right.columns()[pos]));

    let mut names: Vec<String> = Vec::new();
    let mut counters: HashMap<&str, usize> = HashMap::new();
    for name in candidates {
        let mut out = name.clone();
        if names.contains(&out) {
            let counter = counters.entry(name.as_str()).or_insert(0);
            loop {
                *counter += 1;
                out = format!("{name}_{counter}");
                if !names.contains(&out) {
                    break;
                }
            }
        }
        names.push(out);
    }
    names
}

fn materialize_rows(
    plan: &[(Option<usize>, Option<usize>)],
    left: &DataFrame,
    left_layout: &SideLayout,
    right: &DataFrame,
    right_layout: &SideLayout,
) -> Vec<Vec<Scalar>> {
    let left_values = left.values();
    let right_values = right.values();
    let width = left_layout.keys.len() + left_layout.rest.len() + right_layout.rest.len();

    plan.iter()
        .map(|&(l, r)| {
            let mut row = Vec::with_capacity(width);
            match (l, r) {
                (Some(l), _) => row.extend(left_layout.keys.iter().map(|&pos| left_values[l][pos].clone())),
                (None, Some(r)) => {
                    row.extend(right_layout.keys.iter().map(|&pos| right_values[r][pos].clone()));
                }
                (None, None) => row.extend(left_layout.keys.iter().map(|_| Scalar::nan())),
            }
            match l {
                Some(l) => row.extend(left_layout.rest.iter().map(|&pos| left_values[l][pos].clone())),
                None => row.extend(left_layout.rest.iter().map(|_| Scalar::nan())),
            }
            match r {
                Some(r) => row.extend(right_layout.rest.iter().map(|&pos| right_values[r][pos].clone())),
                None => row.extend(right_layout.rest.iter().map(|_| Scalar::nan())),
            }
            row
        })
        .collect()
}

/// Join two frames on their shared key columns.
///
/// Keys compare by their rendered text, so `5` and `"5"` match. Output rows
/// follow the driving key order, then row order within a key, with a
/// left-major cross product where both sides hold the key. The result has a
/// default range index and the left frame's config.
pub fn merge(spec: &MergeSpec<'_>) -> Result<DataFrame, MergeError> {
    merge_with_options(spec, MergeExecutionOptions::default())
}

pub fn merge_with_options(
    spec: &MergeSpec<'_>,
    options: MergeExecutionOptions,
) -> Result<DataFrame, MergeError> {
    let (merged, _) = merge_with_trace(spec, options)?;
    Ok(merged)
}

fn merge_with_trace(
    spec: &MergeSpec<'_>,
    options: MergeExecutionOptions,
) -> Result<(DataFrame, MergeExecutionTrace), MergeError> {
    let MergeSpec {
        left,
        right,
        on,
        how,
    } = spec;
    if on.is_empty() {
        return Err(MergeError::EmptyKeys);
    }
    if let Some(column) = first_duplicate(on) {
        return Err(MergeError::DuplicateKey(column.clone()));
    }
    let left_layout = SideLayout::resolve(left, on, Side::Left)?;
    let right_layout = SideLayout::resolve(right, on, Side::Right)?;

    let left_index = KeyIndex::build(left, &left_layout.keys);
    let right_index = KeyIndex::build(right, &right_layout.keys);
    let keys = driving_keys(*how, &left_index, &right_index);

    let output_rows = estimate_output_rows(&keys, &left_index, &right_index);
    let estimated_bytes = estimate_intermediate_bytes(output_rows);
    let use_arena = options.use_arena && estimated_bytes <= options.arena_budget_bytes;

    let rows = if use_arena {
        let arena = Bump::new();
        let mut plan = BumpVec::with_capacity_in(output_rows, &arena);
        plan_positions(&keys, &left_index, &right_index, |l, r| plan.push((l, r)));
        materialize_rows(plan.as_slice(), left, &left_layout, right, &right_layout)
    } else {
        let mut plan = Vec::with_capacity(output_rows);
        plan_positions(&keys, &left_index, &right_index, |l, r| plan.push((l, r)));
        materialize_rows(&plan, left, &left_layout, right, &right_layout)
    };

    debug!(
        how = %how,
        left_keys = left_index.groups.len(),
        right_keys = right_index.groups.len(),
        output_rows,
        used_arena = use_arena,
        "merged frames"
    );

    let columns = output_columns(on, left, &left_layout, right, &right_layout);
    let merged = DataFrame::new(
        FrameInput::Rows(rows),
        FrameOptions::new()
            .with_columns(columns)
            .with_config(*left.config()),
    )?;
    Ok((
        merged,
        MergeExecutionTrace {
            used_arena: use_arena,
            output_rows,
            estimated_bytes,
        },
    ))
}
