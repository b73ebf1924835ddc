use std::collections::{HashMap, HashSet};

use lf_index::Index;
use lf_types::{Scalar, transpose};
use tracing::debug;

use crate::dataframe::DataFrame;
use crate::ndframe::NDFrame;
use crate::series::Series;
use crate::{Axis, Frame, FrameError};

/// Frames to stack and the axis to stack them along.
///
/// Series and DataFrames can be mixed; a Series contributes one column
/// named after its single column name.
pub struct ConcatSpec<'a> {
    pub frames: Vec<&'a dyn Frame>,
    pub axis: Axis,
}

impl<'a> ConcatSpec<'a> {
    #[must_use]
    pub fn new(frames: Vec<&'a dyn Frame>, axis: Axis) -> Self {
        Self { frames, axis }
    }
}

/// Result of [`concat`]: a row-wise union that ends with a single column
/// collapses to a Series.
#[derive(Debug, Clone, PartialEq)]
pub enum Concatenated {
    Series(Series),
    DataFrame(DataFrame),
}

impl Concatenated {
    #[must_use]
    pub fn is_series(&self) -> bool {
        matches!(self, Self::Series(_))
    }

    #[must_use]
    pub fn as_series(&self) -> Option<&Series> {
        match self {
            Self::Series(series) => Some(series),
            Self::DataFrame(_) => None,
        }
    }

    #[must_use]
    pub fn as_dataframe(&self) -> Option<&DataFrame> {
        match self {
            Self::DataFrame(frame) => Some(frame),
            Self::Series(_) => None,
        }
    }

    /// Widen to a DataFrame; a collapsed Series becomes a one-column frame.
    pub fn into_dataframe(self) -> Result<DataFrame, FrameError> {
        match self {
            Self::DataFrame(frame) => Ok(frame),
            Self::Series(series) => series.to_frame(),
        }
    }
}

impl Frame for Concatenated {
    fn ndframe(&self) -> &NDFrame {
        match self {
            Self::Series(series) => series.ndframe(),
            Self::DataFrame(frame) => frame.ndframe(),
        }
    }

    fn ndframe_mut(&mut self) -> &mut NDFrame {
        match self {
            Self::Series(series) => series.ndframe_mut(),
            Self::DataFrame(frame) => frame.ndframe_mut(),
        }
    }
}

/// Union frames along `spec.axis`.
///
/// Axis 1 glues columns side by side by position, suffixing repeated names
/// (`a`, `a1`, `a2`) and NaN-padding short columns at the end. Axis 0
/// stacks rows, matching columns by name and NaN-filling every span a frame
/// does not cover. Both produce a default range index.
pub fn concat(spec: ConcatSpec<'_>) -> Result<Concatenated, FrameError> {
    let Some(first) = spec.frames.first() else {
        return Err(FrameError::InvalidParameter(
            "concat needs at least one frame".to_owned(),
        ));
    };
    let config = *first.config();
    let out = match spec.axis {
        Axis::Columns => Concatenated::DataFrame(concat_columns(&spec.frames, config)?),
        Axis::Index => concat_rows(&spec.frames, config)?,
    };
    debug!(
        axis = spec.axis.number(),
        frames = spec.frames.len(),
        rows = out.shape().0,
        columns = out.shape().1,
        "concatenated frames"
    );
    Ok(out)
}

/// First free name among `base`, `base1`, `base2`, ...
fn suffixed_name(base: &str, counters: &mut HashMap<String, usize>, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_owned();
    }
    let counter = counters.entry(base.to_owned()).or_insert(0);
    loop {
        *counter += 1;
        let candidate = format!("{base}{counter}");
        if !taken.contains(&candidate) {
            return candidate;
        }
    }
}

fn concat_columns(
    frames: &[&dyn Frame],
    config: lf_config::FrameConfig,
) -> Result<DataFrame, FrameError> {
    let height = frames.iter().map(|frame| frame.shape().0).max().unwrap_or(0);

    let mut names = Vec::new();
    let mut taken = HashSet::new();
    let mut counters = HashMap::new();
    let mut columns: Vec<Vec<Scalar>> = Vec::new();
    for frame in frames {
        let ndframe = frame.ndframe();
        for (pos, name) in ndframe.columns().iter().enumerate() {
            let name = suffixed_name(name, &mut counters, &taken);
            taken.insert(name.clone());
            names.push(name);

            let mut cells = ndframe.column_cells(pos).into_owned();
            cells.resize_with(height, Scalar::nan);
            columns.push(cells);
        }
    }

    let rows = transpose(&columns, height);
    DataFrame::from_parts(rows, Index::range(height), names, None, config)
}

fn concat_rows(
    frames: &[&dyn Frame],
    config: lf_config::FrameConfig,
) -> Result<Concatenated, FrameError> {
    let mut names: Vec<String> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut columns: Vec<Vec<Scalar>> = Vec::new();
    let mut total = 0_usize;

    for frame in frames {
        let ndframe = frame.ndframe();
        let rows = ndframe.nrows();
        for (pos, name) in ndframe.columns().iter().enumerate() {
            let slot = match slots.get(name) {
                Some(&slot) => slot,
                None => {
                    slots.insert(name.clone(), names.len());
                    names.push(name.clone());
                    columns.push(Vec::with_capacity(total + rows));
                    names.len() - 1
                }
            };
            let column = &mut columns[slot];
            column.resize_with(total, Scalar::nan);
            column.extend(ndframe.column_cells(pos).iter().cloned());
        }
        total += rows;
    }
    for column in &mut columns {
        column.resize_with(total, Scalar::nan);
    }

    if let ([name], [column]) = (names.as_slice(), columns.as_mut_slice()) {
        let values = std::mem::take(column);
        return Series::from_parts(name.clone(), Index::range(total), values, None, config)
            .map(Concatenated::Series);
    }

    let rows = transpose(&columns, total);
    DataFrame::from_parts(rows, Index::range(total), names, None, config).map(Concatenated::DataFrame)
}
