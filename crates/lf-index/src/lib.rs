#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexLabel {
    Int64(i64),
    Utf8(String),
}

impl From<i64> for IndexLabel {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<usize> for IndexLabel {
    fn from(value: usize) -> Self {
        Self::Int64(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<&str> for IndexLabel {
    fn from(value: &str) -> Self {
        Self::Utf8(value.to_owned())
    }
}

impl From<String> for IndexLabel {
    fn from(value: String) -> Self {
        Self::Utf8(value)
    }
}

impl fmt::Display for IndexLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int64(v) => write!(f, "{v}"),
            Self::Utf8(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("duplicate index label '{label}'")]
    DuplicateLabel { label: IndexLabel },
    #[error("index label '{label}' not found")]
    LabelNotFound { label: IndexLabel },
}

/// Ordered, duplicate-free row labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<IndexLabel>", into = "Vec<IndexLabel>")]
pub struct Index {
    labels: Vec<IndexLabel>,
}

impl TryFrom<Vec<IndexLabel>> for Index {
    type Error = IndexError;

    fn try_from(labels: Vec<IndexLabel>) -> Result<Self, Self::Error> {
        Self::new(labels)
    }
}

impl From<Index> for Vec<IndexLabel> {
    fn from(index: Index) -> Self {
        index.labels
    }
}

fn find_duplicate(labels: &[IndexLabel]) -> Option<&IndexLabel> {
    let mut seen = HashMap::<&IndexLabel, ()>::with_capacity(labels.len());
    labels.iter().find(|label| seen.insert(label, ()).is_some())
}

impl Index {
    pub fn new(labels: Vec<IndexLabel>) -> Result<Self, IndexError> {
        if let Some(label) = find_duplicate(&labels) {
            return Err(IndexError::DuplicateLabel {
                label: label.clone(),
            });
        }
        Ok(Self { labels })
    }

    /// Default labels `0..len`.
    #[must_use]
    pub fn range(len: usize) -> Self {
        Self {
            labels: (0..len).map(IndexLabel::from).collect(),
        }
    }

    pub fn from_i64(values: Vec<i64>) -> Result<Self, IndexError> {
        Self::new(values.into_iter().map(IndexLabel::from).collect())
    }

    pub fn from_utf8(values: Vec<String>) -> Result<Self, IndexError> {
        Self::new(values.into_iter().map(IndexLabel::from).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn labels(&self) -> &[IndexLabel] {
        &self.labels
    }

    /// Whether this is exactly the default `0..len` range.
    #[must_use]
    pub fn is_default_range(&self) -> bool {
        self.labels
            .iter()
            .enumerate()
            .all(|(pos, label)| matches!(label, IndexLabel::Int64(v) if usize::try_from(*v) == Ok(pos)))
    }

    #[must_use]
    pub fn position(&self, needle: &IndexLabel) -> Option<usize> {
        self.labels.iter().position(|label| label == needle)
    }

    pub fn position_of(&self, needle: &IndexLabel) -> Result<usize, IndexError> {
        self.position(needle).ok_or_else(|| IndexError::LabelNotFound {
            label: needle.clone(),
        })
    }

    #[must_use]
    pub fn contains(&self, label: &IndexLabel) -> bool {
        self.position(label).is_some()
    }

    /// Label to position lookup table for bulk resolution.
    #[must_use]
    pub fn position_map(&self) -> HashMap<&IndexLabel, usize> {
        self.labels
            .iter()
            .enumerate()
            .map(|(pos, label)| (label, pos))
            .collect()
    }

    /// Labels at the given positions. Positions must be in bounds and
    /// distinct; callers validate both.
    #[must_use]
    pub fn take(&self, positions: &[usize]) -> Self {
        Self {
            labels: positions
                .iter()
                .map(|&pos| self.labels[pos].clone())
                .collect(),
        }
    }
}
