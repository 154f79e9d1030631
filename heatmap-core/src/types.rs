use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::{HeatmapError, Result};

/// Row-major matrix of optional values, indexed `[row_index][column_index]`.
/// `None` means "no data", which is distinct from an observed zero.
pub type Matrix = Vec<Vec<Option<f64>>>;

/// Identifier of a column (a sample in the comparison view)
pub type ColumnId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Rows,
    Columns,
}

impl Axis {
    pub fn name(self) -> &'static str {
        match self {
            Axis::Rows => "row",
            Axis::Columns => "column",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Grouping key of a row (e.g. the genus a species belongs to).
/// Numeric keys order before textual ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortKey {
    Number(i64),
    Text(String),
}

/// Row label as supplied by the caller
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RowLabelInput {
    pub label: String,
    pub sort_key: Option<SortKey>,
    pub genus_name: Option<String>,
    pub hidden: bool,
}

impl RowLabelInput {
    pub fn new<S: Into<String>>(label: S) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_sort_key(mut self, key: SortKey) -> Self {
        self.sort_key = Some(key);
        self
    }
}

/// Column label as supplied by the caller. `id` is required and unique.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnLabelInput {
    pub id: ColumnId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub pinned: bool,
}

impl ColumnLabelInput {
    pub fn new<S: Into<String>>(id: ColumnId, label: S) -> Self {
        Self {
            id,
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }
}

/// Additional metric sharing the shape of the primary matrix, shown in tooltips
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricMatrix {
    pub key: String,
    pub label: String,
    pub values: Matrix,
}

/// Everything the caller hands to the engine for one update cycle
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapData {
    pub values: Matrix,
    pub row_labels: Vec<RowLabelInput>,
    pub column_labels: Vec<ColumnLabelInput>,
    pub metrics: Vec<MetricMatrix>,
    /// `true` where a cell satisfies the caller's threshold filters
    pub threshold_mask: Option<Vec<Vec<bool>>>,
}

impl HeatmapData {
    pub fn new(values: Matrix, row_labels: Vec<RowLabelInput>, column_labels: Vec<ColumnLabelInput>) -> Self {
        Self {
            values,
            row_labels,
            column_labels,
            metrics: Vec::new(),
            threshold_mask: None,
        }
    }

    /// Check shape and label uniqueness before anything is derived from the data.
    pub fn validate(&self) -> Result<()> {
        let rows = self.row_labels.len();
        let columns = self.column_labels.len();

        if self.values.len() != rows {
            return Err(HeatmapError::malformed_matrix(format!(
                "matrix has {} rows but {} row labels were given",
                self.values.len(),
                rows
            )));
        }
        check_shape("values", &self.values, columns)?;
        for metric in &self.metrics {
            if metric.values.len() != rows {
                return Err(HeatmapError::malformed_matrix(format!(
                    "metric {} has {} rows, expected {}",
                    metric.key,
                    metric.values.len(),
                    rows
                )));
            }
            check_shape(&metric.key, &metric.values, columns)?;
        }
        if let Some(mask) = &self.threshold_mask {
            if mask.len() != rows || mask.iter().any(|row| row.len() != columns) {
                return Err(HeatmapError::malformed_matrix(format!(
                    "threshold mask must be {}x{}",
                    rows, columns
                )));
            }
        }

        let mut seen = HashSet::new();
        for row in &self.row_labels {
            if !seen.insert(row.label.as_str()) {
                return Err(HeatmapError::duplicate_label(Axis::Rows.name(), row.label.clone()));
            }
        }
        let mut seen = HashSet::new();
        let mut ids = HashSet::new();
        for column in &self.column_labels {
            if !seen.insert(column.label.as_str()) {
                return Err(HeatmapError::duplicate_label(Axis::Columns.name(), column.label.clone()));
            }
            if !ids.insert(column.id) {
                return Err(HeatmapError::duplicate_label(Axis::Columns.name(), format!("id {}", column.id)));
            }
        }
        Ok(())
    }
}

fn check_shape(name: &str, matrix: &Matrix, columns: usize) -> Result<()> {
    for (i, row) in matrix.iter().enumerate() {
        if row.len() != columns {
            return Err(HeatmapError::malformed_matrix(format!(
                "{} row {} has {} entries, expected {}",
                name,
                i,
                row.len(),
                columns
            )));
        }
    }
    Ok(())
}

/// Engine-side row record. `pos` is `None` while the row is hidden.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowLabel {
    pub label: String,
    pub row_index: usize,
    pub pos: Option<usize>,
    pub hidden: bool,
    pub sort_key: Option<SortKey>,
    pub genus_name: Option<String>,
    pub highlighted: bool,
    pub shaded: bool,
}

impl RowLabel {
    /// Key used for grouping and for the non-clustered row order
    pub fn group_key(&self) -> SortKey {
        self.sort_key
            .clone()
            .unwrap_or_else(|| SortKey::Text(self.label.clone()))
    }
}

/// Engine-side column record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnLabel {
    pub id: ColumnId,
    pub label: String,
    pub column_index: usize,
    pub pos: usize,
    pub metadata: BTreeMap<String, String>,
    pub pinned: bool,
    pub highlighted: bool,
    pub shaded: bool,
}

impl ColumnLabel {
    /// Metadata value for `field`; empty strings count as missing.
    pub fn metadatum(&self, field: &str) -> Option<&str> {
        self.metadata
            .get(field)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// Stable identity of a cell, independent of display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CellId {
    pub row_index: usize,
    pub column_index: usize,
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row_index, self.column_index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cell {
    pub row_index: usize,
    pub column_index: usize,
    pub value: Option<f64>,
}

impl Cell {
    pub fn id(&self) -> CellId {
        CellId {
            row_index: self.row_index,
            column_index: self.column_index,
        }
    }
}

/// `{min, max}` pair used for scale domains
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Limits {
    pub min: f64,
    pub max: f64,
}
