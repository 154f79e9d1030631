/*!
# Data pipeline stages

The heatmap is prepared by a fixed sequence of stages:

`setupContainers → parse → filter → processMetadata → cluster → placeContainers → update`

Entering the pipeline at a stage runs that stage and every stage after it.
The data stages live here as plain functions over borrowed inputs; the first
and last stages (scene containers and drawing) belong to the renderer.
*/

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use crate::cluster::{hcluster, ClusterTree, Observation};
use crate::colormap::CategoricalColormap;
use crate::error::{HeatmapError, Result};
use crate::options::{ColumnMetadataField, HeatmapOptions};
use crate::scale::Scale;
use crate::text::TextMeasure;
use crate::types::{Cell, ColumnId, ColumnLabel, HeatmapData, Limits, Matrix, RowLabel, SortDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Stage {
    SetupContainers,
    Parse,
    Filter,
    ProcessMetadata,
    Cluster,
    PlaceContainers,
    Update,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::SetupContainers,
        Stage::Parse,
        Stage::Filter,
        Stage::ProcessMetadata,
        Stage::Cluster,
        Stage::PlaceContainers,
        Stage::Update,
    ];

    /// Stages executed when the pipeline is entered at `self`
    pub fn fallthrough(self) -> impl Iterator<Item = Stage> {
        Self::ALL.into_iter().filter(move |stage| *stage >= self)
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::SetupContainers => "setupContainers",
            Stage::Parse => "parse",
            Stage::Filter => "filter",
            Stage::ProcessMetadata => "processMetadata",
            Stage::Cluster => "cluster",
            Stage::PlaceContainers => "placeContainers",
            Stage::Update => "update",
        }
    }
}

impl FromStr for Stage {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| HeatmapError::invalid_option("stage", format!("unknown stage {}", s)))
    }
}

/// Row and column records plus their lookup indexes
#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    pub rows: Vec<RowLabel>,
    pub columns: Vec<ColumnLabel>,
    rows_by_label: HashMap<String, usize>,
    columns_by_id: HashMap<ColumnId, usize>,
}

impl LabelSet {
    pub fn new(rows: Vec<RowLabel>, columns: Vec<ColumnLabel>) -> Self {
        let rows_by_label = rows.iter().map(|r| (r.label.clone(), r.row_index)).collect();
        let columns_by_id = columns.iter().map(|c| (c.id, c.column_index)).collect();
        Self {
            rows,
            columns,
            rows_by_label,
            columns_by_id,
        }
    }

    pub fn row_index(&self, label: &str) -> Option<usize> {
        self.rows_by_label.get(label).copied()
    }

    pub fn column_index(&self, id: ColumnId) -> Option<usize> {
        self.columns_by_id.get(&id).copied()
    }

    pub fn visible_row_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.hidden).count()
    }

    pub fn pinned_count(&self) -> usize {
        self.columns.iter().filter(|c| c.pinned).count()
    }

    /// Visible rows in display order
    pub fn rows_by_pos(&self) -> Vec<&RowLabel> {
        let mut rows: Vec<&RowLabel> = self.rows.iter().filter(|r| r.pos.is_some()).collect();
        rows.sort_by_key(|r| r.pos);
        rows
    }

    /// Columns in display order
    pub fn columns_by_pos(&self) -> Vec<&ColumnLabel> {
        let mut columns: Vec<&ColumnLabel> = self.columns.iter().collect();
        columns.sort_by_key(|c| c.pos);
        columns
    }

    pub fn row_at(&self, pos: usize) -> Option<&RowLabel> {
        self.rows.iter().find(|r| r.pos == Some(pos))
    }

    pub fn column_at(&self, pos: usize) -> Option<&ColumnLabel> {
        self.columns.iter().find(|c| c.pos == pos)
    }
}

/// Output of the parse stage
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    pub labels: LabelSet,
    pub row_labels_width: f64,
    pub column_labels_height: f64,
    /// Data limits (always including the null value); used for clustering
    pub limits: Limits,
    /// Limits for color mapping, with caller overrides applied
    pub scale_limits: Limits,
    pub cells: Vec<Cell>,
}

pub fn parse(data: &HeatmapData, options: &HeatmapOptions, measure: &dyn TextMeasure) -> Result<Parsed> {
    data.validate()?;

    let mut visible = 0;
    let rows: Vec<RowLabel> = data
        .row_labels
        .iter()
        .enumerate()
        .map(|(row_index, input)| {
            let pos = if input.hidden {
                None
            } else {
                visible += 1;
                Some(visible - 1)
            };
            RowLabel {
                label: input.label.clone(),
                row_index,
                pos,
                hidden: input.hidden,
                sort_key: input.sort_key.clone(),
                genus_name: input.genus_name.clone(),
                highlighted: false,
                shaded: false,
            }
        })
        .collect();
    let columns: Vec<ColumnLabel> = data
        .column_labels
        .iter()
        .enumerate()
        .map(|(column_index, input)| ColumnLabel {
            id: input.id,
            label: input.label.clone(),
            column_index,
            pos: column_index,
            metadata: input.metadata.clone(),
            pinned: input.pinned,
            highlighted: false,
            shaded: false,
        })
        .collect();

    let font_px = options.font_size_px();
    let mut row_labels_width = rows
        .iter()
        .map(|r| measure.width(&r.label, font_px))
        .fold(0.0, f64::max);
    for field in &options.column_metadata {
        // Leave room for the sort icon next to the metadata label
        let width = measure.width(&field.label, font_px) + options.metadata_sort_icon_size;
        row_labels_width = row_labels_width.max(width);
    }
    let longest_column = columns
        .iter()
        .map(|c| measure.width(&c.label, font_px))
        .fold(0.0, f64::max);
    let mut column_labels_height =
        longest_column * ((90.0 + options.text_rotation).to_radians().cos()).abs();

    // Room for the remove icon next to each row label
    row_labels_width += options.spacing + 2.0 * options.spacing;
    column_labels_height += options.spacing;

    let present = data.values.iter().flatten().filter_map(|v| *v);
    let (min, max) = present.fold((options.null_value, options.null_value), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let limits = Limits { min, max };
    let scale_limits = Limits {
        min: options.scale_min.unwrap_or(limits.min),
        max: options.scale_max.unwrap_or(limits.max),
    };

    let mut cells = Vec::with_capacity(rows.len() * columns.len());
    for (row_index, row) in data.values.iter().enumerate() {
        for (column_index, value) in row.iter().enumerate() {
            cells.push(Cell {
                row_index,
                column_index,
                value: *value,
            });
        }
    }

    Ok(Parsed {
        labels: LabelSet::new(rows, columns),
        row_labels_width,
        column_labels_height,
        limits,
        scale_limits,
        cells,
    })
}

/// Output of the filter stage
#[derive(Debug, Clone, Default)]
pub struct Filtered {
    /// Cells that get drawn: visible row and a present value
    pub cells: Vec<Cell>,
    /// Visible row indices ordered by group key
    pub rows: Vec<usize>,
}

pub fn filter(parsed: &Parsed) -> Filtered {
    let rows = &parsed.labels.rows;
    let cells = parsed
        .cells
        .iter()
        .filter(|cell| !rows[cell.row_index].hidden && cell.value.is_some())
        .copied()
        .collect();

    let mut visible: Vec<&RowLabel> = rows.iter().filter(|r| !r.hidden).collect();
    visible.sort_by_key(|r| r.group_key());

    Filtered {
        cells,
        rows: visible.into_iter().map(|r| r.row_index).collect(),
    }
}

/// Categorical colors per metadata track: field → value → color
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataColors {
    tracks: BTreeMap<String, BTreeMap<String, String>>,
}

impl MetadataColors {
    pub fn color(&self, field: &str, value: &str) -> Option<&str> {
        self.tracks.get(field)?.get(value).map(String::as_str)
    }

    pub fn track(&self, field: &str) -> Option<&BTreeMap<String, String>> {
        self.tracks.get(field)
    }

    /// Legend for a track, with an `Unknown` entry when some column lacks the field
    pub fn legend(&self, field: &str, columns: &[ColumnLabel], no_value: &str) -> BTreeMap<String, String> {
        let mut legend = self.tracks.get(field).cloned().unwrap_or_default();
        if columns.iter().any(|c| c.metadatum(field).is_none()) {
            legend.insert("Unknown".to_string(), no_value.to_string());
        }
        legend
    }
}

/// Assign colors from one shared pool sized to the distinct values of all tracks.
pub fn process_metadata(
    columns: &[ColumnLabel],
    fields: &[ColumnMetadataField],
    colormap: &CategoricalColormap,
) -> MetadataColors {
    let distinct: usize = fields
        .iter()
        .map(|field| {
            let mut values: Vec<&str> = columns.iter().filter_map(|c| c.metadatum(&field.value)).collect();
            values.sort_unstable();
            values.dedup();
            values.len()
        })
        .sum();

    let mut pool = colormap.n_scale(distinct).into_iter();
    let mut tracks = BTreeMap::new();
    for field in fields {
        let mut track: BTreeMap<String, String> = BTreeMap::new();
        for column in columns {
            if let Some(value) = column.metadatum(&field.value) {
                if !track.contains_key(value) {
                    if let Some(color) = pool.next() {
                        track.insert(value.to_string(), color);
                    }
                }
            }
        }
        tracks.insert(field.value.clone(), track);
    }
    MetadataColors { tracks }
}

/// Active column metadata sort. Only one field sorts at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataSort {
    pub field: Option<String>,
    pub ascending: bool,
}

impl Default for MetadataSort {
    fn default() -> Self {
        Self {
            field: None,
            ascending: true,
        }
    }
}

impl MetadataSort {
    pub fn new(field: Option<String>, ascending: bool) -> Self {
        Self { field, ascending }
    }

    /// Cycle unset → ascending → descending → unset for `field`; picking
    /// another field starts it at ascending.
    pub fn toggle(&mut self, field: &str) {
        if self.field.as_deref() == Some(field) {
            if self.ascending {
                self.ascending = false;
            } else {
                self.field = None;
                self.ascending = true;
            }
        } else {
            self.field = Some(field.to_string());
            self.ascending = true;
        }
    }

    pub fn direction(&self) -> SortDirection {
        if self.ascending {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }
}

/// Output of the cluster stage
#[derive(Debug, Clone, Default)]
pub struct Ordering {
    /// `(row_index, pos)` for every visible row
    pub row_positions: Vec<(usize, usize)>,
    /// `(column_index, pos)` for every column
    pub column_positions: Vec<(usize, usize)>,
    pub row_tree: Option<ClusterTree>,
    pub column_tree: Option<ClusterTree>,
    /// Position of the first clustered column (the pinned block comes before it)
    pub column_tree_offset: usize,
}

impl Ordering {
    pub fn apply(&self, labels: &mut LabelSet) {
        for row in labels.rows.iter_mut() {
            row.pos = None;
        }
        for &(row_index, pos) in &self.row_positions {
            labels.rows[row_index].pos = Some(pos);
        }
        for &(column_index, pos) in &self.column_positions {
            labels.columns[column_index].pos = pos;
        }
    }

    pub fn row_depth(&self) -> usize {
        self.row_tree.as_ref().map_or(0, ClusterTree::depth)
    }

    pub fn column_depth(&self) -> usize {
        self.column_tree.as_ref().map_or(0, ClusterTree::depth)
    }
}

fn enumerate_positions(indices: impl IntoIterator<Item = usize>, offset: usize) -> Vec<(usize, usize)> {
    indices
        .into_iter()
        .enumerate()
        .map(|(i, idx)| (idx, offset + i))
        .collect()
}

fn cluster_observations(observations: &[Observation]) -> Option<ClusterTree> {
    let mut tree = hcluster(observations)?;
    tree.sort();
    Some(tree)
}

/// Compute display order for both axes.
///
/// Rows: explicit sort, clustering, or group-key order. Columns: metadata
/// sort, label sort, clustering, or input order. With pinning enabled,
/// pinned columns always occupy the first positions, alphabetically.
pub fn cluster(
    parsed: &Parsed,
    filtered: &Filtered,
    values: &Matrix,
    options: &HeatmapOptions,
    sort: &MetadataSort,
) -> Ordering {
    let labels = &parsed.labels;
    let scale = Scale::normalized(options.scale, parsed.limits);
    let normalized = |v: Option<f64>| scale.apply(v.unwrap_or(options.null_value));
    let mut ordering = Ordering::default();

    // Rows
    if options.should_sort_rows {
        let mut rows: Vec<&RowLabel> = filtered.rows.iter().map(|&i| &labels.rows[i]).collect();
        rows.sort_by(|a, b| options.row_sort_direction.apply(a.group_key().cmp(&b.group_key())));
        ordering.row_positions = enumerate_positions(rows.iter().map(|r| r.row_index), 0);
    } else if options.clustering {
        let observations: Vec<Observation> = labels
            .rows
            .iter()
            .filter(|r| !r.hidden)
            .map(|r| Observation {
                idx: r.row_index,
                values: values[r.row_index].iter().map(|v| normalized(*v)).collect(),
            })
            .collect();
        ordering.row_tree = cluster_observations(&observations);
        ordering.row_positions = match &ordering.row_tree {
            Some(tree) => tree.positions(0),
            None => Vec::new(),
        };
    } else {
        ordering.row_positions = enumerate_positions(filtered.rows.iter().copied(), 0);
    }

    // Columns
    let pinning = options.pin_columns;
    let pinned_first = |a: &ColumnLabel, b: &ColumnLabel| {
        if pinning {
            b.pinned.cmp(&a.pinned)
        } else {
            std::cmp::Ordering::Equal
        }
    };
    let mut columns: Vec<&ColumnLabel> = labels.columns.iter().collect();

    if let Some(field) = sort.field.as_deref() {
        let direction = sort.direction();
        columns.sort_by(|a, b| {
            pinned_first(*a, *b).then_with(|| {
                if pinning && a.pinned && b.pinned {
                    return a.label.cmp(&b.label);
                }
                // Missing values sort last in either direction
                let by_value = match (a.metadatum(field), b.metadatum(field)) {
                    (Some(x), Some(y)) => direction.apply(x.cmp(y)),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                };
                if pinning {
                    by_value.then_with(|| a.label.cmp(&b.label))
                } else {
                    by_value
                }
            })
        });
        ordering.column_positions = enumerate_positions(columns.iter().map(|c| c.column_index), 0);
    } else if options.should_sort_columns {
        let direction = options.column_sort_direction;
        columns.sort_by(|a, b| pinned_first(*a, *b).then_with(|| direction.apply(a.label.cmp(&b.label))));
        ordering.column_positions = enumerate_positions(columns.iter().map(|c| c.column_index), 0);
    } else if options.clustering {
        let (pinned, clustered): (Vec<&ColumnLabel>, Vec<&ColumnLabel>) = if pinning {
            let mut pinned: Vec<&ColumnLabel> = columns.iter().copied().filter(|c| c.pinned).collect();
            pinned.sort_by(|a, b| a.label.cmp(&b.label));
            (pinned, columns.iter().copied().filter(|c| !c.pinned).collect())
        } else {
            (Vec::new(), columns)
        };
        let visible_rows: Vec<usize> = labels.rows.iter().filter(|r| !r.hidden).map(|r| r.row_index).collect();
        let observations: Vec<Observation> = clustered
            .iter()
            .map(|c| Observation {
                idx: c.column_index,
                values: visible_rows
                    .iter()
                    .map(|&row| normalized(values[row][c.column_index]))
                    .collect(),
            })
            .collect();

        ordering.column_tree_offset = pinned.len();
        ordering.column_positions = enumerate_positions(pinned.iter().map(|c| c.column_index), 0);
        ordering.column_tree = cluster_observations(&observations);
        if let Some(tree) = &ordering.column_tree {
            ordering.column_positions.extend(tree.positions(pinned.len()));
        }
    } else {
        columns.sort_by(|a, b| pinned_first(*a, *b).then(a.column_index.cmp(&b.column_index)));
        ordering.column_positions = enumerate_positions(columns.iter().map(|c| c.column_index), 0);
    }

    ordering
}
