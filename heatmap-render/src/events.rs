//! Callbacks the engine raises toward its host, and the payloads they carry.
//!
//! Every method has a no-op default so hosts implement only what they use.
//! Payloads are plain data; nothing here borrows engine internals.

use heatmap_core::{ColumnId, Point};
use serde::Serialize;

/// Whether a hovered cell is backed by data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellStatus {
    DataBacked,
    /// Has data but fails the host's threshold filters
    FilteredOut,
    /// No value and no metric at this position
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    pub key: String,
    pub label: String,
    pub value: Option<f64>,
}

/// Everything a host needs to draw a cell tooltip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellTooltip {
    pub row_index: usize,
    pub column_index: usize,
    pub row_label: String,
    pub genus_name: Option<String>,
    pub column_id: ColumnId,
    pub column_label: String,
    pub value: Option<f64>,
    pub metrics: Vec<MetricValue>,
    pub status: CellStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnchorKind {
    AddRow,
    AddColumnMetadata,
    PinColumns,
}

/// Where the host should attach an external selector, in drawing coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Anchor {
    pub kind: AnchorKind,
    pub x: f64,
    pub y: f64,
}

/// Rows sharing a group key, reported when a row label is hovered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowGroupInfo {
    pub label: String,
    pub genus_name: Option<String>,
    pub row_count: usize,
    /// Bounding box of the group's labels in drawing coordinates
    pub top_left: Point,
    pub bottom_right: Point,
    /// Lower edge of the metadata zone, so a tooltip can avoid covering it
    pub metadata_bottom: f64,
}

pub trait HeatmapEvents {
    fn node_hover(&mut self, _tooltip: &CellTooltip) {}
    fn node_hover_out(&mut self) {}
    fn cell_click(&mut self, _tooltip: &CellTooltip) {}

    fn row_label_click(&mut self, _label: &str) {}
    fn column_label_click(&mut self, _id: ColumnId) {}
    fn column_label_hover(&mut self, _id: ColumnId) {}
    fn column_label_out(&mut self) {}
    fn row_group_enter(&mut self, _group: &RowGroupInfo) {}
    fn row_group_leave(&mut self) {}

    fn metadata_node_hover(&mut self, _id: ColumnId, _field: &str) {}
    fn metadata_node_out(&mut self) {}

    fn remove_row(&mut self, _label: &str) {}
    fn unpin_column(&mut self, _id: ColumnId) {}

    fn add_row_click(&mut self, _anchor: &Anchor) {}
    fn add_column_metadata_click(&mut self, _anchor: &Anchor) {}
    fn pin_column_click(&mut self, _anchor: &Anchor) {}

    fn column_metadata_sort_change(&mut self, _field: Option<&str>, _ascending: bool) {}
}

/// Host that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEvents;

impl HeatmapEvents for NoopEvents {}

/// Event record produced by [`RecordingEvents`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RecordedEvent {
    NodeHover(CellTooltip),
    NodeHoverOut,
    CellClick(CellTooltip),
    RowLabelClick(String),
    ColumnLabelClick(ColumnId),
    ColumnLabelHover(ColumnId),
    ColumnLabelOut,
    RowGroupEnter(RowGroupInfo),
    RowGroupLeave,
    MetadataNodeHover(ColumnId, String),
    MetadataNodeOut,
    RemoveRow(String),
    UnpinColumn(ColumnId),
    AddRowClick(Anchor),
    AddColumnMetadataClick(Anchor),
    PinColumnClick(Anchor),
    ColumnMetadataSortChange(Option<String>, bool),
}

/// Host that keeps every event it receives, in order.
///
/// Clones share the same log, so a test can keep one handle while the engine
/// owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingEvents {
    log: std::rc::Rc<std::cell::RefCell<Vec<RecordedEvent>>>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    fn push(&self, event: RecordedEvent) {
        self.log.borrow_mut().push(event);
    }
}

impl HeatmapEvents for RecordingEvents {
    fn node_hover(&mut self, tooltip: &CellTooltip) {
        self.push(RecordedEvent::NodeHover(tooltip.clone()));
    }
    fn node_hover_out(&mut self) {
        self.push(RecordedEvent::NodeHoverOut);
    }
    fn cell_click(&mut self, tooltip: &CellTooltip) {
        self.push(RecordedEvent::CellClick(tooltip.clone()));
    }
    fn row_label_click(&mut self, label: &str) {
        self.push(RecordedEvent::RowLabelClick(label.to_string()));
    }
    fn column_label_click(&mut self, id: ColumnId) {
        self.push(RecordedEvent::ColumnLabelClick(id));
    }
    fn column_label_hover(&mut self, id: ColumnId) {
        self.push(RecordedEvent::ColumnLabelHover(id));
    }
    fn column_label_out(&mut self) {
        self.push(RecordedEvent::ColumnLabelOut);
    }
    fn row_group_enter(&mut self, group: &RowGroupInfo) {
        self.push(RecordedEvent::RowGroupEnter(group.clone()));
    }
    fn row_group_leave(&mut self) {
        self.push(RecordedEvent::RowGroupLeave);
    }
    fn metadata_node_hover(&mut self, id: ColumnId, field: &str) {
        self.push(RecordedEvent::MetadataNodeHover(id, field.to_string()));
    }
    fn metadata_node_out(&mut self) {
        self.push(RecordedEvent::MetadataNodeOut);
    }
    fn remove_row(&mut self, label: &str) {
        self.push(RecordedEvent::RemoveRow(label.to_string()));
    }
    fn unpin_column(&mut self, id: ColumnId) {
        self.push(RecordedEvent::UnpinColumn(id));
    }
    fn add_row_click(&mut self, anchor: &Anchor) {
        self.push(RecordedEvent::AddRowClick(*anchor));
    }
    fn add_column_metadata_click(&mut self, anchor: &Anchor) {
        self.push(RecordedEvent::AddColumnMetadataClick(*anchor));
    }
    fn pin_column_click(&mut self, anchor: &Anchor) {
        self.push(RecordedEvent::PinColumnClick(*anchor));
    }
    fn column_metadata_sort_change(&mut self, field: Option<&str>, ascending: bool) {
        self.push(RecordedEvent::ColumnMetadataSortChange(field.map(str::to_string), ascending));
    }
}
