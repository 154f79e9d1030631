//! Pointer, keyboard and label interactions on a [`Heatmap`].
//!
//! The host translates its input events into these calls. Positions passed
//! in are in the coordinates of the layer being interacted with (the cell
//! grid, a dendrogram container); anything reported back is in drawing
//! coordinates.

use heatmap_core::{Axis, CellId, ColumnId, HeatmapError, NodeId, Point, Result, Size, Stage};

use crate::draw::{self, LinkKind};
use crate::engine::{Heatmap, Highlight, Task};
use crate::events::{Anchor, AnchorKind, CellStatus, CellTooltip, MetricValue, RowGroupInfo};
use crate::scene::Layer;

/// Key that turns a drag into a pan
pub const PAN_KEY: &str = "Space";

impl Heatmap {
    // Cells

    fn check_cell(&self, id: CellId) -> Result<()> {
        if id.row_index < self.parsed.labels.rows.len() && id.column_index < self.parsed.labels.columns.len() {
            Ok(())
        } else {
            Err(HeatmapError::unknown_label("cell", id.to_string()))
        }
    }

    fn row_by_label(&self, label: &str) -> Result<usize> {
        self.parsed
            .labels
            .row_index(label)
            .ok_or_else(|| HeatmapError::unknown_label(Axis::Rows.name(), label))
    }

    fn column_by_id(&self, id: ColumnId) -> Result<usize> {
        self.parsed
            .labels
            .column_index(id)
            .ok_or_else(|| HeatmapError::unknown_label(Axis::Columns.name(), id.to_string()))
    }

    /// Tooltip payload for a grid position, whether or not it holds data
    pub fn tooltip(&self, id: CellId) -> Result<CellTooltip> {
        self.check_cell(id)?;
        let row = &self.parsed.labels.rows[id.row_index];
        let column = &self.parsed.labels.columns[id.column_index];
        let value = self.data.values[id.row_index][id.column_index];
        let metrics: Vec<MetricValue> = self
            .data
            .metrics
            .iter()
            .map(|metric| MetricValue {
                key: metric.key.clone(),
                label: metric.label.clone(),
                value: metric.values[id.row_index][id.column_index],
            })
            .collect();

        let passes = self
            .data
            .threshold_mask
            .as_ref()
            .map_or(true, |mask| mask[id.row_index][id.column_index]);
        let status = if value.is_none() && metrics.iter().all(|m| m.value.is_none()) {
            CellStatus::Absent
        } else if !passes {
            CellStatus::FilteredOut
        } else {
            CellStatus::DataBacked
        };

        Ok(CellTooltip {
            row_index: id.row_index,
            column_index: id.column_index,
            row_label: row.label.clone(),
            genus_name: row.genus_name.clone(),
            column_id: column.id,
            column_label: column.label.clone(),
            value,
            metrics,
            status,
        })
    }

    /// Highlight a cell's row and column and report its tooltip data.
    /// Hovering the cell already hovered does nothing.
    pub fn hover_cell(&mut self, id: CellId) -> Result<()> {
        self.check_cell(id)?;
        if self.view.hovered_cell == Some(id) {
            return Ok(());
        }
        self.leave_cell();

        let tooltip = self.tooltip(id)?;
        self.parsed.labels.rows[id.row_index].highlighted = true;
        self.parsed.labels.columns[id.column_index].highlighted = true;
        self.view.hovered_cell = Some(id);
        self.redraw(&[Layer::Hover, Layer::RowLabels, Layer::ColumnLabels]);
        self.events.node_hover(&tooltip);
        Ok(())
    }

    pub fn leave_cell(&mut self) {
        let Some(id) = self.view.hovered_cell.take() else {
            return;
        };
        if let Some(row) = self.parsed.labels.rows.get_mut(id.row_index) {
            row.highlighted = false;
        }
        if let Some(column) = self.parsed.labels.columns.get_mut(id.column_index) {
            column.highlighted = false;
        }
        self.redraw(&[Layer::Hover, Layer::RowLabels, Layer::ColumnLabels]);
        self.events.node_hover_out();
    }

    pub fn click_cell(&mut self, id: CellId) -> Result<()> {
        let tooltip = self.tooltip(id)?;
        self.events.cell_click(&tooltip);
        Ok(())
    }

    /// Grid position under `point`, given in cell-grid coordinates.
    /// Works for every position, including ones with no drawn cell.
    pub fn cell_from_cursor(&self, point: Point) -> Option<CellId> {
        let layout = &self.layout;
        let labels = &self.parsed.labels;
        let rows = labels.visible_row_count();
        let columns = labels.columns.len();
        if rows == 0 || columns == 0 || layout.total_cell_width <= 0.0 || layout.total_cell_height <= 0.0 {
            return None;
        }
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let x_pos = (point.x / layout.total_cell_width * columns as f64).floor() as usize;
        let y_pos = (point.y / layout.total_cell_height * rows as f64).floor() as usize;
        let row = labels.row_at(y_pos)?;
        let column = labels.column_at(x_pos)?;
        Some(CellId {
            row_index: row.row_index,
            column_index: column.column_index,
        })
    }

    /// Pointer moved over the background grid. Leaves the previously hovered
    /// position and hovers the new one.
    pub fn grid_pointer_move(&mut self, point: Point) -> Result<Option<CellId>> {
        let cell = self.cell_from_cursor(point);
        if cell != self.view.grid_hover {
            match cell {
                Some(id) => self.hover_cell(id)?,
                None => self.leave_cell(),
            }
            self.view.grid_hover = cell;
        }
        Ok(cell)
    }

    pub fn grid_pointer_leave(&mut self) {
        if self.view.grid_hover.take().is_some() {
            self.leave_cell();
        }
    }

    pub fn grid_click(&mut self, point: Point) -> Result<Option<CellId>> {
        let cell = self.cell_from_cursor(point);
        if let Some(id) = cell {
            self.click_cell(id)?;
        }
        Ok(cell)
    }

    // Labels

    /// Highlight a row label. Outside row clustering, rows sharing its group
    /// key are highlighted too and the group bounds are reported.
    pub fn hover_row_label(&mut self, label: &str) -> Result<()> {
        let idx = self.row_by_label(label)?;
        if self.parsed.labels.rows[idx].pos.is_none() {
            log::debug!("Ignoring hover on hidden row {}", label);
            return Ok(());
        }
        self.parsed.labels.rows[idx].highlighted = true;

        let group = match self.parsed.labels.rows[idx].sort_key.clone() {
            Some(key) if !self.rows_clustered() => Some(key),
            _ => None,
        };
        let Some(key) = group else {
            self.redraw(&[Layer::RowLabels]);
            return Ok(());
        };

        self.view.row_group_hover = Some(label.to_string());
        self.redraw(&[Layer::RowLabels]);

        let members: Vec<usize> = self
            .parsed
            .labels
            .rows
            .iter()
            .filter(|r| r.sort_key.as_ref() == Some(&key))
            .filter_map(|r| r.pos)
            .collect();
        let first = members.iter().copied().min().unwrap_or(0);
        let last = members.iter().copied().max().unwrap_or(first);
        let row = &self.parsed.labels.rows[idx];
        let layout = &self.layout;
        let tracks = self.options.column_metadata.len();
        let info = RowGroupInfo {
            label: row.label.clone(),
            genus_name: row.genus_name.clone(),
            row_count: members.len(),
            top_left: self.scene.to_drawing(Layer::RowLabels, Point::new(0.0, layout.cell_y(first))),
            bottom_right: self.scene.to_drawing(
                Layer::RowLabels,
                Point::new(layout.row_labels_width, layout.cell_y(last) + layout.cell.height),
            ),
            metadata_bottom: self
                .scene
                .to_drawing(Layer::MetadataCells, Point::new(0.0, draw::metadata_track_y(self, tracks)))
                .y,
        };
        self.events.row_group_enter(&info);
        Ok(())
    }

    pub fn leave_row_label(&mut self) {
        for row in self.parsed.labels.rows.iter_mut() {
            row.highlighted = false;
        }
        let had_group = self.view.row_group_hover.take().is_some();
        self.redraw(&[Layer::RowLabels]);
        self.highlight_row_or_column(None);
        if had_group {
            self.events.row_group_leave();
        }
    }

    pub fn click_row_label(&mut self, label: &str) -> Result<()> {
        self.row_by_label(label)?;
        self.events.row_label_click(label);
        Ok(())
    }

    pub fn hover_column_label(&mut self, id: ColumnId) -> Result<()> {
        let idx = self.column_by_id(id)?;
        self.parsed.labels.columns[idx].highlighted = true;
        self.redraw(&[Layer::ColumnLabels]);
        self.events.column_label_hover(id);
        Ok(())
    }

    pub fn leave_column_label(&mut self) {
        for column in self.parsed.labels.columns.iter_mut() {
            column.highlighted = false;
        }
        self.redraw(&[Layer::ColumnLabels]);
        self.events.column_label_out();
    }

    pub fn click_column_label(&mut self, id: ColumnId) -> Result<()> {
        self.column_by_id(id)?;
        self.events.column_label_click(id);
        Ok(())
    }

    // Column metadata

    fn check_metadata_field(&self, field: &str) -> Result<()> {
        if self.options.column_metadata.iter().any(|f| f.value == field) {
            Ok(())
        } else {
            Err(HeatmapError::unknown_label("metadata field", field))
        }
    }

    pub fn hover_metadata_cell(&mut self, id: ColumnId, field: &str) -> Result<()> {
        let idx = self.column_by_id(id)?;
        self.check_metadata_field(field)?;
        self.parsed.labels.columns[idx].highlighted = true;
        self.redraw(&[Layer::ColumnLabels]);
        self.events.metadata_node_hover(id, field);
        Ok(())
    }

    pub fn leave_metadata_cell(&mut self) {
        for column in self.parsed.labels.columns.iter_mut() {
            column.highlighted = false;
        }
        self.redraw(&[Layer::ColumnLabels]);
        self.events.metadata_node_out();
    }

    /// Advance the sort cycle of `field` and reorder columns.
    pub fn click_metadata_label(&mut self, field: &str) -> Result<()> {
        self.check_metadata_field(field)?;
        self.metadata_sort.toggle(field);
        self.process_data(Stage::Cluster)?;
        let sort = self.metadata_sort.clone();
        self.events
            .column_metadata_sort_change(sort.field.as_deref(), sort.ascending);
        Ok(())
    }

    // Dendrograms

    /// Highlight the branch rooted at `node` and every leaf under it; all
    /// other labels of that axis are shaded.
    pub fn hover_dendrogram(&mut self, axis: Axis, node: NodeId) -> Result<()> {
        let tree = match axis {
            Axis::Rows => self.ordering.row_tree.as_ref(),
            Axis::Columns => self.ordering.column_tree.as_ref(),
        };
        let Some(tree) = tree else {
            return Ok(());
        };
        if node >= tree.len() {
            return Err(HeatmapError::unknown_label(axis.name(), format!("node {}", node)));
        }
        let leaves = tree.leaves_under(node);

        let labels = &mut self.parsed.labels;
        let first = match axis {
            Axis::Rows => {
                for row in labels.rows.iter_mut() {
                    let under = leaves.contains(&row.row_index);
                    row.highlighted = under;
                    row.shaded = !under && row.pos.is_some();
                }
                leaves.iter().filter_map(|&i| labels.rows[i].pos).min()
            }
            Axis::Columns => {
                for column in labels.columns.iter_mut() {
                    let under = leaves.contains(&column.column_index);
                    column.highlighted = under;
                    column.shaded = !under;
                }
                leaves.iter().map(|&i| labels.columns[i].pos).min()
            }
        };

        self.view.dendrogram_hover = Some((axis, node));
        let (tree_layer, label_layer) = match axis {
            Axis::Rows => (Layer::RowDendrogram, Layer::RowLabels),
            Axis::Columns => (Layer::ColumnDendrogram, Layer::ColumnLabels),
        };
        self.redraw(&[tree_layer, label_layer]);
        if let Some(pos) = first {
            self.highlight_row_or_column(Some(Highlight {
                axis,
                pos,
                count: leaves.len(),
            }));
        }
        Ok(())
    }

    /// Hover whichever dendrogram link target contains `point`
    /// (dendrogram container coordinates).
    pub fn dendrogram_pointer_move(&mut self, axis: Axis, point: Point) -> Result<Option<NodeId>> {
        let dendrogram = match axis {
            Axis::Rows => self.dendrograms.rows.as_ref(),
            Axis::Columns => self.dendrograms.columns.as_ref(),
        };
        let source = dendrogram.and_then(|d| d.link_at(point)).map(|link| link.source);
        match source {
            Some(node) if self.view.dendrogram_hover != Some((axis, node)) => self.hover_dendrogram(axis, node)?,
            Some(_) => {}
            None => self.leave_dendrogram(),
        }
        Ok(source)
    }

    pub fn leave_dendrogram(&mut self) {
        if self.view.dendrogram_hover.take().is_none() {
            return;
        }
        for row in self.parsed.labels.rows.iter_mut() {
            row.highlighted = false;
            row.shaded = false;
        }
        for column in self.parsed.labels.columns.iter_mut() {
            column.highlighted = false;
            column.shaded = false;
        }
        self.redraw(&[
            Layer::RowDendrogram,
            Layer::ColumnDendrogram,
            Layer::RowLabels,
            Layer::ColumnLabels,
        ]);
        self.highlight_row_or_column(None);
    }

    // Overlays

    /// Veil everything outside `highlight`. Clearing is debounced so moving
    /// between neighbouring targets does not flicker.
    pub fn highlight_row_or_column(&mut self, highlight: Option<Highlight>) {
        if let Some(pending) = self.view.overlay_clear.take() {
            self.scheduler.cancel(pending);
        }
        match highlight {
            Some(h) => {
                self.view.highlight = Some(h);
                self.redraw(&[Layer::Overlays]);
            }
            None if self.view.highlight.is_some() => {
                let due = self.clock.now_ms() + self.options.overlay_debounce_ms;
                self.view.overlay_clear = Some(self.scheduler.schedule(due, Task::ClearOverlays));
            }
            None => {}
        }
    }

    /// Drop the overlays immediately
    pub fn clear_overlays(&mut self) {
        if let Some(pending) = self.view.overlay_clear.take() {
            self.scheduler.cancel(pending);
        }
        if self.view.highlight.take().is_some() {
            self.redraw(&[Layer::Overlays]);
        }
    }

    /// Run every task that has come due and sweep faded elements.
    /// Returns the number of tasks run.
    pub fn tick(&mut self) -> usize {
        let now = self.clock.now_ms();
        let tasks = self.scheduler.take_due(now);
        let ran = tasks.len();
        for task in tasks {
            match task {
                Task::ClearOverlays => {
                    self.view.overlay_clear = None;
                    self.view.highlight = None;
                    self.redraw(&[Layer::Overlays]);
                }
                Task::EndScrollHighlight { row_index } => {
                    if let Some(row) = self.parsed.labels.rows.get_mut(row_index) {
                        row.highlighted = false;
                    }
                    self.redraw(&[Layer::RowLabels]);
                }
            }
        }
        let swept = self.scene.sweep(now);
        if swept > 0 {
            log::debug!("Swept {} faded elements", swept);
        }
        ran
    }

    // Mutations

    /// Hide a row and re-filter. The host is told so it can persist the change.
    pub fn remove_row(&mut self, label: &str) -> Result<()> {
        let idx = self.row_by_label(label)?;
        self.data.row_labels[idx].hidden = true;
        let row = &mut self.parsed.labels.rows[idx];
        row.hidden = true;
        row.highlighted = false;
        row.shaded = false;

        self.clear_overlays();
        if self.view.hovered_cell.map_or(false, |cell| cell.row_index == idx) {
            self.view.hovered_cell = None;
            self.view.grid_hover = None;
        }
        self.view.row_group_hover = None;
        self.process_data(Stage::Filter)?;
        self.events.remove_row(label);
        Ok(())
    }

    fn set_pinned(&mut self, id: ColumnId, pinned: bool) -> Result<()> {
        let idx = self.column_by_id(id)?;
        self.data.column_labels[idx].pinned = pinned;
        self.parsed.labels.columns[idx].pinned = pinned;
        self.process_data(Stage::Cluster)
    }

    pub fn pin_column(&mut self, id: ColumnId) -> Result<()> {
        self.set_pinned(id, true)
    }

    /// Unpin a column, as the pin icon does when clicked
    pub fn unpin_column(&mut self, id: ColumnId) -> Result<()> {
        self.set_pinned(id, false)?;
        self.events.unpin_column(id);
        Ok(())
    }

    // Affordance links

    fn click_link(&mut self, kind: LinkKind) -> Option<Anchor> {
        if !draw::enabled_links(self).contains(&kind) {
            return None;
        }
        let point = self.scene.to_drawing(Layer::Links, draw::link_anchor(self, kind));
        let anchor = Anchor {
            kind: match kind {
                LinkKind::AddRow => AnchorKind::AddRow,
                LinkKind::AddColumnMetadata => AnchorKind::AddColumnMetadata,
                LinkKind::PinColumns => AnchorKind::PinColumns,
            },
            x: point.x,
            y: point.y,
        };
        match kind {
            LinkKind::AddRow => self.events.add_row_click(&anchor),
            LinkKind::AddColumnMetadata => self.events.add_column_metadata_click(&anchor),
            LinkKind::PinColumns => self.events.pin_column_click(&anchor),
        }
        Some(anchor)
    }

    /// Returns `None` when the link is disabled
    pub fn click_add_row(&mut self) -> Option<Anchor> {
        self.click_link(LinkKind::AddRow)
    }

    pub fn click_add_column_metadata(&mut self) -> Option<Anchor> {
        self.click_link(LinkKind::AddColumnMetadata)
    }

    pub fn click_pin_columns(&mut self) -> Option<Anchor> {
        self.click_link(LinkKind::PinColumns)
    }

    // Viewport

    /// Start listening for the pan key
    pub fn mount(&mut self) {
        self.view.mounted = true;
    }

    /// Stop listening; any drag in progress ends
    pub fn unmount(&mut self) {
        self.view.mounted = false;
        self.view.space_held = false;
        self.view.mouse_down = false;
        self.view.drag_from = None;
    }

    /// Returns `true` when the key was consumed
    pub fn key_down(&mut self, code: &str) -> bool {
        if !self.view.mounted || code != PAN_KEY {
            return false;
        }
        self.view.space_held = true;
        true
    }

    pub fn key_up(&mut self, code: &str) -> bool {
        if !self.view.mounted || code != PAN_KEY {
            return false;
        }
        self.view.space_held = false;
        self.view.drag_from = None;
        true
    }

    pub fn mouse_down(&mut self, point: Point) {
        self.view.mouse_down = true;
        self.view.drag_from = Some(point);
    }

    /// Pan by the pointer delta while the pan key is held. `point` is in
    /// screen pixels. Returns `true` if the view moved.
    pub fn mouse_move(&mut self, point: Point) -> bool {
        if !(self.view.space_held && self.view.mouse_down) {
            return false;
        }
        let Some(from) = self.view.drag_from.replace(point) else {
            return false;
        };
        let zoom = self.layout.zoom;
        let before = self.view.pan;
        let after = self.pan((point.x - from.x) / zoom, (point.y - from.y) / zoom);
        before != after
    }

    pub fn mouse_up(&mut self) {
        self.view.mouse_down = false;
        self.view.drag_from = None;
    }

    /// Scroll by wheel deltas in screen pixels
    pub fn wheel(&mut self, delta_x: f64, delta_y: f64) -> Point {
        let zoom = self.layout.zoom;
        self.pan(-delta_x / zoom, -delta_y / zoom)
    }

    /// Translate the drawing, clamped so no edge is pulled past the viewport.
    /// Returns the resulting translation.
    pub fn pan(&mut self, dx: f64, dy: f64) -> Point {
        let (min, max) = self.pan_bounds();
        let pan = self.view.pan;
        self.view.pan = Point::new(
            (pan.x + dx).max(min.x).min(max.x),
            (pan.y + dy).max(min.y).min(max.y),
        );
        self.apply_transforms();
        self.view.pan
    }

    /// Allowed range of the root translation
    pub fn pan_bounds(&self) -> (Point, Point) {
        let layout = &self.layout;
        let container = self.view.container.unwrap_or_else(|| layout.surface());
        let scroll_max = layout.scroll_max(container);
        let max = Point::new(layout.margin_left, layout.margin_top);
        let min = Point::new(scroll_max.x.min(max.x), scroll_max.y.min(max.y));
        (min, max)
    }

    /// Size of the host viewport in screen pixels
    pub fn set_container_size(&mut self, size: Size) {
        self.view.container = Some(size);
        self.pan(0.0, 0.0);
    }

    /// Bring a row into the upper part of the viewport and pulse its label.
    /// Returns `false` for a hidden row.
    pub fn scroll_to_row(&mut self, label: &str) -> Result<bool> {
        let idx = self.row_by_label(label)?;
        let Some(pos) = self.parsed.labels.rows[idx].pos else {
            return Ok(false);
        };
        let layout = &self.layout;
        let container = self.view.container.unwrap_or_else(|| layout.surface());
        let row_offset = container.height / 4.0
            - (layout.cell_y(pos) + layout.total_metadata_height + layout.total_row_add_link_height);
        let (min, max) = self.pan_bounds();
        self.view.pan.y = (layout.margin_top + row_offset).max(min.y).min(max.y);
        self.apply_transforms();

        self.parsed.labels.rows[idx].highlighted = true;
        self.redraw(&[Layer::RowLabels]);
        self.scheduler
            .cancel_where(|task| *task == Task::EndScrollHighlight { row_index: idx });
        let due = self.clock.now_ms() + self.options.scroll_highlight_ms;
        self.scheduler.schedule(due, Task::EndScrollHighlight { row_index: idx });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{RecordedEvent, RecordingEvents};
    use crate::schedule::ManualClock;
    use heatmap_core::{ColumnLabelInput, HeatmapData, HeatmapOptions, MetricMatrix, RowLabelInput};

    fn data() -> HeatmapData {
        let mut data = HeatmapData::new(
            vec![vec![Some(1.0), None], vec![None, Some(2.0)]],
            vec![RowLabelInput::new("R1"), RowLabelInput::new("R2")],
            vec![ColumnLabelInput::new(10, "S1"), ColumnLabelInput::new(20, "S2")],
        );
        data.metrics.push(MetricMatrix {
            key: "nt_rpm".into(),
            label: "NT rPM".into(),
            values: vec![vec![Some(5.0), Some(7.0)], vec![None, Some(9.0)]],
        });
        data.threshold_mask = Some(vec![vec![true, false], vec![true, true]]);
        data
    }

    fn heatmap() -> (Heatmap, RecordingEvents, ManualClock) {
        let events = RecordingEvents::new();
        let clock = ManualClock::new(0);
        let options = HeatmapOptions {
            clustering: false,
            ..Default::default()
        };
        let heatmap = Heatmap::new(data(), options)
            .unwrap()
            .with_events(events.clone())
            .with_clock(clock.clone());
        (heatmap, events, clock)
    }

    fn cell(row_index: usize, column_index: usize) -> CellId {
        CellId {
            row_index,
            column_index,
        }
    }

    #[test]
    fn test_tooltip_status() {
        let (heatmap, _, _) = heatmap();
        assert_eq!(heatmap.tooltip(cell(0, 0)).unwrap().status, CellStatus::DataBacked);
        // Value missing but a metric is present, and the mask rejects it
        assert_eq!(heatmap.tooltip(cell(0, 1)).unwrap().status, CellStatus::FilteredOut);
        assert_eq!(heatmap.tooltip(cell(1, 0)).unwrap().status, CellStatus::Absent);
        let tooltip = heatmap.tooltip(cell(1, 1)).unwrap();
        assert_eq!(tooltip.column_id, 20);
        assert_eq!(tooltip.metrics[0].value, Some(9.0));
        assert!(heatmap.tooltip(cell(5, 0)).is_err());
    }

    #[test]
    fn test_hover_then_leave_cell() {
        let (mut heatmap, events, _) = heatmap();
        heatmap.hover_cell(cell(0, 0)).unwrap();
        heatmap.hover_cell(cell(0, 0)).unwrap();
        assert!(heatmap.labels().rows[0].highlighted);
        assert_eq!(heatmap.scene().live_count(Layer::Hover), 1);
        heatmap.leave_cell();
        assert!(!heatmap.labels().rows[0].highlighted);
        assert_eq!(heatmap.scene().live_count(Layer::Hover), 0);
        let recorded = events.events();
        assert_eq!(recorded.len(), 2);
        assert!(matches!(recorded[0], RecordedEvent::NodeHover(_)));
        assert_eq!(recorded[1], RecordedEvent::NodeHoverOut);
    }

    #[test]
    fn test_grid_hit_test_covers_empty_cells() {
        let (mut heatmap, events, _) = heatmap();
        let layout = heatmap.layout().clone();
        let inside_empty = Point::new(layout.cell.width * 1.5, layout.cell.height * 0.5);
        assert_eq!(heatmap.grid_pointer_move(inside_empty).unwrap(), Some(cell(0, 1)));
        let next = Point::new(layout.cell.width * 0.5, layout.cell.height * 1.5);
        assert_eq!(heatmap.grid_pointer_move(next).unwrap(), Some(cell(1, 0)));
        heatmap.grid_pointer_leave();
        let kinds: Vec<&str> = events
            .events()
            .iter()
            .map(|e| match e {
                RecordedEvent::NodeHover(_) => "hover",
                RecordedEvent::NodeHoverOut => "out",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["hover", "out", "hover", "out"]);
        assert_eq!(heatmap.cell_from_cursor(Point::new(-1.0, 0.0)), None);
        assert_eq!(
            heatmap.cell_from_cursor(Point::new(layout.total_cell_width + 1.0, 0.0)),
            None
        );
    }

    #[test]
    fn test_overlay_clear_is_debounced() {
        let (mut heatmap, _, clock) = heatmap();
        let band = Highlight {
            axis: Axis::Columns,
            pos: 1,
            count: 1,
        };
        heatmap.highlight_row_or_column(Some(band));
        assert_eq!(heatmap.scene().live_count(Layer::Overlays), 1);

        heatmap.highlight_row_or_column(None);
        clock.advance(50);
        heatmap.tick();
        assert_eq!(heatmap.highlight(), Some(band));

        // A new highlight inside the window cancels the pending clear
        heatmap.highlight_row_or_column(Some(band));
        clock.advance(100);
        assert_eq!(heatmap.tick(), 0);
        assert_eq!(heatmap.highlight(), Some(band));

        heatmap.highlight_row_or_column(None);
        clock.advance(100);
        assert_eq!(heatmap.tick(), 1);
        assert_eq!(heatmap.highlight(), None);
    }

    #[test]
    fn test_key_handling_requires_mount() {
        let (mut heatmap, _, _) = heatmap();
        assert!(!heatmap.key_down(PAN_KEY));
        heatmap.mount();
        assert!(heatmap.key_down(PAN_KEY));
        assert!(!heatmap.key_down("KeyA"));
        heatmap.unmount();
        assert!(!heatmap.key_up(PAN_KEY));
    }

    #[test]
    fn test_disabled_links_do_nothing() {
        let (mut heatmap, events, _) = heatmap();
        assert_eq!(heatmap.click_add_row(), None);
        assert!(events.events().is_empty());
    }

    #[test]
    fn test_unknown_labels_are_errors() {
        let (mut heatmap, _, _) = heatmap();
        assert!(matches!(
            heatmap.remove_row("nope"),
            Err(HeatmapError::UnknownLabel { axis: "row", .. })
        ));
        assert!(heatmap.unpin_column(99).is_err());
        assert!(heatmap.click_metadata_label("host").is_err());
    }
}
