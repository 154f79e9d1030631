/*!
# Heatmap Engine

`Heatmap` owns the caller's data and options, runs the staged pipeline and
keeps the retained scene in sync with the result. Entering the pipeline at a
stage runs that stage and everything after it, so each update method only
recomputes what its input can affect.
*/

use std::collections::BTreeMap;
use std::time::Instant;

use heatmap_core::{
    cluster_stage, current_view_csv, filter, parse, place_containers, process_metadata, ApproxTextMeasure, Axis,
    CategoricalColormap, Cell, CellId, ColorOverride, ColorScale, ColumnMetadataField, CsvView, Filtered,
    HeatmapData, HeatmapOptions, LabelSet, Layout, LayoutInput, MetadataColors, MetadataSort, NodeId, Ordering,
    Parsed, Point, Result, ScaleKind, Size, Stage, TextMeasure,
};

use crate::dendrogram::{layout_dendrogram, DendrogramLayout};
use crate::draw;
use crate::events::{HeatmapEvents, NoopEvents};
use crate::schedule::{Clock, Scheduler, SystemClock, TaskId};
use crate::scene::{JoinStats, Layer, Scene};

/// Zoom step used by `zoom_in` / `zoom_out`
pub const ZOOM_STEP: f64 = 0.25;

/// Contiguous band of rows or columns left unshaded by the highlight overlays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub axis: Axis,
    pub pos: usize,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Task {
    ClearOverlays,
    EndScrollHighlight { row_index: usize },
}

/// Viewport and pointer state that never feeds back into the pipeline
#[derive(Debug, Clone, Default)]
pub(crate) struct ViewState {
    /// Translation of the root group
    pub pan: Point,
    /// Size of the host viewport; defaults to the drawing surface
    pub container: Option<Size>,
    pub mounted: bool,
    pub space_held: bool,
    pub mouse_down: bool,
    pub drag_from: Option<Point>,
    pub hovered_cell: Option<CellId>,
    /// Cell last hovered through the background grid
    pub grid_hover: Option<CellId>,
    pub highlight: Option<Highlight>,
    pub overlay_clear: Option<TaskId>,
    pub dendrogram_hover: Option<(Axis, NodeId)>,
    pub row_group_hover: Option<String>,
    pub print_caption: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Dendrograms {
    pub rows: Option<DendrogramLayout>,
    pub columns: Option<DendrogramLayout>,
}

pub struct Heatmap {
    pub(crate) data: HeatmapData,
    pub(crate) options: HeatmapOptions,
    pub(crate) measure: Box<dyn TextMeasure>,
    pub(crate) events: Box<dyn HeatmapEvents>,
    pub(crate) color_override: Option<Box<dyn ColorOverride>>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) scheduler: Scheduler<Task>,
    colormap: CategoricalColormap,

    pub(crate) parsed: Parsed,
    pub(crate) filtered: Filtered,
    pub(crate) metadata_colors: MetadataColors,
    pub(crate) ordering: Ordering,
    pub(crate) layout: Layout,
    pub(crate) metadata_sort: MetadataSort,
    pub(crate) dendrograms: Dendrograms,

    pub(crate) scene: Scene,
    pub(crate) view: ViewState,
    last_join: JoinStats,
}

impl std::fmt::Debug for Heatmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heatmap")
            .field("rows", &self.parsed.labels.rows.len())
            .field("columns", &self.parsed.labels.columns.len())
            .field("layout", &self.layout)
            .field("metadata_sort", &self.metadata_sort)
            .finish_non_exhaustive()
    }
}

impl Heatmap {
    /// Validate `data` and run the whole pipeline once.
    pub fn new(data: HeatmapData, options: HeatmapOptions) -> Result<Self> {
        options.validate()?;
        let metadata_sort = MetadataSort::new(
            options.initial_column_metadata_sort_field.clone(),
            options.initial_column_metadata_sort_asc,
        );
        let mut heatmap = Self {
            scene: Scene::new(options.svg_background_color.clone()),
            data,
            options,
            measure: Box::new(ApproxTextMeasure),
            events: Box::new(NoopEvents),
            color_override: None,
            clock: Box::new(SystemClock),
            scheduler: Scheduler::new(),
            colormap: CategoricalColormap::new(),
            parsed: Parsed::default(),
            filtered: Filtered::default(),
            metadata_colors: MetadataColors::default(),
            ordering: Ordering::default(),
            layout: Layout::default(),
            metadata_sort,
            dendrograms: Dendrograms::default(),
            view: ViewState::default(),
            last_join: JoinStats::default(),
        };
        heatmap.process_data(Stage::SetupContainers)?;
        Ok(heatmap)
    }

    pub fn with_events<E: HeatmapEvents + 'static>(mut self, events: E) -> Self {
        self.events = Box::new(events);
        self
    }

    /// Replace the time source. Pending tasks keep their due times.
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_color_override<C: ColorOverride + 'static>(mut self, color_override: C) -> Self {
        self.color_override = Some(Box::new(color_override));
        self.redraw(&[Layer::Cells]);
        self
    }

    /// Use another label measurement; label zones depend on it, so this re-parses.
    pub fn with_text_measure<M: TextMeasure + 'static>(mut self, measure: M) -> Result<Self> {
        self.measure = Box::new(measure);
        self.process_data(Stage::Parse)?;
        Ok(self)
    }

    /// Run the pipeline from `start` through `update`.
    pub fn process_data(&mut self, start: Stage) -> Result<()> {
        for stage in start.fallthrough() {
            let started = Instant::now();
            match stage {
                Stage::SetupContainers => self.setup_containers(),
                Stage::Parse => {
                    self.parsed = parse(&self.data, &self.options, self.measure.as_ref())?;
                }
                Stage::Filter => self.filtered = filter(&self.parsed),
                Stage::ProcessMetadata => {
                    self.metadata_colors =
                        process_metadata(&self.parsed.labels.columns, &self.options.column_metadata, &self.colormap);
                }
                Stage::Cluster => {
                    self.ordering = cluster_stage(
                        &self.parsed,
                        &self.filtered,
                        &self.data.values,
                        &self.options,
                        &self.metadata_sort,
                    );
                    self.ordering.apply(&mut self.parsed.labels);
                }
                Stage::PlaceContainers => self.place_containers(),
                Stage::Update => {
                    let stats = self.redraw(&Layer::ALL);
                    log::debug!(
                        "Scene join: {} entered, {} updated, {} exited, {} unchanged",
                        stats.entered,
                        stats.updated,
                        stats.exited,
                        stats.unchanged
                    );
                }
            }
            log::debug!("{} took {:?}", stage.name(), started.elapsed());
        }
        log::debug!(
            "Pipeline from {}: {} visible rows, {} columns, {} drawn cells",
            start.name(),
            self.parsed.labels.visible_row_count(),
            self.parsed.labels.columns.len(),
            self.filtered.cells.len()
        );
        Ok(())
    }

    fn setup_containers(&mut self) {
        self.scene.clear();
        self.scene.set_background(self.options.svg_background_color.clone());
        self.scheduler = Scheduler::new();
        self.view = ViewState {
            pan: Point::new(self.options.margin_left, self.options.margin_top),
            container: self.view.container,
            mounted: self.view.mounted,
            ..Default::default()
        };
    }

    fn place_containers(&mut self) {
        let labels = &self.parsed.labels;
        let input = LayoutInput {
            row_labels_width: self.parsed.row_labels_width,
            column_labels_height: self.parsed.column_labels_height,
            column_count: labels.columns.len(),
            visible_row_count: labels.visible_row_count(),
            metadata_track_count: self.options.column_metadata.len(),
            row_depth: self.ordering.row_depth(),
            column_depth: self.ordering.column_depth(),
        };
        self.layout = place_containers(&input, &self.options);

        let spacing = self.options.spacing;
        self.dendrograms = if self.options.clustering {
            Dendrograms {
                rows: self
                    .ordering
                    .row_tree
                    .as_ref()
                    .and_then(|tree| layout_dendrogram(tree, Axis::Rows, &self.layout, 0, spacing)),
                columns: self.ordering.column_tree.as_ref().and_then(|tree| {
                    layout_dendrogram(tree, Axis::Columns, &self.layout, self.ordering.column_tree_offset, spacing)
                }),
            }
        } else {
            Dendrograms::default()
        };
        // Branch ids do not survive re-clustering
        if self.view.dendrogram_hover.take().is_some() {
            for row in self.parsed.labels.rows.iter_mut() {
                row.highlighted = false;
                row.shaded = false;
            }
            for column in self.parsed.labels.columns.iter_mut() {
                column.highlighted = false;
                column.shaded = false;
            }
        }

        // The drawing may have shrunk under the current translation
        let (min, max) = self.pan_bounds();
        self.view.pan = Point::new(
            self.view.pan.x.max(min.x).min(max.x),
            self.view.pan.y.max(min.y).min(max.y),
        );
        self.apply_transforms();
    }

    /// Offset applied to the frozen label containers so they stay at the
    /// viewport edge while the grid scrolls.
    pub(crate) fn label_offset(&self) -> Point {
        Point::new(
            self.layout.margin_left - self.view.pan.x,
            self.layout.margin_top - self.view.pan.y,
        )
    }

    pub(crate) fn apply_transforms(&mut self) {
        let layout = &self.layout;
        let offset = self.label_offset();
        let shift = |origin: Point, dx: f64, dy: f64| Point::new(origin.x + dx, origin.y + dy);

        self.scene.set_root(self.view.pan);
        for layer in [Layer::Grid, Layer::Cells, Layer::Hover, Layer::Overlays] {
            self.scene.set_transform(layer, layout.cells_origin);
        }
        self.scene.set_transform(Layer::RowDendrogram, layout.row_dendrogram_origin);
        self.scene.set_transform(Layer::ColumnDendrogram, layout.column_dendrogram_origin);
        self.scene.set_transform(Layer::RowLabels, shift(layout.row_labels_origin, offset.x, 0.0));
        self.scene.set_transform(Layer::ColumnLabels, shift(layout.column_labels_origin, 0.0, offset.y));
        self.scene.set_transform(Layer::MetadataCells, shift(layout.metadata_origin, 0.0, offset.y));
        self.scene.set_transform(Layer::MetadataLabels, shift(layout.metadata_origin, offset.x, offset.y));
        self.scene.set_transform(Layer::Links, shift(layout.metadata_origin, offset.x, offset.y));
        self.scene.set_transform(Layer::Caption, layout.caption_origin);

        let caption_height = if self.view.print_caption {
            self.options.print_caption.len() as f64 * self.options.caption_line_height
        } else {
            0.0
        };
        self.scene.set_viewport(
            Size {
                width: layout.width,
                height: layout.height + caption_height,
            },
            layout.zoom,
        );
    }

    /// Regenerate `layers` and join them into the scene.
    pub(crate) fn redraw(&mut self, layers: &[Layer]) -> JoinStats {
        let now = self.clock.now_ms();
        let mut stats = JoinStats::default();
        for &layer in layers {
            let elements = draw::layer_elements(self, layer);
            let fade = if layer == Layer::Caption {
                0
            } else {
                self.options.transition_duration_ms
            };
            stats.merge(self.scene.join(layer, elements, now, fade));
        }
        self.last_join = stats;
        stats
    }

    pub(crate) fn color_scale(&self) -> ColorScale {
        ColorScale::new(
            self.options.scale,
            self.parsed.scale_limits,
            self.options.palette(),
            self.options.color_no_value.clone(),
        )
    }

    /// Whether rows are currently ordered by clustering
    pub(crate) fn rows_clustered(&self) -> bool {
        self.options.clustering && !self.options.should_sort_rows
    }

    // Incremental updates

    /// Replace the data and re-run from `parse`. Interaction state such as
    /// hidden rows comes from the new data.
    pub fn update_data(&mut self, data: HeatmapData) -> Result<()> {
        data.validate()?;
        self.data = data;
        self.view.hovered_cell = None;
        self.view.grid_hover = None;
        self.process_data(Stage::Parse)
    }

    pub fn update_scale(&mut self, scale: ScaleKind) -> Result<()> {
        self.options.scale = scale;
        self.process_data(Stage::Cluster)
    }

    pub fn update_sort_rows(&mut self, should_sort_rows: bool) -> Result<()> {
        self.options.should_sort_rows = should_sort_rows;
        self.process_data(Stage::Cluster)
    }

    pub fn update_sort_columns(&mut self, should_sort_columns: bool) -> Result<()> {
        self.options.should_sort_columns = should_sort_columns;
        self.process_data(Stage::Cluster)
    }

    pub fn update_column_metadata(&mut self, fields: Vec<ColumnMetadataField>) -> Result<()> {
        self.options.column_metadata = fields;
        self.process_data(Stage::ProcessMetadata)
    }

    /// Set the surface zoom. Only the viewport scale changes.
    pub fn update_zoom(&mut self, zoom: f64) {
        let zoom = self.options.clamp_zoom(zoom);
        self.options.zoom = Some(zoom);
        self.layout = self.layout.with_zoom(zoom);
        // Zooming out shrinks the scroll range under the current translation
        self.pan(0.0, 0.0);
    }

    pub fn zoom_in(&mut self) {
        self.update_zoom(self.layout.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.update_zoom(self.layout.zoom - ZOOM_STEP);
    }

    /// Caption lines shown in exports; the drawing is not touched until export.
    pub fn update_print_caption(&mut self, lines: Vec<String>) {
        self.options.print_caption = lines;
    }

    pub fn show_print_caption(&mut self) {
        self.view.print_caption = true;
        self.redraw(&[Layer::Caption]);
        self.apply_transforms();
    }

    pub fn hide_print_caption(&mut self) {
        self.view.print_caption = false;
        self.redraw(&[Layer::Caption]);
        self.apply_transforms();
    }

    // Queries

    /// Visible rows in display order with one value per column, missing values as 0
    pub fn current_view_csv(&self, headers: &[String]) -> Result<CsvView> {
        current_view_csv(&self.parsed.labels, &self.filtered.cells, headers)
    }

    /// Value → color map for a metadata track, with `Unknown` when some column lacks it
    pub fn column_metadata_legend(&self, field: &str) -> BTreeMap<String, String> {
        self.metadata_colors
            .legend(field, &self.parsed.labels.columns, &self.options.color_no_value)
    }

    pub fn data(&self) -> &HeatmapData {
        &self.data
    }

    pub fn options(&self) -> &HeatmapOptions {
        &self.options
    }

    pub fn labels(&self) -> &LabelSet {
        &self.parsed.labels
    }

    pub fn parsed(&self) -> &Parsed {
        &self.parsed
    }

    /// Cells that are drawn: visible rows with a value
    pub fn filtered_cells(&self) -> &[Cell] {
        &self.filtered.cells
    }

    pub fn ordering(&self) -> &Ordering {
        &self.ordering
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn metadata_sort(&self) -> &MetadataSort {
        &self.metadata_sort
    }

    pub fn metadata_colors(&self) -> &MetadataColors {
        &self.metadata_colors
    }

    pub fn row_dendrogram(&self) -> Option<&DendrogramLayout> {
        self.dendrograms.rows.as_ref()
    }

    pub fn column_dendrogram(&self) -> Option<&DendrogramLayout> {
        self.dendrograms.columns.as_ref()
    }

    /// Join statistics of the most recent redraw
    pub fn last_join(&self) -> JoinStats {
        self.last_join
    }

    pub fn pan_offset(&self) -> Point {
        self.view.pan
    }

    pub fn highlight(&self) -> Option<Highlight> {
        self.view.highlight
    }

    pub fn hovered_cell(&self) -> Option<CellId> {
        self.view.hovered_cell
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }
}
