//! Container placement: cell sizes, zone extents, total size and zoom.

use serde::Serialize;

use crate::options::HeatmapOptions;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Inputs the layout depends on besides the options
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutInput {
    pub row_labels_width: f64,
    pub column_labels_height: f64,
    pub column_count: usize,
    pub visible_row_count: usize,
    pub metadata_track_count: usize,
    pub row_depth: usize,
    pub column_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Layout {
    pub cell: Size,
    pub row_labels_width: f64,
    pub column_labels_height: f64,
    pub row_cluster_width: f64,
    pub column_cluster_height: f64,
    pub total_cell_width: f64,
    pub total_cell_height: f64,
    pub total_row_cluster_width: f64,
    pub total_column_cluster_height: f64,
    pub total_metadata_height: f64,
    pub total_row_add_link_height: f64,
    /// Unzoomed drawing size including margins
    pub width: f64,
    pub height: f64,
    pub zoom: f64,
    pub margin_left: f64,
    pub margin_top: f64,
    /// Container origins, relative to the margin-translated root group
    pub cells_origin: Point,
    pub row_labels_origin: Point,
    pub column_labels_origin: Point,
    pub metadata_origin: Point,
    pub row_dendrogram_origin: Point,
    pub column_dendrogram_origin: Point,
    pub caption_origin: Point,
}

impl Layout {
    /// Size of the drawing surface after zoom
    pub fn surface(&self) -> Size {
        Size {
            width: self.width * self.zoom,
            height: self.height * self.zoom,
        }
    }

    /// Top edge of the cell grid
    pub fn grid_top(&self) -> f64 {
        self.cells_origin.y
    }

    pub fn cell_x(&self, pos: usize) -> f64 {
        pos as f64 * self.cell.width
    }

    pub fn cell_y(&self, pos: usize) -> f64 {
        pos as f64 * self.cell.height
    }

    /// Most negative translation that still shows the far edge of the drawing
    /// inside a viewport of `container` pixels.
    pub fn scroll_max(&self, container: Size) -> Point {
        let surface = self.surface();
        Point {
            x: (container.width - surface.width) / self.zoom,
            y: (container.height - surface.height) / self.zoom,
        }
    }

    pub fn with_zoom(&self, zoom: f64) -> Self {
        Self { zoom, ..self.clone() }
    }
}

/// Size and position every container for the current label, row and column counts.
pub fn place_containers(input: &LayoutInput, options: &HeatmapOptions) -> Layout {
    let spacing = options.spacing;
    let row_cluster_width =
        (input.row_depth as f64 * options.default_cluster_step + spacing).min(options.max_row_cluster_width);
    let column_cluster_height = (input.column_depth as f64 * options.default_cluster_step + spacing)
        .min(options.max_column_cluster_height);

    let fill = |available: f64, count: usize, minimum: f64| {
        if count == 0 {
            minimum
        } else {
            (available / count as f64).max(minimum)
        }
    };
    let cell = Size {
        width: fill(
            options.min_width - input.row_labels_width - row_cluster_width,
            input.column_count,
            options.min_cell_width,
        ),
        height: fill(
            options.min_height - input.column_labels_height - column_cluster_height,
            input.visible_row_count,
            options.min_cell_height,
        ),
    };

    let total_cell_width = cell.width * input.column_count as f64;
    let total_cell_height = cell.height * input.visible_row_count as f64;
    let total_row_cluster_width = if options.clustering { row_cluster_width } else { 0.0 };
    let total_column_cluster_height = if options.clustering {
        column_cluster_height + 2.0 * spacing
    } else {
        0.0
    };
    let total_metadata_height =
        input.metadata_track_count as f64 * options.min_cell_height + options.metadata_add_link_height;
    let total_row_add_link_height = if options.add_row {
        2.0 * options.metadata_add_link_height
    } else {
        options.metadata_add_link_height
    };

    let width = options.margin_left
        + input.row_labels_width
        + total_cell_width
        + total_row_cluster_width
        + options.margin_right;
    let height = options.margin_top
        + input.column_labels_height
        + total_metadata_height
        + total_row_add_link_height
        + total_cell_height
        + total_column_cluster_height
        + options.margin_bottom
        + spacing;

    let zoom = match options.zoom {
        Some(zoom) => zoom,
        None if width > 0.0 => width.min(options.max_width - 8.0) / width,
        None => 1.0,
    };

    let grid_top = input.column_labels_height + total_metadata_height + total_row_add_link_height;
    Layout {
        cell,
        row_labels_width: input.row_labels_width,
        column_labels_height: input.column_labels_height,
        row_cluster_width,
        column_cluster_height,
        total_cell_width,
        total_cell_height,
        total_row_cluster_width,
        total_column_cluster_height,
        total_metadata_height,
        total_row_add_link_height,
        width,
        height,
        zoom,
        margin_left: options.margin_left,
        margin_top: options.margin_top,
        cells_origin: Point::new(input.row_labels_width, grid_top),
        row_labels_origin: Point::new(0.0, grid_top),
        column_labels_origin: Point::new(input.row_labels_width, input.column_labels_height),
        metadata_origin: Point::new(0.0, input.column_labels_height),
        row_dendrogram_origin: Point::new(input.row_labels_width + total_cell_width, grid_top),
        column_dendrogram_origin: Point::new(input.row_labels_width, grid_top + total_cell_height),
        // Below the drawing, in the band the print caption appends
        caption_origin: Point::new(
            input.row_labels_width,
            grid_top + total_cell_height + total_column_cluster_height + options.margin_bottom + spacing,
        ),
    }
}
