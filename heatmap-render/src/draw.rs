//! Element generation for each scene layer.
//!
//! Everything here is positioned from `pos` values and the current layout;
//! raw row/column indices only ever appear in element keys.

use heatmap_core::{Axis, Point};

use crate::engine::Heatmap;
use crate::scene::{Element, Layer, Shape, TextAnchor};

pub const COLOR_HOVER_LINK: &str = "#3867fa";
pub const TEXT_COLOR: &str = "#333333";
pub const LINK_COLOR: &str = "#999999";
pub const SEPARATOR_COLOR: &str = "#cccccc";
pub const OVERLAY_OPACITY: f64 = 0.8;
/// Pin icon width; the icon is centered on its column
const PIN_ICON_SIZE: f64 = 14.0;

pub(crate) fn layer_elements(heatmap: &Heatmap, layer: Layer) -> Vec<Element> {
    match layer {
        Layer::Grid => grid(heatmap),
        Layer::Cells => cells(heatmap),
        Layer::Hover => hover(heatmap),
        Layer::Overlays => overlays(heatmap),
        Layer::RowDendrogram => dendrogram(heatmap, Axis::Rows),
        Layer::ColumnDendrogram => dendrogram(heatmap, Axis::Columns),
        Layer::RowLabels => row_labels(heatmap),
        Layer::ColumnLabels => column_labels(heatmap),
        Layer::MetadataCells => metadata_cells(heatmap),
        Layer::MetadataLabels => metadata_labels(heatmap),
        Layer::Links => links(heatmap),
        Layer::Caption => caption(heatmap),
    }
}

fn rect(x: f64, y: f64, width: f64, height: f64, fill: &str) -> Shape {
    Shape::Rect {
        x,
        y,
        width,
        height,
        fill: fill.to_string(),
        stroke: None,
    }
}

fn text(heatmap: &Heatmap, x: f64, y: f64, value: &str, anchor: TextAnchor) -> Shape {
    Shape::Text {
        x,
        y,
        text: value.to_string(),
        font_size: heatmap.options.font_size_px(),
        anchor,
        rotate: 0.0,
        fill: TEXT_COLOR.to_string(),
    }
}

fn icon(heatmap: &Heatmap, x: f64, y: f64, size: f64, name: &str) -> Shape {
    Shape::Icon {
        x,
        y,
        size,
        href: format!("{}/{}", heatmap.options.icon_path, name),
    }
}

/// Placeholder squares for every grid position, including cells without data
fn grid(heatmap: &Heatmap) -> Vec<Element> {
    let layout = &heatmap.layout;
    if layout.total_cell_width <= 0.0 || layout.total_cell_height <= 0.0 {
        return Vec::new();
    }
    vec![Element::new(
        "grid",
        Shape::GridPattern {
            width: layout.total_cell_width,
            height: layout.total_cell_height,
            cell_width: layout.cell.width,
            cell_height: layout.cell.height,
            fill: heatmap.options.color_no_value.clone(),
        },
    )
    .with_class("grid")]
}

fn cells(heatmap: &Heatmap) -> Vec<Element> {
    let labels = &heatmap.parsed.labels;
    let layout = &heatmap.layout;
    let colors = heatmap.color_scale();
    let custom = heatmap.color_override.as_deref();

    heatmap
        .filtered
        .cells
        .iter()
        .filter_map(|cell| {
            let row = labels.rows[cell.row_index].pos?;
            let column = labels.columns[cell.column_index].pos;
            let fill = colors.color_for(cell, custom);
            Some(
                Element::new(
                    cell.id().to_string(),
                    rect(
                        layout.cell_x(column) + 1.0,
                        layout.cell_y(row) + 1.0,
                        layout.cell.width - 2.0,
                        layout.cell.height - 2.0,
                        &fill,
                    ),
                )
                .with_class("cell"),
            )
        })
        .collect()
}

fn hover(heatmap: &Heatmap) -> Vec<Element> {
    let Some(id) = heatmap.view.hovered_cell else {
        return Vec::new();
    };
    let labels = &heatmap.parsed.labels;
    let (Some(row), Some(column)) = (labels.rows.get(id.row_index), labels.columns.get(id.column_index)) else {
        return Vec::new();
    };
    let Some(row_pos) = row.pos else {
        return Vec::new();
    };
    let layout = &heatmap.layout;
    vec![Element::new(
        "hover",
        Shape::Rect {
            x: layout.cell_x(column.pos),
            y: layout.cell_y(row_pos),
            width: layout.cell.width,
            height: layout.cell.height,
            fill: "none".to_string(),
            stroke: Some(COLOR_HOVER_LINK.to_string()),
        },
    )
    .with_class("cellHover")]
}

/// White veils on both sides of the highlighted band
fn overlays(heatmap: &Heatmap) -> Vec<Element> {
    let Some(highlight) = heatmap.view.highlight else {
        return Vec::new();
    };
    let layout = &heatmap.layout;
    let fill = "white";
    let end = highlight.pos + highlight.count;
    let rects = match highlight.axis {
        Axis::Columns => {
            let total = heatmap.parsed.labels.columns.len();
            [
                (0.0, 0.0, layout.cell.width * highlight.pos as f64, layout.height),
                (
                    layout.cell.width * end as f64,
                    0.0,
                    layout.cell.width * total.saturating_sub(end) as f64,
                    layout.height,
                ),
            ]
        }
        Axis::Rows => {
            let total = heatmap.parsed.labels.visible_row_count();
            [
                (0.0, 0.0, layout.width, layout.cell.height * highlight.pos as f64),
                (
                    0.0,
                    layout.cell.height * end as f64,
                    layout.width,
                    layout.cell.height * total.saturating_sub(end) as f64,
                ),
            ]
        }
    };
    rects
        .iter()
        .zip(["overlay:before", "overlay:after"])
        .filter(|((_, _, w, h), _)| *w > 0.0 && *h > 0.0)
        .map(|((x, y, w, h), key)| {
            Element::new(key, rect(*x, *y, *w, *h, fill))
                .with_class("overlay")
                .with_opacity(OVERLAY_OPACITY)
        })
        .collect()
}

fn dendrogram(heatmap: &Heatmap, axis: Axis) -> Vec<Element> {
    let (layout, tree) = match axis {
        Axis::Rows => (heatmap.dendrograms.rows.as_ref(), heatmap.ordering.row_tree.as_ref()),
        Axis::Columns => (heatmap.dendrograms.columns.as_ref(), heatmap.ordering.column_tree.as_ref()),
    };
    let (Some(layout), Some(tree)) = (layout, tree) else {
        return Vec::new();
    };
    let highlighted: Vec<usize> = match heatmap.view.dendrogram_hover {
        Some((hovered_axis, source)) if hovered_axis == axis => layout.subtree_links(tree, source),
        _ => Vec::new(),
    };

    let mut elements = Vec::with_capacity(layout.links.len() * 2);
    for (i, link) in layout.links.iter().enumerate() {
        let key = format!("{}-{}", link.source, link.target);
        elements.push(
            Element::new(
                format!("link:{}", key),
                Shape::Polyline {
                    points: link.points.clone(),
                    stroke: LINK_COLOR.to_string(),
                },
            )
            .with_class("link")
            .with_class_if("highlighted", highlighted.contains(&i)),
        );
        let (x, y, w, h) = link.hit_box;
        elements.push(Element::new(format!("hit:{}", key), rect(x, y, w, h, "none")).with_class("hoverTarget"));
    }
    elements
}

fn row_labels(heatmap: &Heatmap) -> Vec<Element> {
    let layout = &heatmap.layout;
    let options = &heatmap.options;
    let spacing = options.spacing;
    let ch = layout.cell.height;
    let clustered = heatmap.rows_clustered();
    let labels = &heatmap.parsed.labels;
    let group_key = match &heatmap.view.row_group_hover {
        Some(label) if !clustered => labels
            .row_index(label)
            .and_then(|idx| labels.rows[idx].sort_key.clone()),
        _ => None,
    };

    let rows = labels.rows_by_pos();
    let mut elements = vec![Element::new(
        "background",
        rect(
            -layout.margin_left,
            0.0,
            layout.margin_left + layout.row_labels_width,
            layout.total_cell_height,
            &options.svg_background_color,
        ),
    )];

    for (i, row) in rows.iter().enumerate() {
        let Some(pos) = row.pos else { continue };
        let top = layout.cell_y(pos);
        let in_group = group_key.is_some() && row.sort_key == group_key;

        elements.push(
            Element::new(
                format!("{}/text", row.label),
                text(heatmap, layout.row_labels_width - spacing, top + ch / 2.0, &row.label, TextAnchor::End),
            )
            .with_class("rowLabel")
            .with_class_if("highlighted", row.highlighted)
            .with_class_if("shaded", row.shaded)
            .with_class_if("rowLabelHover", in_group),
        );
        elements.push(
            Element::new(
                format!("{}/remove", row.label),
                icon(heatmap, spacing, top + (ch - spacing) / 2.0, spacing, "IconCloseSmall.svg"),
            )
            .with_class("removeIcon"),
        );

        // Group separator unless the next row continues the group
        let continues = rows.get(i + 1).map(|next| next.sort_key == row.sort_key);
        if !clustered && continues == Some(false) {
            elements.push(
                Element::new(
                    format!("{}/separator", row.label),
                    Shape::Line {
                        x1: 0.0,
                        y1: top + ch,
                        x2: layout.row_labels_width,
                        y2: top + ch,
                        stroke: SEPARATOR_COLOR.to_string(),
                    },
                )
                .with_class("genusBorder"),
            );
        }
    }
    elements
}

fn column_labels(heatmap: &Heatmap) -> Vec<Element> {
    let layout = &heatmap.layout;
    let options = &heatmap.options;
    let spacing = options.spacing;
    let cw = layout.cell.width;

    let mut elements = vec![Element::new(
        "background",
        rect(
            -layout.row_labels_width - layout.margin_left,
            -(layout.column_labels_height + layout.margin_top),
            layout.width,
            layout.column_labels_height + layout.margin_top,
            &options.svg_background_color,
        ),
    )];

    for column in heatmap.parsed.labels.columns_by_pos() {
        let left = layout.cell_x(column.pos);
        elements.push(
            Element::new(
                format!("{}/text", column.label),
                Shape::Text {
                    x: left + cw / 2.0,
                    y: -2.0 * spacing,
                    text: column.label.clone(),
                    font_size: options.font_size_px(),
                    anchor: TextAnchor::Start,
                    rotate: options.text_rotation,
                    fill: TEXT_COLOR.to_string(),
                },
            )
            .with_class("columnLabel")
            .with_class_if("highlighted", column.highlighted)
            .with_class_if("shaded", column.shaded),
        );
        if column.pinned {
            elements.push(
                Element::new(
                    format!("{}/pin", column.label),
                    icon(heatmap, left + cw / 2.0 - PIN_ICON_SIZE / 2.0, -spacing, PIN_ICON_SIZE, "IconPin.svg"),
                )
                .with_class("pinIcon"),
            );
        }
    }
    elements
}

/// Top edge of metadata track `track` inside the metadata container
pub(crate) fn metadata_track_y(heatmap: &Heatmap, track: usize) -> f64 {
    heatmap.options.metadata_add_link_height + heatmap.options.min_cell_height * track as f64
}

fn metadata_cells(heatmap: &Heatmap) -> Vec<Element> {
    let layout = &heatmap.layout;
    let options = &heatmap.options;
    let columns = heatmap.parsed.labels.columns_by_pos();

    let mut elements = Vec::with_capacity(options.column_metadata.len() * columns.len());
    for (track, field) in options.column_metadata.iter().enumerate() {
        let y = metadata_track_y(heatmap, track);
        for column in &columns {
            let fill = column
                .metadatum(&field.value)
                .and_then(|value| heatmap.metadata_colors.color(&field.value, value))
                .unwrap_or(options.color_no_value.as_str());
            elements.push(
                Element::new(
                    format!("{}/{}", field.value, column.label),
                    rect(
                        layout.row_labels_width + layout.cell_x(column.pos) + 1.0,
                        y,
                        layout.cell.width - 2.0,
                        options.min_cell_height - 2.0,
                        fill,
                    ),
                )
                .with_class("columnMetadataCell"),
            );
        }
    }
    elements
}

/// Leftward shift of a metadata label that makes room for its sort icon
pub(crate) fn metadata_label_offset(heatmap: &Heatmap, field: &str) -> f64 {
    if heatmap.metadata_sort.field.as_deref() == Some(field) {
        heatmap.options.metadata_sort_icon_size + heatmap.options.spacing
    } else {
        0.0
    }
}

fn metadata_labels(heatmap: &Heatmap) -> Vec<Element> {
    let layout = &heatmap.layout;
    let options = &heatmap.options;
    let spacing = options.spacing;
    let tracks = options.column_metadata.len();

    // Hides column labels scrolling under the top-left corner
    let mut elements = vec![Element::new(
        "background",
        rect(
            -layout.margin_left,
            -(layout.column_labels_height + layout.margin_top),
            layout.margin_left + layout.row_labels_width,
            layout.column_labels_height
                + layout.margin_top
                + options.metadata_add_link_height
                + tracks as f64 * options.min_cell_height,
            &options.svg_background_color,
        ),
    )];

    for (track, field) in options.column_metadata.iter().enumerate() {
        let offset = metadata_label_offset(heatmap, &field.value);
        let top = metadata_track_y(heatmap, track) + 1.0;
        elements.push(
            Element::new(
                format!("{}/target", field.value),
                rect(
                    -offset - layout.margin_left,
                    top - 1.0,
                    layout.row_labels_width + layout.margin_left + offset,
                    options.min_cell_height + 1.0,
                    &options.svg_background_color,
                ),
            )
            .with_class("hoverTarget"),
        );
        elements.push(
            Element::new(
                format!("{}/text", field.value),
                text(
                    heatmap,
                    layout.row_labels_width - spacing - offset,
                    top + options.min_cell_height / 2.0,
                    &field.label,
                    TextAnchor::End,
                ),
            )
            .with_class("columnMetadataLabel"),
        );
        if offset > 0.0 {
            let name = if heatmap.metadata_sort.ascending {
                "sort_asc.svg"
            } else {
                "sort_desc.svg"
            };
            let size = options.metadata_sort_icon_size;
            elements.push(
                Element::new(
                    format!("{}/sort", field.value),
                    icon(
                        heatmap,
                        layout.row_labels_width - offset,
                        top + (options.min_cell_height - size) / 2.0,
                        size,
                        name,
                    ),
                )
                .with_class("metadataSortIcon"),
            );
        }
    }
    elements
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkKind {
    AddColumnMetadata,
    AddRow,
    PinColumns,
}

impl LinkKind {
    fn title(self) -> &'static str {
        match self {
            LinkKind::AddColumnMetadata => "Add Metadata",
            LinkKind::AddRow => "Add Taxon",
            LinkKind::PinColumns => "Pin Samples",
        }
    }

    fn key(self) -> &'static str {
        match self {
            LinkKind::AddColumnMetadata => "addMetadata",
            LinkKind::AddRow => "addRow",
            LinkKind::PinColumns => "pinColumns",
        }
    }
}

/// Top edge of an affordance link inside the links container
pub(crate) fn link_y(heatmap: &Heatmap, kind: LinkKind) -> f64 {
    let options = &heatmap.options;
    match kind {
        LinkKind::AddColumnMetadata => 0.0,
        LinkKind::AddRow => (1 + options.column_metadata.len()) as f64 * options.min_cell_height,
        LinkKind::PinColumns => -2.0 * options.metadata_add_link_height,
    }
}

/// Trigger point of a link, in links-container coordinates
pub(crate) fn link_anchor(heatmap: &Heatmap, kind: LinkKind) -> Point {
    Point::new(
        heatmap.layout.row_labels_width - 10.0,
        link_y(heatmap, kind) + heatmap.options.metadata_add_link_height / 2.0,
    )
}

pub(crate) fn enabled_links(heatmap: &Heatmap) -> Vec<LinkKind> {
    let options = &heatmap.options;
    let mut kinds = Vec::new();
    if options.add_column_metadata {
        kinds.push(LinkKind::AddColumnMetadata);
    }
    if options.add_row {
        kinds.push(LinkKind::AddRow);
    }
    if options.pin_columns {
        kinds.push(LinkKind::PinColumns);
    }
    kinds
}

fn links(heatmap: &Heatmap) -> Vec<Element> {
    let rlw = heatmap.layout.row_labels_width;
    let size = heatmap.options.metadata_add_link_height;
    let mut elements = Vec::new();
    for kind in enabled_links(heatmap) {
        let y = link_y(heatmap, kind);
        elements.push(
            Element::new(
                format!("{}/text", kind.key()),
                text(heatmap, rlw - 25.0, y + 11.0, kind.title(), TextAnchor::End),
            )
            .with_class("metadataAddLabel"),
        );
        elements.push(
            Element::new(format!("{}/icon", kind.key()), icon(heatmap, rlw - 20.0, y, size, "plus.svg"))
                .with_class("metadataAddIcon"),
        );
    }
    elements
}

fn caption(heatmap: &Heatmap) -> Vec<Element> {
    if !heatmap.view.print_caption {
        return Vec::new();
    }
    let line_height = heatmap.options.caption_line_height;
    heatmap
        .options
        .print_caption
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            Element::new(
                format!("caption:{}", idx),
                text(heatmap, 0.0, (idx as f64 + 0.5) * line_height, line, TextAnchor::Start),
            )
            .with_class("caption")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use heatmap_core::{ColumnLabelInput, HeatmapData, HeatmapOptions, RowLabelInput, SortKey};

    fn grouped() -> HeatmapData {
        HeatmapData::new(
            vec![vec![Some(1.0)], vec![Some(2.0)], vec![Some(3.0)]],
            vec![
                RowLabelInput::new("E. coli").with_sort_key(SortKey::Number(561)),
                RowLabelInput::new("E. albertii").with_sort_key(SortKey::Number(561)),
                RowLabelInput::new("K. pneumoniae").with_sort_key(SortKey::Number(570)),
            ],
            vec![ColumnLabelInput::new(1, "S1")],
        )
    }

    fn unclustered() -> HeatmapOptions {
        HeatmapOptions {
            clustering: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_separator_only_between_groups() {
        let heatmap = Heatmap::new(grouped(), unclustered()).unwrap();
        let separators: Vec<String> = heatmap
            .scene()
            .live(Layer::RowLabels)
            .filter(|e| e.has_class("genusBorder"))
            .map(|e| e.key.clone())
            .collect();
        assert_eq!(separators.len(), 1);
        let pos_of = |label: &str| {
            let idx = heatmap.labels().row_index(label).unwrap();
            heatmap.labels().rows[idx].pos.unwrap()
        };
        // The separator sits under the last row of the 561 group
        let key = &separators[0];
        let label = key.trim_end_matches("/separator");
        assert_eq!(pos_of(label), 1);
    }

    #[test]
    fn test_clustered_rows_have_no_separators() {
        let heatmap = Heatmap::new(grouped(), HeatmapOptions::default()).unwrap();
        assert!(!heatmap
            .scene()
            .live(Layer::RowLabels)
            .any(|e| e.has_class("genusBorder")));
    }

    #[test]
    fn test_cells_are_inset_by_one_pixel() {
        let heatmap = Heatmap::new(grouped(), unclustered()).unwrap();
        let layout = heatmap.layout().clone();
        for element in heatmap.scene().live(Layer::Cells) {
            match &element.shape {
                Shape::Rect { width, height, x, .. } => {
                    assert_eq!(*width, layout.cell.width - 2.0);
                    assert_eq!(*height, layout.cell.height - 2.0);
                    assert_eq!(*x, 1.0);
                }
                other => panic!("unexpected shape {:?}", other),
            }
        }
    }

    #[test]
    fn test_links_follow_affordance_flags() {
        let options = HeatmapOptions {
            add_row: true,
            pin_columns: true,
            ..unclustered()
        };
        let heatmap = Heatmap::new(grouped(), options).unwrap();
        let titles: Vec<String> = heatmap
            .scene()
            .live(Layer::Links)
            .filter_map(|e| match &e.shape {
                Shape::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(titles, vec!["Add Taxon".to_string(), "Pin Samples".to_string()]);
    }

    #[test]
    fn test_every_column_keeps_its_elements() {
        let data = HeatmapData::new(
            vec![vec![Some(1.0), Some(2.0), Some(3.0)]],
            vec![RowLabelInput::new("E. coli")],
            vec![
                ColumnLabelInput::new(10, "S1").with_metadata("host", "human"),
                ColumnLabelInput::new(11, "S2").with_metadata("host", "bat"),
                ColumnLabelInput::new(12, "S3").pinned(),
            ],
        );
        let options = HeatmapOptions {
            column_metadata: vec![heatmap_core::ColumnMetadataField::new("host", "Host")],
            pin_columns: true,
            ..unclustered()
        };
        let heatmap = Heatmap::new(data, options).unwrap();
        let scene = heatmap.scene();
        for label in ["S1", "S2", "S3"] {
            assert!(scene.get(Layer::ColumnLabels, &format!("{}/text", label)).is_some());
            assert!(scene.get(Layer::MetadataCells, &format!("host/{}", label)).is_some());
        }
        assert!(scene.get(Layer::ColumnLabels, "S3/pin").is_some());
    }
}
