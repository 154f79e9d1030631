use heatmap_core::{
    Axis, CellId, ColumnLabelInput, ColumnMetadataField, HeatmapData, HeatmapOptions, Point, RowLabelInput, Size,
};
use heatmap_render::{AnchorKind, Heatmap, Layer, ManualClock, RecordedEvent, RecordingEvents, Shape};
use proptest::prelude::*;

fn data() -> HeatmapData {
    HeatmapData::new(
        vec![
            vec![Some(1.0), Some(2.0), Some(0.0)],
            vec![Some(1.1), Some(2.1), None],
            vec![Some(9.0), Some(0.5), Some(7.0)],
        ],
        vec![
            RowLabelInput::new("Staphylococcus aureus"),
            RowLabelInput::new("Staphylococcus epidermidis"),
            RowLabelInput::new("Pseudomonas aeruginosa"),
        ],
        vec![
            ColumnLabelInput::new(1, "S1").with_metadata("host", "human"),
            ColumnLabelInput::new(2, "S2").with_metadata("host", "bat"),
            ColumnLabelInput::new(3, "S3"),
        ],
    )
}

fn build(options: HeatmapOptions) -> (Heatmap, RecordingEvents, ManualClock) {
    let events = RecordingEvents::new();
    let clock = ManualClock::new(1_000);
    let heatmap = Heatmap::new(data(), options)
        .unwrap()
        .with_events(events.clone())
        .with_clock(clock.clone());
    (heatmap, events, clock)
}

fn column_order(heatmap: &Heatmap) -> Vec<String> {
    heatmap
        .labels()
        .columns_by_pos()
        .iter()
        .map(|c| c.label.clone())
        .collect()
}

#[test]
fn remove_row_then_restore_through_update_data() {
    let (mut heatmap, events, clock) = build(HeatmapOptions::default());
    let before = heatmap.scene().live_count(Layer::Cells);

    heatmap.remove_row("Pseudomonas aeruginosa").unwrap();
    assert_eq!(heatmap.labels().visible_row_count(), 2);
    assert_eq!(heatmap.scene().live_count(Layer::Cells), before - 3);
    assert!(heatmap.current_view_csv(&[]).unwrap().rows.len() == 2);
    assert_eq!(
        events.events(),
        vec![RecordedEvent::RemoveRow("Pseudomonas aeruginosa".into())]
    );

    // Exiting cells fade out and are swept once the transition is over
    assert!(heatmap.scene().elements(Layer::Cells).count() > before - 3);
    clock.advance(heatmap.options().transition_duration_ms);
    heatmap.tick();
    assert_eq!(heatmap.scene().elements(Layer::Cells).count(), before - 3);

    let mut restored = heatmap.data().clone();
    assert!(restored.row_labels[2].hidden);
    restored.row_labels[2].hidden = false;
    heatmap.update_data(restored).unwrap();
    assert_eq!(heatmap.labels().visible_row_count(), 3);
    assert_eq!(heatmap.scene().live_count(Layer::Cells), before);
}

#[test]
fn removing_a_row_clears_highlight_overlays() {
    let (mut heatmap, _, _) = build(HeatmapOptions::default());
    let root = heatmap.ordering().row_tree.as_ref().unwrap().root();
    heatmap.hover_dendrogram(Axis::Rows, root).unwrap();
    assert!(heatmap.highlight().is_some());
    heatmap.remove_row("Staphylococcus aureus").unwrap();
    assert!(heatmap.highlight().is_none());
    assert_eq!(heatmap.scene().live_count(Layer::Overlays), 0);
}

#[test]
fn metadata_sort_cycles_through_three_states() {
    let options = HeatmapOptions {
        clustering: false,
        column_metadata: vec![ColumnMetadataField::new("host", "Host")],
        ..Default::default()
    };
    let (mut heatmap, events, _) = build(options);

    heatmap.click_metadata_label("host").unwrap();
    assert_eq!(column_order(&heatmap), vec!["S2", "S1", "S3"]);
    heatmap.click_metadata_label("host").unwrap();
    // Missing values stay last when descending
    assert_eq!(column_order(&heatmap), vec!["S1", "S2", "S3"]);
    heatmap.click_metadata_label("host").unwrap();
    assert_eq!(column_order(&heatmap), vec!["S1", "S2", "S3"]);
    assert_eq!(heatmap.metadata_sort().field, None);

    assert_eq!(
        events.events(),
        vec![
            RecordedEvent::ColumnMetadataSortChange(Some("host".into()), true),
            RecordedEvent::ColumnMetadataSortChange(Some("host".into()), false),
            RecordedEvent::ColumnMetadataSortChange(None, true),
        ]
    );
}

#[test]
fn active_sort_field_shows_icon() {
    let options = HeatmapOptions {
        column_metadata: vec![ColumnMetadataField::new("host", "Host")],
        ..Default::default()
    };
    let (mut heatmap, _, _) = build(options);
    assert!(heatmap.scene().get(Layer::MetadataLabels, "host/sort").is_none());
    heatmap.click_metadata_label("host").unwrap();
    match &heatmap.scene().get(Layer::MetadataLabels, "host/sort").unwrap().shape {
        Shape::Icon { href, .. } => assert!(href.ends_with("sort_asc.svg")),
        other => panic!("unexpected shape {:?}", other),
    }
}

#[test]
fn pinned_columns_come_first_and_unpin_reports() {
    let options = HeatmapOptions {
        pin_columns: true,
        ..Default::default()
    };
    let (mut heatmap, events, _) = build(options);
    heatmap.pin_column(3).unwrap();
    assert_eq!(column_order(&heatmap)[0], "S3");
    assert!(heatmap.scene().get(Layer::ColumnLabels, "S3/pin").is_some());

    heatmap.unpin_column(3).unwrap();
    assert!(heatmap.scene().get(Layer::ColumnLabels, "S3/pin").is_none());
    assert_eq!(events.events(), vec![RecordedEvent::UnpinColumn(3)]);
}

#[test]
fn single_column_has_no_column_dendrogram() {
    let data = HeatmapData::new(
        vec![vec![Some(1.0)], vec![Some(5.0)]],
        vec![RowLabelInput::new("A"), RowLabelInput::new("B")],
        vec![ColumnLabelInput::new(1, "only")],
    );
    let heatmap = Heatmap::new(data, HeatmapOptions::default()).unwrap();
    assert!(heatmap.column_dendrogram().is_none());
    assert!(heatmap.row_dendrogram().is_some());
    assert_eq!(heatmap.scene().live_count(Layer::ColumnDendrogram), 0);
}

#[test]
fn zero_is_colored_and_null_is_not_drawn() {
    let (heatmap, _, _) = build(HeatmapOptions::default());
    let no_value = heatmap.options().color_no_value.clone();

    let zero = CellId {
        row_index: 0,
        column_index: 2,
    };
    match &heatmap.scene().get(Layer::Cells, &zero.to_string()).unwrap().shape {
        Shape::Rect { fill, .. } => assert_ne!(fill, &no_value),
        other => panic!("unexpected shape {:?}", other),
    }
    let null = CellId {
        row_index: 1,
        column_index: 2,
    };
    assert!(heatmap.scene().get(Layer::Cells, &null.to_string()).is_none());
    match &heatmap.scene().get(Layer::Grid, "grid").unwrap().shape {
        Shape::GridPattern { fill, .. } => assert_eq!(fill, &no_value),
        other => panic!("unexpected shape {:?}", other),
    }
}

#[test]
fn scroll_to_row_pulses_label() {
    let (mut heatmap, _, clock) = build(HeatmapOptions::default());
    assert!(heatmap.scroll_to_row("Pseudomonas aeruginosa").unwrap());
    let idx = heatmap.labels().row_index("Pseudomonas aeruginosa").unwrap();
    assert!(heatmap.labels().rows[idx].highlighted);

    clock.advance(heatmap.options().scroll_highlight_ms - 1);
    assert_eq!(heatmap.tick(), 0);
    assert!(heatmap.labels().rows[idx].highlighted);
    clock.advance(1);
    assert_eq!(heatmap.tick(), 1);
    assert!(!heatmap.labels().rows[idx].highlighted);

    assert!(heatmap.scroll_to_row("nobody").is_err());
}

#[test]
fn link_anchors_are_reported_in_drawing_coordinates() {
    let options = HeatmapOptions {
        add_row: true,
        add_column_metadata: true,
        ..Default::default()
    };
    let (mut heatmap, events, _) = build(options);
    let anchor = heatmap.click_add_row().unwrap();
    assert_eq!(anchor.kind, AnchorKind::AddRow);
    assert!(heatmap.click_pin_columns().is_none());
    let metadata = heatmap.click_add_column_metadata().unwrap();
    assert!(metadata.y < anchor.y);
    assert_eq!(events.events().len(), 2);
    assert_eq!(events.events()[0], RecordedEvent::AddRowClick(anchor));
}

#[test]
fn row_group_hover_reports_bounds() {
    use heatmap_core::SortKey;
    let mut d = data();
    d.row_labels[0].sort_key = Some(SortKey::Number(1279));
    d.row_labels[1].sort_key = Some(SortKey::Number(1279));
    d.row_labels[2].sort_key = Some(SortKey::Number(286));
    let events = RecordingEvents::new();
    let options = HeatmapOptions {
        clustering: false,
        ..Default::default()
    };
    let mut heatmap = Heatmap::new(d, options).unwrap().with_events(events.clone());

    heatmap.hover_row_label("Staphylococcus aureus").unwrap();
    let hovered: Vec<bool> = heatmap
        .scene()
        .live(Layer::RowLabels)
        .filter(|e| e.key.ends_with("/text"))
        .map(|e| e.has_class("rowLabelHover"))
        .collect();
    assert_eq!(hovered.iter().filter(|h| **h).count(), 2);

    match &events.events()[0] {
        RecordedEvent::RowGroupEnter(group) => {
            assert_eq!(group.row_count, 2);
            let ch = heatmap.layout().cell.height;
            assert!((group.bottom_right.y - group.top_left.y - 2.0 * ch).abs() < 1e-9);
        }
        other => panic!("unexpected event {:?}", other),
    }
    heatmap.leave_row_label();
    assert_eq!(events.events().last(), Some(&RecordedEvent::RowGroupLeave));
}

#[test]
fn dendrogram_hover_highlights_leaves_under_branch() {
    let (mut heatmap, _, clock) = build(HeatmapOptions::default());
    let tree = heatmap.ordering().row_tree.clone().unwrap();
    let root = tree.root();
    heatmap.hover_dendrogram(Axis::Rows, root).unwrap();
    let highlight = heatmap.highlight().unwrap();
    assert_eq!((highlight.pos, highlight.count), (0, 3));
    assert!(heatmap
        .scene()
        .live(Layer::RowDendrogram)
        .filter(|e| e.key.starts_with("link:"))
        .all(|e| e.has_class("highlighted")));

    heatmap.leave_dendrogram();
    assert!(heatmap.labels().rows.iter().all(|r| !r.highlighted && !r.shaded));
    clock.advance(heatmap.options().overlay_debounce_ms);
    heatmap.tick();
    assert!(heatmap.highlight().is_none());
}

#[test]
fn space_drag_pans_within_bounds() {
    let (mut heatmap, _, _) = build(HeatmapOptions::default());
    heatmap.set_container_size(Size {
        width: 300.0,
        height: 200.0,
    });
    heatmap.mount();
    let start = heatmap.pan_offset();

    // Without the pan key a drag does nothing
    heatmap.mouse_down(Point::new(100.0, 100.0));
    assert!(!heatmap.mouse_move(Point::new(50.0, 60.0)));
    heatmap.mouse_up();

    assert!(heatmap.key_down("Space"));
    heatmap.mouse_down(Point::new(100.0, 100.0));
    assert!(heatmap.mouse_move(Point::new(50.0, 60.0)));
    heatmap.mouse_up();
    heatmap.key_up("Space");
    let moved = heatmap.pan_offset();
    assert!(moved.x < start.x);
    assert!(moved.y < start.y);

    // Labels counter-translate to stay at the viewport edge
    let labels = heatmap.scene().to_drawing(Layer::RowLabels, Point::new(0.0, 0.0));
    let layout = heatmap.layout();
    assert!((labels.x - (layout.margin_left + layout.row_labels_origin.x)).abs() < 1e-9);
}

fn grid_data(rows: usize, columns: usize) -> HeatmapData {
    let values = (0..rows)
        .map(|r| (0..columns).map(|c| Some(((r * 7 + c * 3) % 11) as f64)).collect())
        .collect();
    let row_labels = (0..rows).map(|r| RowLabelInput::new(format!("Taxon {}", r))).collect();
    let column_labels = (0..columns)
        .map(|c| ColumnLabelInput::new(c as u64 + 1, format!("Sample {}", c)))
        .collect();
    HeatmapData::new(values, row_labels, column_labels)
}

fn assert_within_bounds(heatmap: &Heatmap) {
    let (min, max) = heatmap.pan_bounds();
    let pan = heatmap.pan_offset();
    assert!(pan.x >= min.x - 1e-9 && pan.x <= max.x + 1e-9, "x {} outside {}..{}", pan.x, min.x, max.x);
    assert!(pan.y >= min.y - 1e-9 && pan.y <= max.y + 1e-9, "y {} outside {}..{}", pan.y, min.y, max.y);
}

#[test]
fn zoom_out_pulls_pan_back_into_bounds() {
    let options = HeatmapOptions { zoom: Some(2.0), ..HeatmapOptions::default() };
    let mut heatmap = Heatmap::new(grid_data(40, 40), options).unwrap();
    heatmap.set_container_size(Size { width: 800.0, height: 600.0 });

    // Scroll to the far corner at the larger zoom
    heatmap.pan(-1e6, -1e6);
    let far = heatmap.pan_offset();
    assert_within_bounds(&heatmap);

    heatmap.update_zoom(1.0);
    let (min, _) = heatmap.pan_bounds();
    assert!(min.x > far.x && min.y > far.y);
    assert_within_bounds(&heatmap);
    assert_eq!(heatmap.pan_offset(), min);

    // The drawn root follows the clamped translation
    assert_eq!(heatmap.scene().root(), min);
}

proptest! {
    #[test]
    fn pan_never_leaves_bounds(
        steps in prop::collection::vec(
            prop_oneof![
                (-500.0f64..500.0, -500.0f64..500.0).prop_map(|(dx, dy)| (dx, dy, None)),
                (0.1f64..3.5).prop_map(|zoom| (0.0, 0.0, Some(zoom))),
            ],
            1..20,
        )
    ) {
        let mut heatmap = Heatmap::new(grid_data(25, 25), HeatmapOptions::default()).unwrap();
        heatmap.set_container_size(Size { width: 250.0, height: 180.0 });
        for (dx, dy, zoom) in steps {
            match zoom {
                Some(zoom) => heatmap.update_zoom(zoom),
                None => {
                    heatmap.pan(dx, dy);
                }
            }
            let (min, max) = heatmap.pan_bounds();
            let pan = heatmap.pan_offset();
            prop_assert!(pan.x >= min.x - 1e-9 && pan.x <= max.x + 1e-9);
            prop_assert!(pan.y >= min.y - 1e-9 && pan.y <= max.y + 1e-9);
        }
    }
}
