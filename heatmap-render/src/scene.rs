/*!
# Retained Scene

Visual elements keyed by identity and grouped into layers. Every draw pass
joins a fresh element list against what the scene already holds:

- keys not seen before **enter**
- keys whose shape or styling changed are **updated** in place
- keys that disappeared **exit**: they fade to zero opacity and are swept
  once the transition duration has elapsed

Layers carry a translation (their container origin) so panning only touches
transforms, never elements.
*/

use heatmap_core::{Point, Size};
use serde::Serialize;
use std::collections::BTreeMap;

/// Drawing layers, in paint order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Layer {
    Grid,
    Cells,
    Hover,
    Overlays,
    RowDendrogram,
    ColumnDendrogram,
    RowLabels,
    ColumnLabels,
    MetadataCells,
    MetadataLabels,
    Links,
    Caption,
}

impl Layer {
    pub const ALL: [Layer; 12] = [
        Layer::Grid,
        Layer::Cells,
        Layer::Hover,
        Layer::Overlays,
        Layer::RowDendrogram,
        Layer::ColumnDendrogram,
        Layer::RowLabels,
        Layer::ColumnLabels,
        Layer::MetadataCells,
        Layer::MetadataLabels,
        Layer::Links,
        Layer::Caption,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Layer::Grid => "grid",
            Layer::Cells => "cells",
            Layer::Hover => "hover",
            Layer::Overlays => "overlays",
            Layer::RowDendrogram => "rowDendrogram",
            Layer::ColumnDendrogram => "columnDendrogram",
            Layer::RowLabels => "rowLabels",
            Layer::ColumnLabels => "columnLabels",
            Layer::MetadataCells => "columnMetadataCells",
            Layer::MetadataLabels => "columnMetadataLabels",
            Layer::Links => "links",
            Layer::Caption => "caption",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_svg(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Shape {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: String,
        stroke: Option<String>,
    },
    /// Background of inset cell squares covering the whole grid
    GridPattern {
        width: f64,
        height: f64,
        cell_width: f64,
        cell_height: f64,
        fill: String,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: String,
    },
    Polyline {
        points: Vec<Point>,
        stroke: String,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        font_size: f64,
        anchor: TextAnchor,
        /// Rotation in degrees around (x, y)
        rotate: f64,
        fill: String,
    },
    Icon {
        x: f64,
        y: f64,
        size: f64,
        href: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub key: String,
    pub shape: Shape,
    pub classes: Vec<&'static str>,
    pub opacity: f64,
    /// Set while fading out; the element is swept at this time
    exit_at: Option<u64>,
}

impl Element {
    pub fn new<K: Into<String>>(key: K, shape: Shape) -> Self {
        Self {
            key: key.into(),
            shape,
            classes: Vec::new(),
            opacity: 1.0,
            exit_at: None,
        }
    }

    pub fn with_class(mut self, class: &'static str) -> Self {
        self.classes.push(class);
        self
    }

    pub fn with_class_if(self, class: &'static str, enabled: bool) -> Self {
        if enabled {
            self.with_class(class)
        } else {
            self
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| *c == class)
    }

    pub fn is_exiting(&self) -> bool {
        self.exit_at.is_some()
    }

    fn same_visual(&self, other: &Element) -> bool {
        self.shape == other.shape && self.classes == other.classes && self.opacity == other.opacity
    }
}

/// Outcome of joining one draw pass against the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct JoinStats {
    pub entered: usize,
    pub updated: usize,
    pub exited: usize,
    pub unchanged: usize,
}

impl JoinStats {
    pub fn merge(&mut self, other: JoinStats) {
        self.entered += other.entered;
        self.updated += other.updated;
        self.exited += other.exited;
        self.unchanged += other.unchanged;
    }

    /// Elements that were touched by the pass
    pub fn changed(&self) -> usize {
        self.entered + self.updated + self.exited
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    layers: BTreeMap<Layer, BTreeMap<String, Element>>,
    transforms: BTreeMap<Layer, Point>,
    root: Point,
    size: Size,
    zoom: f64,
    background: String,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("white")
    }
}

impl Scene {
    pub fn new<S: Into<String>>(background: S) -> Self {
        Self {
            layers: BTreeMap::new(),
            transforms: BTreeMap::new(),
            root: Point::default(),
            size: Size::default(),
            zoom: 1.0,
            background: background.into(),
        }
    }

    pub fn clear(&mut self) {
        self.layers.clear();
        self.transforms.clear();
    }

    /// Join `elements` into `layer`. Keys must be unique within the pass.
    pub fn join(&mut self, layer: Layer, elements: Vec<Element>, now: u64, fade_ms: u64) -> JoinStats {
        let current = self.layers.entry(layer).or_default();
        let mut stats = JoinStats::default();
        let mut seen = std::collections::HashSet::with_capacity(elements.len());

        for element in elements {
            seen.insert(element.key.clone());
            match current.get_mut(&element.key) {
                Some(existing) if !existing.is_exiting() && existing.same_visual(&element) => {
                    stats.unchanged += 1;
                }
                Some(existing) => {
                    *existing = element;
                    stats.updated += 1;
                }
                None => {
                    current.insert(element.key.clone(), element);
                    stats.entered += 1;
                }
            }
        }

        let mut gone = Vec::new();
        for (key, element) in current.iter_mut() {
            if seen.contains(key) || element.is_exiting() {
                continue;
            }
            stats.exited += 1;
            if fade_ms == 0 {
                gone.push(key.clone());
            } else {
                element.exit_at = Some(now + fade_ms);
                element.opacity = 0.0;
            }
        }
        for key in gone {
            current.remove(&key);
        }
        stats
    }

    /// Drop faded-out elements whose transition has finished
    pub fn sweep(&mut self, now: u64) -> usize {
        let mut removed = 0;
        for elements in self.layers.values_mut() {
            let before = elements.len();
            elements.retain(|_, e| e.exit_at.map_or(true, |at| at > now));
            removed += before - elements.len();
        }
        removed
    }

    pub fn set_transform(&mut self, layer: Layer, origin: Point) {
        self.transforms.insert(layer, origin);
    }

    pub fn transform(&self, layer: Layer) -> Point {
        self.transforms.get(&layer).copied().unwrap_or_default()
    }

    pub fn set_root(&mut self, root: Point) {
        self.root = root;
    }

    pub fn root(&self) -> Point {
        self.root
    }

    /// Unzoomed drawing size and the zoom applied to the surface
    pub fn set_viewport(&mut self, size: Size, zoom: f64) {
        self.size = size;
        self.zoom = zoom;
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn background(&self) -> &str {
        &self.background
    }

    pub fn set_background<S: Into<String>>(&mut self, background: S) {
        self.background = background.into();
    }

    /// Every element of `layer`, including ones still fading out
    pub fn elements(&self, layer: Layer) -> impl Iterator<Item = &Element> {
        self.layers.get(&layer).into_iter().flat_map(|elements| elements.values())
    }

    /// Elements of `layer` that are not on their way out
    pub fn live(&self, layer: Layer) -> impl Iterator<Item = &Element> {
        self.elements(layer).filter(|e| !e.is_exiting())
    }

    pub fn get(&self, layer: Layer, key: &str) -> Option<&Element> {
        self.layers.get(&layer)?.get(key).filter(|e| !e.is_exiting())
    }

    pub fn live_count(&self, layer: Layer) -> usize {
        self.live(layer).count()
    }

    /// Absolute position of a point in `layer`, before zoom
    pub fn to_drawing(&self, layer: Layer, point: Point) -> Point {
        let origin = self.transform(layer);
        Point::new(self.root.x + origin.x + point.x, self.root.y + origin.y + point.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(key: &str, x: f64) -> Element {
        Element::new(
            key,
            Shape::Rect {
                x,
                y: 0.0,
                width: 10.0,
                height: 10.0,
                fill: "#fff".into(),
                stroke: None,
            },
        )
    }

    #[test]
    fn test_join_counts_enter_update_exit() {
        let mut scene = Scene::default();
        let first = scene.join(Layer::Cells, vec![rect("a", 0.0), rect("b", 10.0)], 0, 200);
        assert_eq!(first, JoinStats { entered: 2, ..Default::default() });

        let second = scene.join(Layer::Cells, vec![rect("a", 0.0), rect("c", 20.0), rect("b", 30.0)], 0, 200);
        assert_eq!(second, JoinStats { entered: 1, updated: 1, exited: 0, unchanged: 1 });

        let third = scene.join(Layer::Cells, vec![rect("a", 0.0)], 10, 200);
        assert_eq!(third.exited, 2);
        assert_eq!(scene.live_count(Layer::Cells), 1);
        assert_eq!(scene.elements(Layer::Cells).count(), 3);
    }

    #[test]
    fn test_exiting_elements_fade_then_sweep() {
        let mut scene = Scene::default();
        scene.join(Layer::Cells, vec![rect("a", 0.0)], 0, 200);
        scene.join(Layer::Cells, vec![], 100, 200);
        let fading = scene.elements(Layer::Cells).next().unwrap();
        assert_eq!(fading.opacity, 0.0);
        assert_eq!(scene.sweep(250), 0);
        assert_eq!(scene.sweep(300), 1);
        assert_eq!(scene.elements(Layer::Cells).count(), 0);
    }

    #[test]
    fn test_reentering_key_cancels_exit() {
        let mut scene = Scene::default();
        scene.join(Layer::RowLabels, vec![rect("r", 0.0)], 0, 200);
        scene.join(Layer::RowLabels, vec![], 0, 200);
        let stats = scene.join(Layer::RowLabels, vec![rect("r", 0.0)], 50, 200);
        assert_eq!(stats.updated, 1);
        assert_eq!(scene.sweep(1_000), 0);
        assert!(scene.get(Layer::RowLabels, "r").is_some());
    }

    #[test]
    fn test_zero_fade_removes_immediately() {
        let mut scene = Scene::default();
        scene.join(Layer::Caption, vec![rect("line", 0.0)], 0, 0);
        scene.join(Layer::Caption, vec![], 0, 0);
        assert_eq!(scene.elements(Layer::Caption).count(), 0);
    }

    #[test]
    fn test_drawing_coordinates_include_root_and_layer() {
        let mut scene = Scene::default();
        scene.set_root(Point::new(20.0, 30.0));
        scene.set_transform(Layer::Cells, Point::new(100.0, 50.0));
        assert_eq!(scene.to_drawing(Layer::Cells, Point::new(1.0, 2.0)), Point::new(121.0, 82.0));
    }
}
