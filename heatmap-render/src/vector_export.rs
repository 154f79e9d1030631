/*!
# Vector Export System

Serializes the retained scene to SVG, and rasterizes it to PNG.
Exports switch the print caption on for the duration of the capture and
restore the previous view afterwards.
*/

use anyhow::{anyhow, Context, Result};
use image::{Rgba, RgbaImage};
use resvg::tiny_skia;
use resvg::usvg::{self, fontdb};
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use heatmap_core::{Point, Rgb};

use crate::engine::Heatmap;
use crate::scene::{Element, Layer, Scene, Shape};

/// Export configuration
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub font_family: String,
    /// Extra comment written at the top of the SVG
    pub provenance_comment: Option<String>,
    /// Append a generation timestamp comment. Off for byte-stable output.
    pub show_footer: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            font_family: "Open Sans, Arial, sans-serif".to_string(),
            provenance_comment: None,
            show_footer: true,
        }
    }
}

struct SvgBuilder<'a> {
    config: &'a ExportConfig,
    width: f64,
    height: f64,
    view_width: f64,
    view_height: f64,
    top_comments: Vec<String>,
    elements: Vec<String>,
}

impl<'a> SvgBuilder<'a> {
    fn new(config: &'a ExportConfig, scene: &Scene) -> Self {
        let size = scene.size();
        Self {
            config,
            width: size.width * scene.zoom(),
            height: size.height * scene.zoom(),
            view_width: size.width,
            view_height: size.height,
            top_comments: Vec::new(),
            elements: Vec::new(),
        }
    }

    fn add_comment(&mut self, text: &str) {
        self.top_comments.push(text.replace("--", "- -"));
    }

    fn add_background(&mut self, color: &str) {
        self.elements.push(format!(
            r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
            num(self.view_width),
            num(self.view_height),
            escape(color)
        ));
    }

    fn open_group(&mut self, class: &str, origin: Point) {
        self.elements.push(format!(
            r#"<g class="{}" transform="translate({},{})">"#,
            class,
            num(origin.x),
            num(origin.y)
        ));
    }

    fn close_group(&mut self) {
        self.elements.push("</g>".to_string());
    }

    fn add_element(&mut self, element: &Element) {
        let mut attrs = String::new();
        if !element.classes.is_empty() {
            attrs.push_str(&format!(r#" class="{}""#, element.classes.join(" ")));
        }
        if element.opacity < 1.0 {
            attrs.push_str(&format!(r#" opacity="{}""#, num(element.opacity)));
        }

        let markup = match &element.shape {
            Shape::Rect {
                x,
                y,
                width,
                height,
                fill,
                stroke,
            } => {
                let stroke = stroke
                    .as_ref()
                    .map(|s| format!(r#" stroke="{}""#, escape(s)))
                    .unwrap_or_default();
                format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"{}{}/>"#,
                    num(*x),
                    num(*y),
                    num(*width),
                    num(*height),
                    escape(fill),
                    stroke,
                    attrs
                )
            }
            Shape::GridPattern {
                width,
                height,
                cell_width,
                cell_height,
                fill,
            } => {
                let id = format!("pattern-{}", escape(&element.key));
                format!(
                    r#"<defs><pattern id="{id}" width="{cw}" height="{ch}" patternUnits="userSpaceOnUse"><rect x="1" y="1" width="{iw}" height="{ih}" fill="{fill}"/></pattern></defs><rect x="0" y="0" width="{w}" height="{h}" fill="url(#{id})"{attrs}/>"#,
                    id = id,
                    cw = num(*cell_width),
                    ch = num(*cell_height),
                    iw = num((cell_width - 2.0).max(0.0)),
                    ih = num((cell_height - 2.0).max(0.0)),
                    fill = escape(fill),
                    w = num(*width),
                    h = num(*height),
                    attrs = attrs
                )
            }
            Shape::Line {
                x1,
                y1,
                x2,
                y2,
                stroke,
            } => format!(
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}"{}/>"#,
                num(*x1),
                num(*y1),
                num(*x2),
                num(*y2),
                escape(stroke),
                attrs
            ),
            Shape::Polyline { points, stroke } => {
                let points: Vec<String> = points.iter().map(|p| format!("{},{}", num(p.x), num(p.y))).collect();
                format!(
                    r#"<polyline points="{}" fill="none" stroke="{}"{}/>"#,
                    points.join(" "),
                    escape(stroke),
                    attrs
                )
            }
            Shape::Text {
                x,
                y,
                text,
                font_size,
                anchor,
                rotate,
                fill,
            } => {
                let transform = if *rotate != 0.0 {
                    format!(r#" transform="rotate({},{},{})""#, num(*rotate), num(*x), num(*y))
                } else {
                    String::new()
                };
                format!(
                    r#"<text x="{}" y="{}" font-family="{}" font-size="{}" fill="{}" text-anchor="{}" dominant-baseline="middle"{}{}>{}</text>"#,
                    num(*x),
                    num(*y),
                    escape(&self.config.font_family),
                    num(*font_size),
                    escape(fill),
                    anchor.as_svg(),
                    transform,
                    attrs,
                    escape(text)
                )
            }
            Shape::Icon { x, y, size, href } => format!(
                r#"<image href="{}" x="{}" y="{}" width="{}" height="{}"{}/>"#,
                escape(href),
                num(*x),
                num(*y),
                num(*size),
                num(*size),
                attrs
            ),
        };
        self.elements.push(format!("  {}", markup));
    }

    fn add_footer(&mut self) {
        let stamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        self.top_comments.push(format!("Generated {}", stamp));
    }

    fn finish(self) -> String {
        let mut out = String::new();
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        out.push('\n');
        out.push_str(&format!(
            r#"<svg width="{}" height="{}" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg">"#,
            num(self.width),
            num(self.height),
            num(self.view_width),
            num(self.view_height)
        ));
        out.push('\n');
        for c in &self.top_comments {
            for line in c.lines() {
                out.push_str(&format!("  <!-- {} -->\n", line));
            }
        }
        for element in &self.elements {
            out.push_str(&format!("  {}\n", element));
        }
        out.push_str("</svg>\n");
        out
    }
}

/// Shortest stable decimal form, at most two fractional digits
fn num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let text = format!("{:.2}", rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize the live elements of `scene` in paint order
pub fn scene_to_svg(scene: &Scene, config: &ExportConfig) -> String {
    let mut svg = SvgBuilder::new(config, scene);
    if let Some(comment) = &config.provenance_comment {
        svg.add_comment(comment);
    }
    if config.show_footer {
        svg.add_footer();
    }
    svg.add_background(scene.background());

    let root = scene.root();
    svg.open_group("root", root);
    for layer in Layer::ALL {
        let elements: Vec<&Element> = scene.live(layer).collect();
        if elements.is_empty() {
            continue;
        }
        svg.open_group(layer.name(), scene.transform(layer));
        for element in elements {
            svg.add_element(element);
        }
        svg.close_group();
    }
    svg.close_group();
    svg.finish()
}

/// Rasterize `scene` by rendering its SVG form, text included.
pub fn scene_to_png(scene: &Scene, config: &ExportConfig) -> Result<RgbaImage> {
    let svg = scene_to_svg(scene, config);

    let mut options = usvg::Options::default();
    options.fontdb = font_database();
    let tree = usvg::Tree::from_str(&svg, &options).context("Failed to parse exported SVG")?;

    let size = scene.size();
    let zoom = scene.zoom();
    let width = (size.width * zoom).ceil().max(1.0) as u32;
    let height = (size.height * zoom).ceil().max(1.0) as u32;
    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| anyhow!("Failed to allocate {}x{} pixmap", width, height))?;

    let background = Rgb::parse(scene.background()).unwrap_or(Rgb { r: 255, g: 255, b: 255 });
    pixmap.fill(tiny_skia::Color::from_rgba8(background.r, background.g, background.b, 255));

    let tree_size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / tree_size.width(),
        height as f32 / tree_size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let mut img = RgbaImage::new(width, height);
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(img)
}

/// System fonts, loaded once. Generic families the system cannot resolve
/// point at an installed sans face so labels still render.
fn font_database() -> Arc<fontdb::Database> {
    static FONTS: OnceLock<Arc<fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = fontdb::Database::new();
            db.load_system_fonts();
            let names: Vec<String> = db
                .faces()
                .filter_map(|face| face.families.first().map(|(name, _)| name.clone()))
                .collect();
            let fallback = names
                .iter()
                .find(|name| name.contains("Sans") && !name.contains("Mono"))
                .or_else(|| names.first())
                .cloned();
            if let Some(family) = fallback {
                for (generic, sans) in [(fontdb::Family::SansSerif, true), (fontdb::Family::Serif, false)] {
                    let query = fontdb::Query {
                        families: &[generic],
                        ..Default::default()
                    };
                    if db.query(&query).is_some() {
                        continue;
                    }
                    if sans {
                        db.set_sans_serif_family(family.clone());
                    } else {
                        db.set_serif_family(family.clone());
                    }
                }
            }
            log::debug!("Loaded {} font faces for PNG export", db.len());
            Arc::new(db)
        })
        .clone()
}

impl Heatmap {
    /// SVG document of the current view with the print caption appended
    pub fn render_svg(&mut self, config: &ExportConfig) -> String {
        self.with_print_view(|scene| scene_to_svg(scene, config))
    }

    /// Raster of the current view with the print caption appended
    pub fn render_png(&mut self, config: &ExportConfig) -> Result<RgbaImage> {
        self.with_print_view(|scene| scene_to_png(scene, config))
    }

    fn with_print_view<T>(&mut self, capture: impl FnOnce(&Scene) -> T) -> T {
        let was_shown = self.view.print_caption;
        if !was_shown {
            self.show_print_caption();
        }
        let output = capture(&self.scene);
        if !was_shown {
            self.hide_print_caption();
        }
        output
    }

    /// Write the SVG export to `path`
    pub fn download_svg<P: AsRef<Path>>(&mut self, path: P, config: &ExportConfig) -> Result<()> {
        let path = path.as_ref();
        let svg = self.render_svg(config);
        fs::write(path, svg).with_context(|| format!("Failed to write SVG to {}", path.display()))?;
        log::info!("Exported SVG to {}", path.display());
        Ok(())
    }

    /// Write the PNG export to `path`
    pub fn download_png<P: AsRef<Path>>(&mut self, path: P, config: &ExportConfig) -> Result<()> {
        let path = path.as_ref();
        let img = self.render_png(config)?;
        img.save(path)
            .with_context(|| format!("Failed to write PNG to {}", path.display()))?;
        log::info!("Exported {}x{} PNG to {}", img.width(), img.height(), path.display());
        Ok(())
    }
}
