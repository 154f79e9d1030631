//! Render command implementation - export the heatmap to SVG or PNG

use anyhow::Result;
use heatmap_core::ScaleKind;
use heatmap_render::Heatmap;
use std::path::{Path, PathBuf};

use crate::commands::load_input;
use crate::config::Config;
use crate::RenderFormat;

/// Flags of the `render` subcommand; `None` keeps the configured value
#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: Option<RenderFormat>,
    pub scale: Option<ScaleKind>,
    pub zoom: Option<f64>,
    pub no_cluster: bool,
    pub sort_rows: bool,
    pub sort_columns: bool,
    pub remove_rows: Vec<String>,
}

pub fn execute(config: &Config, args: RenderArgs) -> Result<()> {
    log::info!("Starting heatmap rendering");
    log::info!("Input file: {}", args.input.display());
    log::info!("Output file: {}", args.output.display());

    let render_format = args.format.unwrap_or_else(|| detect_render_format(&args.output));
    log::info!("Output format: {:?}", render_format);

    let data = load_input(&args.input)?;

    let mut options = config.heatmap_options();
    if let Some(scale) = args.scale {
        options.scale = scale;
    }
    if args.zoom.is_some() {
        options.zoom = args.zoom;
    }
    if args.no_cluster {
        options.clustering = false;
    }
    options.should_sort_rows |= args.sort_rows;
    options.should_sort_columns |= args.sort_columns;

    let mut heatmap = Heatmap::new(data, options)?;
    for label in &args.remove_rows {
        log::debug!("Removing row {}", label);
        heatmap.remove_row(label)?;
    }

    let export = config.export.export_config();
    match render_format {
        RenderFormat::Svg => heatmap.download_svg(&args.output, &export)?,
        RenderFormat::Png => heatmap.download_png(&args.output, &export)?,
    }

    log::info!("Rendering completed successfully");
    Ok(())
}

fn detect_render_format(path: &Path) -> RenderFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => RenderFormat::Png,
        _ => RenderFormat::Svg,
    }
}
