//! CSV command implementation - export the visible rows in display order

use anyhow::{Context, Result};
use heatmap_render::Heatmap;
use std::io::Write;
use std::path::PathBuf;

use crate::commands::load_input;
use crate::config::Config;

pub fn execute(config: &Config, input: PathBuf, output: Option<PathBuf>, headers: Vec<String>) -> Result<()> {
    let data = load_input(&input)?;
    let heatmap = Heatmap::new(data, config.heatmap_options())?;

    let headers = if headers.is_empty() {
        config.export.csv_headers.clone()
    } else {
        headers
    };
    let view = heatmap.current_view_csv(&headers)?;
    let document = view.to_document();

    match output {
        Some(path) => {
            std::fs::write(&path, &document)
                .with_context(|| format!("Failed to write CSV to {}", path.display()))?;
            log::info!("Exported {} rows to {}", view.rows.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(document.as_bytes())
                .context("Failed to write CSV to stdout")?;
        }
    }

    Ok(())
}
