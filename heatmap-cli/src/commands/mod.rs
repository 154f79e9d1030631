//! Command implementations for the heatmap CLI

pub mod csv;
pub mod render;

use heatmap_core::HeatmapData;
use std::path::Path;

use crate::error::{CliError, CliResult};

/// Read and validate a JSON input document.
pub fn load_input(path: &Path) -> CliResult<HeatmapData> {
    if !path.exists() {
        return Err(CliError::file_not_found(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let data: HeatmapData = serde_json::from_str(&content)
        .map_err(|e| CliError::invalid_input(path.display().to_string(), e.to_string()))?;

    data.validate()
        .map_err(|e| CliError::invalid_input(path.display().to_string(), e.to_string()))?;

    log::info!(
        "Loaded {} rows x {} columns from {}",
        data.row_labels.len(),
        data.column_labels.len(),
        path.display()
    );

    Ok(data)
}
