//! Display options for the heatmap engine
//!
//! Every field has a default so a partial `[heatmap]` table in a config file
//! (or an empty JSON object) yields a usable configuration.

use serde::{Deserialize, Serialize};

use crate::error::{HeatmapError, Result};
use crate::scale::ScaleKind;
use crate::types::SortDirection;

/// A metadata track shown above the columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadataField {
    /// Key into `ColumnLabel::metadata`
    pub value: String,
    /// Display name
    pub label: String,
}

impl ColumnMetadataField {
    pub fn new<V: Into<String>, L: Into<String>>(value: V, label: L) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapOptions {
    pub number_of_levels: usize,
    pub scale: ScaleKind,
    /// Label font size in points
    pub font_size: f64,
    /// Column label rotation in degrees
    pub text_rotation: f64,
    pub margin_top: f64,
    pub margin_left: f64,
    pub margin_bottom: f64,
    pub margin_right: f64,
    pub metadata_sort_icon_size: f64,
    pub min_cell_width: f64,
    pub min_cell_height: f64,
    pub min_width: f64,
    /// Width used for shrink-to-fit
    pub max_width: f64,
    pub min_height: f64,
    /// Explicit zoom multiplier; `None` means shrink-to-fit
    pub zoom: Option<f64>,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub clustering: bool,
    pub should_sort_columns: bool,
    pub should_sort_rows: bool,
    pub row_sort_direction: SortDirection,
    pub column_sort_direction: SortDirection,
    pub default_cluster_step: f64,
    pub max_row_cluster_width: f64,
    pub max_column_cluster_height: f64,
    pub spacing: f64,
    pub metadata_add_link_height: f64,
    pub transition_duration_ms: u64,
    /// Substituted for missing values when computing limits and distances
    pub null_value: f64,
    pub column_metadata: Vec<ColumnMetadataField>,
    pub initial_column_metadata_sort_field: Option<String>,
    pub initial_column_metadata_sort_asc: bool,
    pub icon_path: String,
    pub svg_background_color: String,
    /// Forced color-scale limits; they never affect clustering
    pub scale_min: Option<f64>,
    pub scale_max: Option<f64>,
    pub colors: Option<Vec<String>>,
    pub color_no_value: String,
    pub print_caption: Vec<String>,
    pub caption_line_height: f64,
    /// Show the "Pin Samples" link and keep pinned columns first
    pub pin_columns: bool,
    /// Show the "Add Taxon" link
    pub add_row: bool,
    /// Show the "Add Metadata" link
    pub add_column_metadata: bool,
    pub overlay_debounce_ms: u64,
    pub scroll_highlight_ms: u64,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            number_of_levels: 10,
            scale: ScaleKind::Linear,
            font_size: 9.0,
            text_rotation: -65.0,
            margin_top: 30.0,
            margin_left: 20.0,
            margin_bottom: 20.0,
            margin_right: 20.0,
            metadata_sort_icon_size: 16.0,
            min_cell_width: 26.0,
            min_cell_height: 26.0,
            min_width: 1240.0,
            max_width: 1600.0,
            min_height: 500.0,
            zoom: None,
            min_zoom: 0.2,
            max_zoom: 3.0,
            clustering: true,
            should_sort_columns: false,
            should_sort_rows: false,
            row_sort_direction: SortDirection::Asc,
            column_sort_direction: SortDirection::Asc,
            default_cluster_step: 6.0,
            max_row_cluster_width: 100.0,
            max_column_cluster_height: 100.0,
            spacing: 10.0,
            metadata_add_link_height: 14.0,
            transition_duration_ms: 200,
            null_value: 0.0,
            column_metadata: Vec::new(),
            initial_column_metadata_sort_field: None,
            initial_column_metadata_sort_asc: true,
            icon_path: "/assets/icons".to_string(),
            svg_background_color: "white".to_string(),
            scale_min: None,
            scale_max: None,
            colors: None,
            color_no_value: "#eaeaea".to_string(),
            print_caption: Vec::new(),
            caption_line_height: 18.0,
            pin_columns: false,
            add_row: false,
            add_column_metadata: false,
            overlay_debounce_ms: 100,
            scroll_highlight_ms: 2750,
        }
    }
}

impl HeatmapOptions {
    /// Font size in CSS pixels (1pt = 4/3 px)
    pub fn font_size_px(&self) -> f64 {
        self.font_size * 4.0 / 3.0
    }

    /// The color palette, generated from the sequential ramp when not supplied
    pub fn palette(&self) -> Vec<String> {
        match &self.colors {
            Some(colors) if !colors.is_empty() => colors.clone(),
            _ => crate::colormap::sequential_palette(self.number_of_levels.max(1)),
        }
    }

    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.max(self.min_zoom).min(self.max_zoom)
    }

    /// Reject ranges that cannot be honored.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
            return Err(HeatmapError::invalid_option(
                "min_zoom",
                format!("{} must be positive and at most max_zoom {}", self.min_zoom, self.max_zoom),
            ));
        }
        if let (Some(min), Some(max)) = (self.scale_min, self.scale_max) {
            if min > max {
                return Err(HeatmapError::invalid_option(
                    "scale_min",
                    format!("{} exceeds scale_max {}", min, max),
                ));
            }
        }
        Ok(())
    }
}
