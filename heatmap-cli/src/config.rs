//! Configuration handling for the heatmap CLI
//!
//! Loads `heatmap.toml` with a `[heatmap]` table of display options and an
//! `[export]` table; CLI flags override file values.

use anyhow::{Context, Result};
use heatmap_core::HeatmapOptions;
use heatmap_render::{threshold_caption, ExportConfig, ThresholdFilter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "heatmap.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub heatmap: HeatmapOptions,
    pub export: ExportSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Font family written into SVG text elements
    pub font_family: String,

    /// Comment placed at the top of exported SVGs
    pub provenance_comment: Option<String>,

    /// Timestamp comment in SVG output
    pub footer: bool,

    /// Threshold filters summarized in the print caption
    pub filters: Vec<ThresholdFilter>,

    /// Leading CSV headers; `Genus` adds a genus column
    pub csv_headers: Vec<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        let export = ExportConfig::default();
        Self {
            font_family: export.font_family,
            provenance_comment: export.provenance_comment,
            footer: export.show_footer,
            filters: Vec::new(),
            csv_headers: vec!["Taxon".to_string()],
        }
    }
}

impl ExportSettings {
    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            font_family: self.font_family.clone(),
            provenance_comment: self.provenance_comment.clone(),
            show_footer: self.footer,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(&default_path)?
                } else {
                    log::info!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default()).context("Failed to serialize default configuration")
    }

    /// Display options with the caption filled in from the configured filters
    /// when no explicit caption was given.
    pub fn heatmap_options(&self) -> HeatmapOptions {
        let mut options = self.heatmap.clone();
        if options.print_caption.is_empty() {
            options.print_caption = threshold_caption(&self.export.filters);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.heatmap.min_cell_width, 26.0);
        assert_eq!(config.heatmap.color_no_value, "#eaeaea");
        assert!(config.export.footer);
    }

    #[test]
    fn test_config_roundtrip() -> Result<()> {
        let mut config = Config::default();
        config.heatmap.clustering = false;
        config.export.filters.push(ThresholdFilter {
            metric: "NT rPM".into(),
            operator: ">=".into(),
            value: "10".into(),
        });
        let temp_file = NamedTempFile::new()?;

        config.save_to_file(temp_file.path())?;
        let loaded = Config::load_from_file(temp_file.path())?;

        assert!(!loaded.heatmap.clustering);
        assert_eq!(loaded.export.filters, config.export.filters);
        assert_eq!(loaded.heatmap.max_zoom, config.heatmap.max_zoom);

        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let config: Config = toml::from_str("[heatmap]\nscale = \"symlog\"\nmin_cell_width = 30.0\n")?;
        assert_eq!(config.heatmap.scale, heatmap_core::ScaleKind::Symlog);
        assert_eq!(config.heatmap.min_cell_width, 30.0);
        assert_eq!(config.heatmap.min_cell_height, 26.0);
        assert_eq!(config.export.csv_headers, vec!["Taxon".to_string()]);
        Ok(())
    }

    #[test]
    fn test_caption_from_filters() {
        let mut config = Config::default();
        assert!(config.heatmap_options().print_caption.is_empty());
        config.export.filters.push(ThresholdFilter {
            metric: "NR r".into(),
            operator: ">=".into(),
            value: "5".into(),
        });
        let caption = config.heatmap_options().print_caption;
        assert_eq!(caption.len(), 1);
        assert!(caption[0].starts_with("1 filter was applied"));
    }

    #[test]
    fn test_example_toml_generation() -> Result<()> {
        let example = Config::example_toml()?;
        assert!(example.contains("[heatmap]"));
        assert!(example.contains("[export]"));
        Ok(())
    }
}
