//! Heatmap Core Library
//!
//! Data model, scales, hierarchical clustering, pipeline stages and layout
//! for clustered heatmaps. Nothing here draws; see `heatmap-render`.

pub mod error;
pub mod types;
pub mod options;
pub mod scale;
pub mod colormap;
pub mod text;
pub mod cluster;
pub mod pipeline;
pub mod layout;
pub mod csv_export;

// Re-export commonly used types and functions
pub use error::{HeatmapError, Result};
pub use types::{
    Axis, Cell, CellId, ColumnId, ColumnLabel, ColumnLabelInput, HeatmapData, Limits, Matrix, MetricMatrix,
    RowLabel, RowLabelInput, SortDirection, SortKey,
};
pub use options::{ColumnMetadataField, HeatmapOptions};
pub use scale::{apply_scale, ColorOverride, ColorScale, Scale, ScaleKind};
pub use colormap::{sequential_palette, CategoricalColormap, Rgb};
pub use text::{ApproxTextMeasure, TextMeasure};
pub use cluster::{hcluster, ClusterNode, ClusterTree, NodeId, Observation};
pub use pipeline::{
    cluster as cluster_stage, filter, parse, process_metadata, Filtered, LabelSet, MetadataColors, MetadataSort,
    Ordering, Parsed, Stage,
};
pub use layout::{place_containers, Layout, LayoutInput, Point, Size};
pub use csv_export::{current_view_csv, sanitize_field, CsvView};

/// Version information for the heatmap core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
