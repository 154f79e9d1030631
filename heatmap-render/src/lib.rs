/*!
# Heatmap Rendering and Interaction

Stateful engine around the `heatmap-core` pipeline:

1. **Engine**: owns data and options and re-enters the pipeline at the
   stage each update affects
2. **Scene**: keyed elements per layer, joined with enter/update/exit
   semantics so a reorder moves elements instead of recreating them
3. **Interaction**: hover, click, pan, zoom, scroll-to-row and the sort,
   pin and remove mutations, with callbacks through [`HeatmapEvents`]
4. **Export**: SVG and PNG captures of the scene with the print caption

Everything runs synchronously on the caller's thread. Delayed effects go
through a [`Scheduler`] that the host drives with [`Heatmap::tick`].
*/

pub mod caption;
pub mod dendrogram;
pub mod draw;
pub mod engine;
pub mod events;
pub mod interaction;
pub mod scene;
pub mod schedule;
pub mod vector_export;

// Re-export commonly used types and functions
pub use caption::{threshold_caption, wrap_caption, ThresholdFilter, CAPTION_LINE_WIDTH};
pub use dendrogram::{layout_dendrogram, DendrogramLayout, DendrogramLink};
pub use engine::{Heatmap, Highlight, ZOOM_STEP};
pub use events::{
    Anchor, AnchorKind, CellStatus, CellTooltip, HeatmapEvents, MetricValue, NoopEvents, RecordedEvent,
    RecordingEvents, RowGroupInfo,
};
pub use interaction::PAN_KEY;
pub use scene::{Element, JoinStats, Layer, Scene, Shape, TextAnchor};
pub use schedule::{Clock, ManualClock, Scheduler, SystemClock, TaskId};
pub use vector_export::{scene_to_png, scene_to_svg, ExportConfig};

/// Version information for the heatmap render library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
