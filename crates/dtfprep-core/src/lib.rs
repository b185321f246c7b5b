//! dtfprep Core Library
//!
//! Platform-agnostic geometry for print preparation: alignment guides,
//! physical units, rulers and the print document model.

pub mod document;
pub mod ruler;
pub mod snap;
pub mod units;

pub use document::{CanvasObject, Document, DocumentError, DocumentResult, DocumentSettings, ObjectId, PRESETS, Preset};
pub use ruler::{MAX_RULER_CM, RulerTick, TickKind, ruler_ticks};
pub use snap::{
    Axis, DEFAULT_SNAP_TOLERANCE, GuideStops, MIN_SPACING_GAP, Rectangle, SnapEdge, SnapEdges, SnapKind, SnapLine,
    SnapMatch, SnapOutcome, SpacingGuide, apply_snap, collect_stops, collect_stops_in_artboard, extract_edges,
    select_guides, snap_matches, snap_to_guides, spacing_guides,
};
